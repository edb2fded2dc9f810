use axum::Json;
use axum::http::StatusCode;

use crate::build_info::BuildInfo;

pub async fn livez() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

pub async fn readyz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

pub async fn version() -> Json<BuildInfo> {
    Json(BuildInfo::new())
}
