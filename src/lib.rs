//! Colloquy - a self-hosted relay that streams multi-turn conversations to a
//! generative agent engine while owning the durable conversation history.

pub mod build_info;
pub mod config;
pub mod engine;
pub mod handlers;
pub mod server;
pub mod session;
pub mod store;
