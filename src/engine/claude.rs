//! Subprocess adapter for the agent engine CLI.
//!
//! Spawns one engine process per turn and bridges its stdout JSONL to the
//! engine event stream over a channel. The child is killed if the stream is
//! dropped before it exits; stderr is captured for diagnostics when the
//! process dies without a terminal result.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::config::{CREDENTIAL_ENV_VAR, EngineConfig};

use super::{AgentEngine, EngineError, EngineStream, TurnOptions, wire};

/// How much stderr to keep for diagnostics.
const STDERR_TAIL_BYTES: usize = 4096;

/// Agent engine backed by the `claude` CLI (or a compatible replacement).
pub struct ClaudeEngine {
    command: String,
    args: Vec<String>,
    model: Option<String>,
    credential: Option<String>,
}

impl ClaudeEngine {
    /// Build an engine from configuration plus the startup-resolved credential.
    #[must_use]
    pub fn new(config: &EngineConfig, credential: Option<String>) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            model: config.model.clone(),
            credential,
        }
    }
}

#[async_trait]
impl AgentEngine for ClaudeEngine {
    async fn start_turn(
        &self,
        prompt: &str,
        options: TurnOptions,
    ) -> Result<EngineStream, EngineError> {
        let mut cmd = Command::new(&self.command);
        cmd.arg("-p")
            .arg(prompt)
            .arg("--output-format")
            .arg("stream-json")
            .arg("--verbose");
        if let Some(model) = &self.model {
            cmd.arg("--model").arg(model);
        }
        if let Some(resume) = &options.resume {
            cmd.arg("--resume").arg(resume);
        }
        cmd.args(&self.args);
        if let Some(credential) = &self.credential {
            cmd.env(CREDENTIAL_ENV_VAR, credential);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(EngineError::spawn)?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::stream("engine stdout was not piped"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::stream("engine stderr was not piped"))?;

        debug!(
            command = %self.command,
            resume = options.resume.as_deref().unwrap_or("-"),
            "Spawned agent engine process"
        );

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(bridge(child, stdout, stderr, tx));

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Read engine stdout lines, decode them, and forward events to the channel.
///
/// If the process ends without having produced a terminal event, a single
/// `EngineError` carrying the exit status and a stderr tail is sent instead.
async fn bridge(
    mut child: Child,
    stdout: impl AsyncRead + Unpin,
    stderr: impl AsyncRead + Unpin + Send + 'static,
    tx: mpsc::Sender<Result<super::EngineEvent, EngineError>>,
) {
    let stderr_task = tokio::spawn(collect_stderr_tail(stderr));

    let mut lines = BufReader::new(stdout).lines();
    let mut saw_terminal = false;

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(event) = wire::decode_line(&line) else {
                    continue;
                };
                if event.is_terminal() {
                    saw_terminal = true;
                }
                if tx.send(Ok(event)).await.is_err() {
                    // Receiver gone; kill_on_drop reaps the child.
                    return;
                }
            }
            Ok(None) => break,
            Err(e) => {
                let _ = tx.send(Err(EngineError::read(e))).await;
                return;
            }
        }
    }

    let status = child.wait().await;
    let stderr_tail = stderr_task.await.unwrap_or_default();

    if saw_terminal {
        return;
    }

    // The stream closed with no result event: surface the process failure.
    let error = match status {
        Ok(status) if status.success() && stderr_tail.is_empty() => EngineError::Interrupted,
        Ok(status) => EngineError::exited(status.code(), stderr_tail),
        Err(e) => EngineError::read(e),
    };
    warn!(error = %error, "Agent engine ended without a terminal result");
    let _ = tx.send(Err(error)).await;
}

async fn collect_stderr_tail(stderr: impl AsyncRead + Unpin) -> String {
    let mut lines = BufReader::new(stderr).lines();
    let mut tail = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        tail.push_str(&line);
        tail.push('\n');
        if tail.len() > STDERR_TAIL_BYTES {
            let cut = tail.len() - STDERR_TAIL_BYTES;
            tail.drain(..cut);
        }
    }
    tail.trim().to_string()
}

// ============================================================================
// Tests
// ============================================================================
