//! External executable hooks.
//!
//! The context is written to the process's stdin as JSON. Anything printed
//! to stdout must be a JSON object (merged into the stage data), `null`, or
//! nothing at all.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::{HookContext, HookData, StageHook};
use crate::types::{Result, ReviveError};

pub struct CommandHook {
    path: PathBuf,
    timeout: Duration,
}

impl CommandHook {
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Script interpreter inferred from the file extension; extensionless
    /// files are executed directly.
    fn command(&self) -> Command {
        let interpreter = match self.path.extension().and_then(|e| e.to_str()) {
            Some("sh") => Some("sh"),
            Some("py") => Some("python3"),
            Some("js") => Some("node"),
            _ => None,
        };
        match interpreter {
            Some(program) => {
                let mut cmd = Command::new(program);
                cmd.arg(&self.path);
                cmd
            }
            None => Command::new(&self.path),
        }
    }

    async fn exchange(&self, ctx: &HookContext) -> Result<Option<HookData>> {
        let stage = ctx.stage.as_str();
        let payload = serde_json::to_vec(ctx)?;

        let mut cmd = self.command();
        cmd.current_dir(&ctx.repo_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            ReviveError::hook(stage, format!("failed to start {}: {}", self.path.display(), e))
        })?;

        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(&payload).await
            && e.kind() != ErrorKind::BrokenPipe
        {
            return Err(e.into());
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReviveError::hook(
                stage,
                format!("exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return Ok(None);
        }

        match serde_json::from_str::<Value>(stdout)? {
            Value::Object(map) => Ok(Some(map)),
            Value::Null => Ok(None),
            other => Err(ReviveError::hook(
                stage,
                format!("expected a JSON object on stdout, got {}", other),
            )),
        }
    }
}

#[async_trait]
impl StageHook for CommandHook {
    async fn call(&self, ctx: &HookContext) -> Result<Option<HookData>> {
        debug!(stage = %ctx.stage, path = %self.path.display(), "Running hook command");
        timeout(self.timeout, self.exchange(ctx))
            .await
            .map_err(|_| ReviveError::timeout(format!("hook {}", ctx.stage), self.timeout))?
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
