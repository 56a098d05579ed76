use anyhow::{Context, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;

/// Captured result of a finished command.
#[derive(Debug)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes an external binary with a working directory and a bounded
/// timeout. A command past its deadline is killed and reported as a
/// failure; it can never hang the engine.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Runner for the git binary.
    pub fn git(timeout: Duration) -> Self {
        Self::new("git", timeout)
    }

    /// Run the program in `dir`, capturing stdout and stderr.
    pub async fn run(&self, dir: &Path, args: &[&str]) -> Result<CommandOutput> {
        let child = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {} {}", self.program, args.join(" ")))?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "{} {} timed out after {}s",
                    self.program,
                    args.join(" "),
                    self.timeout.as_secs()
                )
            })?
            .context("failed to collect command output")?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run the program streaming combined stdout/stderr line by line.
    ///
    /// Lines are split on bare CR as well as LF so `\r`-overwritten
    /// progress meters surface incrementally. Spawn failures and
    /// timeouts are reported as a trailing line plus a non-zero code.
    pub async fn run_streaming(
        &self,
        dir: &Path,
        args: &[&str],
        lines: mpsc::Sender<String>,
    ) -> i32 {
        let mut child = match Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                let _ = lines.send(format!("failed to start {}: {err}", self.program)).await;
                return 1;
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_task = tokio::spawn(forward_lines(stdout, lines.clone()));
        let err_task = tokio::spawn(forward_lines(stderr, lines.clone()));

        let mut trailing = None;
        let exit_code = match timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status.code().unwrap_or(-1),
            Ok(Err(err)) => {
                trailing = Some(format!("failed to wait for {}: {err}", self.program));
                1
            }
            Err(_) => {
                debug!(
                    "{} {} exceeded {}s, killing",
                    self.program,
                    args.join(" "),
                    self.timeout.as_secs()
                );
                let _ = child.kill().await;
                trailing = Some(format!("timed out after {}s", self.timeout.as_secs()));
                1
            }
        };

        // Drain both pipes fully before any trailing line so output
        // order is preserved for the consumer.
        let _ = out_task.await;
        let _ = err_task.await;
        if let Some(line) = trailing {
            let _ = lines.send(line).await;
        }

        exit_code
    }
}

/// Forward a byte stream as text lines, treating bare CR and LF both
/// as terminators. Blank lines are dropped.
async fn forward_lines<R>(reader: Option<R>, lines: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return;
    };
    let mut buf = [0u8; 4096];
    let mut pending = Vec::new();
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => break,
        };
        for &byte in &buf[..n] {
            if byte == b'\n' || byte == b'\r' {
                flush_line(&mut pending, &lines).await;
            } else {
                pending.push(byte);
            }
        }
    }
    flush_line(&mut pending, &lines).await;
}

async fn flush_line(pending: &mut Vec<u8>, lines: &mpsc::Sender<String>) {
    if pending.is_empty() {
        return;
    }
    let line = String::from_utf8_lossy(pending).trim().to_string();
    pending.clear();
    if !line.is_empty() {
        let _ = lines.send(line).await;
    }
}
