//! Shell command execution tool.
//!
//! The shell sends stderr into its stdout pipe before running the command,
//! so both streams arrive as one ordered sequence of lines. A reader task
//! drains that pipe into a channel; the tool loop echoes each line to the
//! terminal as it arrives and keeps a copy for the result, while racing the
//! whole run against a wall-clock deadline.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::{Param, ParamKind, Tool, ToolArgs, ToolError};
use crate::ui;

/// Result returned when a command prints nothing.
pub const EMPTY_OUTPUT: &str = "(empty)";

/// Run a shell command.
pub struct Bash {
    timeout: Duration,
}

impl Bash {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Tool for Bash {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Run shell command"
    }

    fn parameters(&self) -> &[Param] {
        const PARAMS: &[Param] = &[Param::required("cmd", ParamKind::String)];
        PARAMS
    }

    async fn execute(&self, args: &ToolArgs, workspace: &Path) -> Result<String, ToolError> {
        let cmd = args.str("cmd")?;

        tracing::info!("Executing command: {}", cmd);

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(format!("exec 2>&1\n{}", cmd))
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        // Own process group, so a timeout or a dropped turn can take down
        // everything the shell started.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(ToolError::Spawn)?;
        let mut group = ProcessGroupGuard::new(&child);
        let deadline = Instant::now() + self.timeout;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let reader = child
            .stdout
            .take()
            .map(|stdout| tokio::spawn(pump_lines(stdout, tx)));

        let mut lines: Vec<String> = Vec::new();
        let mut timed_out = loop {
            tokio::select! {
                line = rx.recv() => match line {
                    Some(line) => {
                        ui::stream_line(&line);
                        lines.push(line);
                    }
                    None => break false,
                },
                _ = tokio::time::sleep_until(deadline) => break true,
            }
        };

        if !timed_out {
            timed_out = tokio::time::timeout_at(deadline, child.wait()).await.is_err();
        }

        if timed_out {
            tracing::info!("Command timed out after {:?}, killing", self.timeout);
            group.kill();
            if let Err(e) = child.kill().await {
                tracing::warn!("Failed to kill command: {}", e);
            }
            if let Some(reader) = &reader {
                reader.abort();
            }
            while let Ok(line) = rx.try_recv() {
                lines.push(line);
            }
        } else {
            // Background jobs that outlive a finished shell are left alone.
            group.disarm();
        }
        if let Some(reader) = reader {
            let _ = reader.await;
        }

        let mut output = lines.join("\n");
        if timed_out {
            output.push_str(&format!("\n(timed out after {})", format_timeout(self.timeout)));
        }

        let output = output.trim();
        if output.is_empty() {
            Ok(EMPTY_OUTPUT.to_string())
        } else {
            Ok(output.to_string())
        }
    }
}

/// Forward each line of `reader` to `tx` until EOF or a read error.
async fn pump_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']).to_string();
                if tx.send(line).is_err() {
                    break;
                }
            }
        }
    }
}

/// Kills the command's whole process group when dropped, unless disarmed.
///
/// `kill_on_drop` only reaches the shell itself; this also covers whatever
/// the shell spawned when a turn is abandoned mid-command.
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(child: &Child) -> Self {
        Self { pgid: child.id() }
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    // SAFETY: plain syscall on a process group we created; no memory is shared.
    if unsafe { libc::killpg(pgid as libc::pid_t, libc::SIGKILL) } != 0 {
        tracing::debug!(
            "killpg({}) failed: {}",
            pgid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

fn format_timeout(timeout: Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}
