use std::ffi::OsStr;
use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::debug;

/// Captured result of one external tool run.
pub(crate) struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// The most useful diagnostic text: stderr when present, otherwise stdout.
    pub fn diagnostics(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }

    /// Fail with the tool's diagnostics unless it exited successfully.
    pub fn ensure_success(self, tool: &str) -> Result<Self> {
        if !self.status.success() {
            bail!("{tool} failed ({}): {}", self.status, last_line(self.diagnostics()));
        }
        Ok(self)
    }
}

/// Run `bin` with `args` to completion, capturing both streams.
///
/// The child is killed if the returned future is dropped, so wrapping this in a timeout
/// cancels the tool run too.
pub(crate) async fn run_tool<I, S>(bin: &str, args: I) -> Result<ToolOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(bin);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(command = ?cmd.as_std(), "running external tool");

    let output = cmd
        .output()
        .await
        .with_context(|| format!("failed to execute {bin}"))?;

    Ok(ToolOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// ffmpeg prints its banner and stream info before the actual error; keep the error.
fn last_line(text: &str) -> &str {
    text.lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or(text)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_line_skips_trailing_blanks() {
        assert_eq!(last_line("banner\nreal error\n\n"), "real error");
        assert_eq!(last_line(""), "");
    }

    #[tokio::test]
    async fn missing_binary_is_an_error() {
        let err = run_tool("definitely-not-a-real-binary-quietcut", ["-version"])
            .await
            .err()
            .expect("spawn should fail");
        assert!(err.to_string().contains("failed to execute"));
    }
}
