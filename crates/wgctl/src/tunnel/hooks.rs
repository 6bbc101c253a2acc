//! Post-up and pre-down commands.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::netlink::error::{Error, Result};

/// Runs one hook command.
#[allow(async_fn_in_trait)]
pub trait HookRunner {
    /// Run `command`, failing with [`Error::HookFailed`] on a non-zero exit.
    async fn run(&self, command: &str) -> Result<()>;
}

/// [`HookRunner`] that executes commands directly, without a shell.
///
/// The command line is split on whitespace; quoting is not interpreted.
/// The child inherits the environment, its stdout is discarded and its
/// stderr is captured for the error.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandHookRunner;

impl HookRunner for CommandHookRunner {
    async fn run(&self, command: &str) -> Result<()> {
        let mut words = command.split_whitespace();
        let Some(program) = words.next() else {
            return Ok(());
        };

        debug!(command, "running hook");
        let output = Command::new(program)
            .args(words)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if output.status.success() {
            return Ok(());
        }

        Err(Error::HookFailed {
            command: command.to_string(),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success() {
        CommandHookRunner.run("true").await.unwrap();
        CommandHookRunner.run("   ").await.unwrap();
    }

    #[tokio::test]
    async fn test_failure_captures_stderr() {
        let err = CommandHookRunner
            .run("ls /nonexistent-wgctl-hook-dir")
            .await
            .unwrap_err();
        match err {
            Error::HookFailed {
                command,
                exit_code,
                stderr,
            } => {
                assert_eq!(command, "ls /nonexistent-wgctl-hook-dir");
                assert_ne!(exit_code, Some(0));
                assert!(stderr.contains("nonexistent-wgctl-hook-dir"), "{}", stderr);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        assert!(matches!(
            CommandHookRunner.run("/nonexistent/hook").await,
            Err(Error::Io(_))
        ));
    }
}
