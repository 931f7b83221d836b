//! Command execution.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::stage::StageConfig;

/// Result of a stage execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    /// Stage name.
    pub stage_name: String,

    /// Exit code (0 = success, -1 when killed by a signal).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Whether execution succeeded.
    pub success: bool,
}

impl StageResult {
    /// Whether this stage passed (exit code 0).
    pub fn passed(&self) -> bool {
        self.success && self.exit_code == 0
    }

    /// Stdout followed by stderr, skipping empty streams.
    pub fn combined_output(&self) -> String {
        [self.stdout.trim_end(), self.stderr.trim_end()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Short description of a failed run.
    pub fn failure_message(&self) -> String {
        let detail = self
            .stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .map(|l| format!(": {}", l.trim()))
            .unwrap_or_default();
        format!("{} exited with code {}{}", self.stage_name, self.exit_code, detail)
    }
}

/// Runs stage commands.
///
/// Jobs take an `Arc<dyn CommandRunner>` so tests can script outcomes
/// without a Go toolchain.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run one command to completion.
    ///
    /// A non-zero exit is a normal `Ok` result; `Err` means the command
    /// could not be run at all (empty command, spawn failure, timeout).
    async fn run(&self, stage: &StageConfig) -> anyhow::Result<StageResult>;
}

/// Runs commands as child processes with captured output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, config: &StageConfig) -> anyhow::Result<StageResult> {
        let start = Instant::now();

        if config.command.is_empty() {
            anyhow::bail!("Stage {} has empty command", config.name);
        }

        let exe = &config.command[0];
        let args = &config.command[1..];
        debug!(stage = %config.name, command = %config.display_command(), "spawning");

        let mut command = Command::new(exe);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &config.cwd {
            command.current_dir(cwd);
        }

        let child = command
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to spawn {}: {}", exe, e))?;

        let output = if config.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(config.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "Stage {} timed out after {} seconds",
                    config.name,
                    config.timeout_secs
                )
            })??
        } else {
            child.wait_with_output().await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        Ok(StageResult {
            stage_name: config.name.clone(),
            exit_code,
            stdout,
            stderr,
            duration_ms,
            success: output.status.success(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exit_code: i32, stdout: &str, stderr: &str) -> StageResult {
        StageResult {
            stage_name: "go_test".to_string(),
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            duration_ms: 100,
            success: exit_code == 0,
        }
    }

    #[test]
    fn test_stage_result_passed() {
        assert!(result(0, "", "").passed());
        assert!(!result(1, "", "error").passed());
    }

    #[test]
    fn test_combined_output_and_failure_message() {
        let r = result(2, "main.go:3: unused\n", "exit status 1\n\n");
        assert_eq!(r.combined_output(), "main.go:3: unused\nexit status 1");
        assert_eq!(r.failure_message(), "go_test exited with code 2: exit status 1");
        assert_eq!(result(1, "", "").failure_message(), "go_test exited with code 1");
    }

    #[tokio::test]
    async fn test_execute_simple_command() {
        let config = StageConfig::custom(
            "echo_test".to_string(),
            vec!["echo".to_string(), "hello".to_string()],
            60,
        );

        let result = ProcessRunner.run(&config).await.expect("execute failed");
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
        assert!(result.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_execute_failing_command() {
        let config = StageConfig::custom("false_test".to_string(), vec!["false".to_string()], 0);

        let result = ProcessRunner.run(&config).await.expect("execute failed");
        assert!(!result.success);
        assert_ne!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn test_runs_in_configured_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StageConfig::custom("pwd".to_string(), vec!["pwd".to_string()], 0);
        config.cwd = Some(dir.path().to_path_buf());

        let result = ProcessRunner.run(&config).await.expect("execute failed");
        let reported = std::fs::canonicalize(result.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[tokio::test]
    async fn test_empty_command_is_an_error() {
        let config = StageConfig::custom("empty".to_string(), vec![], 0);
        assert!(ProcessRunner.run(&config).await.is_err());
    }
}
