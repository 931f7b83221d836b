//! Command definitions for the Go toolchain steps the jobs run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use go_actions_core::major_version;

/// Default `go test` arguments for the test job.
pub const DEFAULT_TEST_ARGS: &str = "-v -race -coverprofile=coverage.out";

/// Default `go test` arguments for the benchmark job.
pub const DEFAULT_BENCHMARK_ARGS: &str = "-bench=. -benchmem";

/// Default number of benchmark repetitions.
pub const DEFAULT_BENCHMARK_COUNT: u32 = 5;

/// Coverage profile written by the default test arguments.
pub const COVERAGE_FILE: &str = "coverage.out";

/// Module path of golangci-lint 1.x.
pub const GOLANGCI_LINT_MODULE_V1: &str = "github.com/golangci/golangci-lint/cmd/golangci-lint";

/// Module path of golangci-lint 2.x; the `/v2` suffix is required.
pub const GOLANGCI_LINT_MODULE_V2: &str = "github.com/golangci/golangci-lint/v2/cmd/golangci-lint";

/// Steps the CI jobs are built from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GoStage {
    /// go test <args> ./...
    Test,

    /// go tool cover -func=coverage.out
    Cover,

    /// go install <golangci-lint module>@<version>
    InstallLint,

    /// golangci-lint run <args>
    Lint,

    /// go test <bench args> ./...
    Benchmark,
}

impl GoStage {
    pub fn name(&self) -> &'static str {
        match self {
            GoStage::Test => "go_test",
            GoStage::Cover => "go_tool_cover",
            GoStage::InstallLint => "install_golangci_lint",
            GoStage::Lint => "golangci_lint",
            GoStage::Benchmark => "go_bench",
        }
    }
}

/// Split an action input into arguments. Inputs are plain space-separated
/// strings; quoting is not interpreted.
pub fn split_args(args: &str) -> Vec<String> {
    args.split_whitespace().map(str::to_string).collect()
}

/// golangci-lint module path for a version: 1.x keeps the legacy path,
/// everything else uses the `/v2` module.
pub fn golangci_lint_module(version: &str) -> &'static str {
    if major_version(version) == "1" {
        GOLANGCI_LINT_MODULE_V1
    } else {
        GOLANGCI_LINT_MODULE_V2
    }
}

/// Configuration for a single command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageConfig {
    /// Stage name used in logs.
    pub name: String,

    /// Command to execute (first element is executable).
    pub command: Vec<String>,

    /// Directory to run in; the current directory when unset.
    pub cwd: Option<PathBuf>,

    /// Timeout in seconds; `0` disables it.
    pub timeout_secs: u64,
}

impl StageConfig {
    /// Build the command line of a builtin stage.
    fn builtin(stage: GoStage, command: Vec<String>, cwd: &Path) -> Self {
        Self {
            name: stage.name().to_string(),
            command,
            cwd: Some(cwd.to_path_buf()),
            timeout_secs: 0,
        }
    }

    pub fn go_test(args: &str, cwd: &Path) -> Self {
        let mut command = vec!["go".to_string(), "test".to_string()];
        command.extend(split_args(args));
        command.push("./...".to_string());
        Self::builtin(GoStage::Test, command, cwd)
    }

    pub fn go_cover(profile: &str, cwd: &Path) -> Self {
        let command = vec![
            "go".to_string(),
            "tool".to_string(),
            "cover".to_string(),
            format!("-func={profile}"),
        ];
        Self::builtin(GoStage::Cover, command, cwd)
    }

    pub fn install_golangci_lint(version: &str, cwd: &Path) -> Self {
        let command = vec![
            "go".to_string(),
            "install".to_string(),
            format!("{}@{version}", golangci_lint_module(version)),
        ];
        Self::builtin(GoStage::InstallLint, command, cwd)
    }

    pub fn golangci_lint_run(args: &str, cwd: &Path) -> Self {
        let mut command = vec!["golangci-lint".to_string(), "run".to_string()];
        command.extend(split_args(args));
        Self::builtin(GoStage::Lint, command, cwd)
    }

    pub fn go_bench(args: &str, cwd: &Path) -> Self {
        let mut config = Self::go_test(args, cwd);
        config.name = GoStage::Benchmark.name().to_string();
        config
    }

    /// Create a custom stage configuration.
    pub fn custom(name: String, command: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            name,
            command,
            cwd: None,
            timeout_secs,
        }
    }

    /// Command line as a single string, for logs and error messages.
    pub fn display_command(&self) -> String {
        self.command.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_test_command() {
        let config = StageConfig::go_test(DEFAULT_TEST_ARGS, Path::new("svc"));
        assert_eq!(config.name, "go_test");
        assert_eq!(
            config.display_command(),
            "go test -v -race -coverprofile=coverage.out ./..."
        );
        assert_eq!(config.cwd.as_deref(), Some(Path::new("svc")));
        assert_eq!(config.timeout_secs, 0);
    }

    #[test]
    fn test_extra_whitespace_in_args_is_ignored() {
        let config = StageConfig::go_bench("  -bench=.   -benchmem ", Path::new("."));
        assert_eq!(config.name, "go_bench");
        assert_eq!(
            config.command,
            vec!["go", "test", "-bench=.", "-benchmem", "./..."]
        );
    }

    #[test]
    fn test_lint_install_module_by_major() {
        let v2 = StageConfig::install_golangci_lint("v2.1.0", Path::new("."));
        assert_eq!(
            v2.command[2],
            "github.com/golangci/golangci-lint/v2/cmd/golangci-lint@v2.1.0"
        );

        let v1 = StageConfig::install_golangci_lint("v1.62.2", Path::new("."));
        assert_eq!(
            v1.command[2],
            "github.com/golangci/golangci-lint/cmd/golangci-lint@v1.62.2"
        );
    }

    #[test]
    fn test_lint_run_without_args() {
        let config = StageConfig::golangci_lint_run("", Path::new("."));
        assert_eq!(config.command, vec!["golangci-lint", "run"]);
    }

    #[test]
    fn test_cover_command() {
        let config = StageConfig::go_cover(COVERAGE_FILE, Path::new("."));
        assert_eq!(config.display_command(), "go tool cover -func=coverage.out");
    }
}
