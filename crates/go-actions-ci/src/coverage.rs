//! Coverage extraction from a Go coverage profile.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::runner::CommandRunner;
use crate::stage::StageConfig;

/// Coverage found after a test run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoverageReport {
    pub has_coverage: bool,

    /// Total as printed by `go tool cover`, e.g. `"85.7%"`.
    pub coverage: Option<String>,
}

impl CoverageReport {
    pub fn none() -> Self {
        Self::default()
    }

    fn found(coverage: String) -> Self {
        Self {
            has_coverage: true,
            coverage: Some(coverage),
        }
    }

    /// Value of the `coverage` step output: the total, or `0`.
    pub fn output_value(&self) -> &str {
        self.coverage.as_deref().unwrap_or("0")
    }
}

/// Pick the total from `go tool cover -func` output: the `total:` line,
/// or the last line when there is none, reduced to its last token.
pub fn parse_cover_output(output: &str) -> Option<String> {
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let line = lines
        .iter()
        .find(|l| l.starts_with("total"))
        .or_else(|| lines.last())?;
    line.split_whitespace().last().map(str::to_string)
}

/// Run `go tool cover` on `profile` inside `cwd`.
///
/// Never fails: a missing profile, a failing command or empty output all
/// yield a report without coverage.
pub async fn extract_coverage(
    runner: &dyn CommandRunner,
    cwd: &Path,
    profile: &str,
) -> CoverageReport {
    if !cwd.join(profile).exists() {
        info!(profile = %profile, "no coverage file found");
        return CoverageReport::none();
    }

    let stage = StageConfig::go_cover(profile, cwd);
    let result = match runner.run(&stage).await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "failed to run go tool cover");
            return CoverageReport::none();
        }
    };
    if !result.passed() {
        warn!(exit_code = result.exit_code, "go tool cover failed");
        return CoverageReport::none();
    }

    match parse_cover_output(&result.stdout) {
        Some(total) => {
            info!(coverage = %total, "test coverage");
            CoverageReport::found(total)
        }
        None => {
            debug!("go tool cover produced no output");
            CoverageReport::none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COVER_OUTPUT: &str = "\
example.com/demo/sum.go:3:\tSum\t\t100.0%
example.com/demo/sum.go:9:\tAvg\t\t71.4%
total:\t\t\t\t(statements)\t85.7%
";

    #[test]
    fn test_parse_total_line() {
        assert_eq!(parse_cover_output(COVER_OUTPUT).as_deref(), Some("85.7%"));
    }

    #[test]
    fn test_parse_falls_back_to_last_line() {
        assert_eq!(
            parse_cover_output("pkg/a.go:1:\tA\t50.0%\n  \n").as_deref(),
            Some("50.0%")
        );
    }

    #[test]
    fn test_parse_empty_output() {
        assert_eq!(parse_cover_output(""), None);
        assert_eq!(parse_cover_output("\n \n"), None);
    }

    #[test]
    fn test_output_value_defaults_to_zero() {
        assert_eq!(CoverageReport::none().output_value(), "0");
        assert_eq!(CoverageReport::found("12.5%".to_string()).output_value(), "12.5%");
    }
}
