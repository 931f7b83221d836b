//! golangci-lint version handling.
//!
//! Major-version comparison between a workflow and its `.golangci.yml`, the
//! fixed `v2`/`latest` normalization policy, and a literal table of wrapper
//! and tool combinations known not to work together.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::domain::{ValidationError, ValidationErrorKind};

/// Version installed when a workflow asks for `v2`, `latest` or nothing.
pub const DEFAULT_GOLANGCI_LINT_VERSION: &str = "v2.1.0";

/// Placeholder reported as `expected` by incompatibility errors.
pub const REQUIRED_LINT_RANGE: &str = "v2.x.x";

fn major_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^v?(\d+)").expect("static regex"))
}

/// Leading major digits of `v2`, `v1.54.2`, `2`, `1.54.2`.
///
/// Returns `""` when the string has no leading version digits.
pub fn major_version(version: &str) -> &str {
    major_regex()
        .captures(version.trim())
        .and_then(|c| c.get(1))
        .map_or("", |m| m.as_str())
}

/// Majors are compatible when equal, or when either side is unknown.
pub fn compatible(expected_major: &str, actual_major: &str) -> bool {
    expected_major.is_empty() || actual_major.is_empty() || expected_major == actual_major
}

/// Map the `v2` and `latest` sentinels to the pinned default.
pub fn normalize_lint_version(version: &str) -> &str {
    match version {
        "v2" | "latest" => DEFAULT_GOLANGCI_LINT_VERSION,
        other => other,
    }
}

/// Resolve an optional workflow input to the version that will be installed.
pub fn resolve_lint_version(requested: Option<&str>) -> &str {
    match requested.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => normalize_lint_version(v),
        None => DEFAULT_GOLANGCI_LINT_VERSION,
    }
}

/// The thing that invokes golangci-lint on the user's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LintWrapper {
    /// `jrschumacher/go-actions/ci`, which runs golangci-lint-action@v8.
    GoActionsCi,
    /// `golangci/golangci-lint-action` used directly.
    GolangciLintAction,
}

/// One known-bad pairing of a wrapper major range and a tool major.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct KnownIncompatibility {
    pub wrapper: LintWrapper,

    /// Inclusive wrapper major range; `None` bounds are open.
    pub wrapper_major_min: Option<u32>,
    pub wrapper_major_max: Option<u32>,

    /// golangci-lint major that the wrapper cannot run.
    pub tool_major: &'static str,

    /// Message template; `{version}` and `{wrapper_major}` are substituted.
    pub message: &'static str,
}

impl KnownIncompatibility {
    fn covers(&self, wrapper: LintWrapper, wrapper_major: Option<u32>) -> bool {
        if self.wrapper != wrapper {
            return false;
        }
        match wrapper_major {
            Some(major) => {
                self.wrapper_major_min.map_or(true, |min| major >= min)
                    && self.wrapper_major_max.map_or(true, |max| major <= max)
            }
            None => self.wrapper_major_min.is_none() && self.wrapper_major_max.is_none(),
        }
    }

    fn render(&self, version: &str, wrapper_major: Option<u32>) -> String {
        let major = wrapper_major.map(|m| m.to_string()).unwrap_or_default();
        self.message
            .replace("{version}", version)
            .replace("{wrapper_major}", &major)
    }
}

/// Point-in-time facts about golangci-lint and golangci-lint-action releases.
/// Keep this current as new majors ship.
pub const KNOWN_INCOMPATIBILITIES: &[KnownIncompatibility] = &[
    KnownIncompatibility {
        wrapper: LintWrapper::GoActionsCi,
        wrapper_major_min: None,
        wrapper_major_max: None,
        tool_major: "1",
        message: "go-actions/ci uses golangci-lint-action@v8 internally, which doesn't support \
                  golangci-lint {version}. Use golangci-lint-version: v2.1.0 or later",
    },
    KnownIncompatibility {
        wrapper: LintWrapper::GolangciLintAction,
        wrapper_major_min: Some(7),
        wrapper_major_max: Some(7),
        tool_major: "1",
        message: "golangci-lint-action@v{wrapper_major} doesn't support golangci-lint {version}. \
                  Use golangci-lint v2+ or downgrade to golangci-lint-action@v6",
    },
    KnownIncompatibility {
        wrapper: LintWrapper::GolangciLintAction,
        wrapper_major_min: Some(8),
        wrapper_major_max: None,
        tool_major: "1",
        message: "golangci-lint-action@v{wrapper_major} requires golangci-lint v2+. Found: {version}",
    },
];

/// Check `tool_version` against the incompatibility table.
///
/// Returns at most one `incompatible_versions` error; versions whose major
/// cannot be parsed never match a rule.
pub fn check_incompatibility(
    wrapper: LintWrapper,
    wrapper_major: Option<u32>,
    tool_version: &str,
) -> Option<ValidationError> {
    let tool_major = major_version(tool_version);
    if tool_major.is_empty() {
        return None;
    }

    KNOWN_INCOMPATIBILITIES
        .iter()
        .find(|rule| rule.covers(wrapper, wrapper_major) && rule.tool_major == tool_major)
        .map(|rule| {
            ValidationError::new(
                ValidationErrorKind::IncompatibleVersions,
                rule.render(tool_version, wrapper_major),
            )
            .with_versions(REQUIRED_LINT_RANGE, tool_version)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_version() {
        assert_eq!(major_version("v2.1.0"), "2");
        assert_eq!(major_version("v2"), "2");
        assert_eq!(major_version("1.54.2"), "1");
        assert_eq!(major_version("2"), "2");
        assert_eq!(major_version("latest"), "");
        assert_eq!(major_version("not-a-version"), "");
        assert_eq!(major_version(""), "");
    }

    #[test]
    fn test_compatible_skips_unknown_majors() {
        assert!(compatible("2", "2"));
        assert!(!compatible("2", "1"));
        assert!(compatible("", "1"));
        assert!(compatible("2", ""));
    }

    #[test]
    fn test_normalize_lint_version() {
        assert_eq!(normalize_lint_version("v2"), DEFAULT_GOLANGCI_LINT_VERSION);
        assert_eq!(normalize_lint_version("latest"), DEFAULT_GOLANGCI_LINT_VERSION);
        assert_eq!(normalize_lint_version("v2.3.0"), "v2.3.0");
        assert_eq!(normalize_lint_version("v1.62.2"), "v1.62.2");
        assert_eq!(resolve_lint_version(None), DEFAULT_GOLANGCI_LINT_VERSION);
        assert_eq!(resolve_lint_version(Some("  ")), DEFAULT_GOLANGCI_LINT_VERSION);
    }

    #[test]
    fn test_ci_wrapper_rejects_v1() {
        let err = check_incompatibility(LintWrapper::GoActionsCi, None, "v1.62.2")
            .expect("v1 should be incompatible");
        assert_eq!(err.kind, ValidationErrorKind::IncompatibleVersions);
        assert_eq!(err.expected.as_deref(), Some("v2.x.x"));
        assert_eq!(err.actual.as_deref(), Some("v1.62.2"));
        assert!(err.message.contains("golangci-lint v1.62.2"));

        assert!(check_incompatibility(LintWrapper::GoActionsCi, None, "1.54.2").is_some());
        assert!(check_incompatibility(LintWrapper::GoActionsCi, None, "v2.1.0").is_none());
        assert!(check_incompatibility(LintWrapper::GoActionsCi, None, "latest").is_none());
    }

    #[test]
    fn test_lint_action_ranges() {
        assert!(check_incompatibility(LintWrapper::GolangciLintAction, Some(6), "v1.60.0").is_none());

        let v7 = check_incompatibility(LintWrapper::GolangciLintAction, Some(7), "v1.60.0").unwrap();
        assert!(v7.message.contains("downgrade to golangci-lint-action@v6"));

        let v8 = check_incompatibility(LintWrapper::GolangciLintAction, Some(8), "v1.60.0").unwrap();
        assert!(v8.message.contains("golangci-lint-action@v8 requires golangci-lint v2+"));

        assert!(check_incompatibility(LintWrapper::GolangciLintAction, Some(9), "v2.0.0").is_none());
    }
}
