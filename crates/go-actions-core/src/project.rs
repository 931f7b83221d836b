//! Project and release readiness checks.
//!
//! Lighter than the workflow validator: these look only at what is on disk
//! and say whether the repository is ready for the ci and release actions.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::{CoreError, Result, ValidationError, ValidationErrorKind, ValidationResult};
use crate::inspector::{
    FileInspector, GOLANGCI_CONFIGS, GORELEASER_CONFIGS, GO_MOD, RELEASE_PLEASE_CONFIG,
    RELEASE_PLEASE_MANIFEST,
};
use crate::release_please::{CONFIG_TEMPLATE, MANIFEST_TEMPLATE};

const VENDOR_DIR: &str = "vendor";

/// Structure checks for a Go project.
#[derive(Debug, Clone)]
pub struct ProjectValidator {
    inspector: FileInspector,
}

impl ProjectValidator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inspector: FileInspector::new(root),
        }
    }

    /// Missing `go.mod` or Go sources are errors; everything else the
    /// actions can live without is a warning.
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();

        if !self.inspector.exists(GO_MOD) {
            errors.push(ValidationError::missing_file(GO_MOD, "Missing go.mod file"));
        }

        let sources = self.go_files("*.go")?;
        if sources.is_empty() {
            errors.push(ValidationError::missing_file("*.go", "No Go source files found"));
        }

        let tests = self.go_files("*_test.go")?;
        if tests.is_empty() {
            errors.push(
                ValidationError::missing_file(
                    "*_test.go",
                    "No test files found (recommended for test job)",
                )
                .warning(),
            );
        }
        if !has_benchmarks(&tests) {
            errors.push(
                ValidationError::missing_file(
                    "*_test.go",
                    "No benchmark functions found (required for benchmark job)",
                )
                .warning(),
            );
        }

        for file in [RELEASE_PLEASE_CONFIG, RELEASE_PLEASE_MANIFEST] {
            if !self.inspector.exists(file) {
                errors.push(
                    ValidationError::missing_file(file, format!("Missing {file} (required for release job)"))
                        .warning(),
                );
            }
        }

        if self.inspector.first_existing(GORELEASER_CONFIGS).is_none() {
            errors.push(
                ValidationError::missing_file(
                    GORELEASER_CONFIGS[0],
                    "Missing .goreleaser.yaml or .goreleaser.yml (required for release job). Run 'goreleaser init' to create one",
                )
                .warning(),
            );
        }

        if self.inspector.first_existing(GOLANGCI_CONFIGS).is_none() {
            errors.push(
                ValidationError::missing_file(
                    GOLANGCI_CONFIGS[0],
                    "No .golangci.yml or .golangci.yaml found; golangci-lint will use its default configuration",
                )
                .warning(),
            );
        }

        let result = ValidationResult::from_parts(Vec::new(), errors);
        info!(
            is_valid = result.is_valid,
            errors = result.error_count(),
            warnings = result.warning_count(),
            "project validation finished"
        );
        Ok(result)
    }

    /// Files matching `name_pattern` anywhere below the root, vendor excluded.
    fn go_files(&self, name_pattern: &str) -> Result<Vec<PathBuf>> {
        let root = glob::Pattern::escape(&self.inspector.root().to_string_lossy());
        let pattern = format!("{}/**/{name_pattern}", root.trim_end_matches('/'));
        let entries = glob::glob(&pattern).map_err(|e| CoreError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.msg.to_string(),
        })?;

        let files: Vec<PathBuf> = entries
            .flatten()
            .filter(|p| p.is_file() && !self.is_vendored(p))
            .collect();
        debug!(pattern = %name_pattern, count = files.len(), "go files found");
        Ok(files)
    }

    fn is_vendored(&self, path: &Path) -> bool {
        path.strip_prefix(self.inspector.root())
            .unwrap_or(path)
            .components()
            .any(|c| c.as_os_str() == VENDOR_DIR)
    }
}

fn has_benchmarks(test_files: &[PathBuf]) -> bool {
    test_files.iter().any(|path| {
        std::fs::read_to_string(path).is_ok_and(|content| content.contains("func Benchmark"))
    })
}

/// Pre-flight checks for the release action.
#[derive(Debug, Clone)]
pub struct ReleaseValidator {
    inspector: FileInspector,
}

impl ReleaseValidator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inspector: FileInspector::new(root),
        }
    }

    /// One `missing_file` error per absent release-please file.
    pub fn validate(&self) -> ValidationResult {
        let errors = self
            .missing_files()
            .into_iter()
            .map(|file| ValidationError::missing_file(file, format!("{file} (required for release action)")))
            .collect();
        ValidationResult::from_parts(vec!["release".to_string()], errors)
    }

    pub fn missing_files(&self) -> Vec<&'static str> {
        [RELEASE_PLEASE_CONFIG, RELEASE_PLEASE_MANIFEST]
            .into_iter()
            .filter(|f| !self.inspector.exists(f))
            .collect()
    }
}

/// The release action cannot open release PRs without a token.
pub fn require_release_token(token: Option<&str>) -> Result<&str> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CoreError::MissingInput("release-token".to_string()))
}

/// Instructions printed when release-please files are missing.
pub fn render_release_instructions(result: &ValidationResult) -> String {
    let missing: Vec<&str> = result
        .of_kind(ValidationErrorKind::MissingFile)
        .filter_map(|e| e.file.as_deref())
        .collect();
    if missing.is_empty() {
        return String::new();
    }

    let mut out = format!(
        "Missing required Release Please configuration files: {}\n",
        missing.join(", ")
    );
    if missing.contains(&RELEASE_PLEASE_CONFIG) {
        out.push_str(&format!("\nCreate {RELEASE_PLEASE_CONFIG}:\n{CONFIG_TEMPLATE}\n"));
    }
    if missing.contains(&RELEASE_PLEASE_MANIFEST) {
        out.push_str(&format!("\nCreate {RELEASE_PLEASE_MANIFEST}:\n{MANIFEST_TEMPLATE}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_empty_project_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProjectValidator::new(dir.path()).validate().unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.error_count(), 2);
        assert_eq!(result.errors[0].file.as_deref(), Some("go.mod"));
    }

    #[test]
    fn test_complete_project_passes_without_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "go.mod", "module example.com/demo\n");
        write(root, "main.go", "package main\n");
        write(root, "pkg/sum_test.go", "package pkg\nfunc BenchmarkSum(b *testing.B) {}\n");
        write(root, RELEASE_PLEASE_CONFIG, CONFIG_TEMPLATE);
        write(root, RELEASE_PLEASE_MANIFEST, MANIFEST_TEMPLATE);
        write(root, ".goreleaser.yaml", "builds: []\n");
        write(root, ".golangci.yml", "version: \"2\"\n");

        let result = ProjectValidator::new(root).validate().unwrap();
        assert!(result.is_valid);
        assert!(result.errors.is_empty(), "unexpected: {:?}", result.errors);
    }

    #[test]
    fn test_vendored_sources_do_not_count() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "go.mod", "module example.com/demo\n");
        write(root, "vendor/github.com/x/y/y.go", "package y\n");

        let result = ProjectValidator::new(root).validate().unwrap();
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.message == "No Go source files found"));
        assert!(result
            .errors
            .iter()
            .filter(|e| e.severity == Severity::Warning)
            .any(|e| e.message.contains("benchmark")));
    }

    #[test]
    fn test_release_validator_lists_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), RELEASE_PLEASE_MANIFEST, MANIFEST_TEMPLATE);

        let validator = ReleaseValidator::new(dir.path());
        assert_eq!(validator.missing_files(), vec![RELEASE_PLEASE_CONFIG]);

        let result = validator.validate();
        assert!(!result.is_valid);
        let text = render_release_instructions(&result);
        assert!(text.contains("release-please-config.json"));
        assert!(text.contains("\"release-type\": \"go\""));
        assert!(!text.contains("Create .release-please-manifest.json"));
    }

    #[test]
    fn test_release_token_required() {
        assert!(require_release_token(None).is_err());
        assert!(require_release_token(Some("  ")).is_err());
        assert_eq!(require_release_token(Some("ghp_x")).unwrap(), "ghp_x");
    }
}
