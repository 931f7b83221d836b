//! Workflow validation: checks a consumer repository's workflows against the
//! files and tool versions the go-actions actions need.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::domain::{Result, ValidationError, ValidationErrorKind, ValidationResult};
use crate::goreleaser::check_goreleaser;
use crate::inspector::{FileInspector, GOLANGCI_CONFIGS, GO_MOD};
use crate::obs;
use crate::release_please::ReleasePleaseValidator;
use crate::version::{
    check_incompatibility, compatible, major_version, resolve_lint_version, LintWrapper,
};
use crate::workflow::{WorkflowFile, WorkflowScanner, DEFAULT_PROVIDER};

/// Provider actions, in the order they are checked within a file.
pub const ACTION_CI: &str = "ci";
pub const ACTION_RELEASE: &str = "release";
pub const ACTION_SELF_VALIDATE: &str = "self-validate";

/// Workflow input carrying the golangci-lint version for the ci action.
pub const LINT_VERSION_INPUT: &str = "golangci-lint-version";

fn config_version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^version:\s*(.+)$").expect("static regex"))
}

/// Validates every workflow under a working directory.
///
/// Stateless: each call re-reads the filesystem, so repeated calls on an
/// unchanged tree return equal results.
#[derive(Debug, Clone)]
pub struct WorkflowValidator {
    inspector: FileInspector,
    scanner: WorkflowScanner,
    provider: String,
}

impl WorkflowValidator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            inspector: FileInspector::new(root.clone()),
            scanner: WorkflowScanner::new(root),
            provider: DEFAULT_PROVIDER.to_string(),
        }
    }

    /// Override the workflow search patterns.
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scanner = self.scanner.with_patterns(patterns);
        self
    }

    /// Override the `owner/repo` that publishes the actions.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Run one validation pass.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures (bad glob, unreadable workflow) are
    /// errors; configuration problems are returned inside the result.
    pub fn validate(&self) -> Result<ValidationResult> {
        if self.inspector.is_provider_repo() {
            debug!(
                root = %self.inspector.root().display(),
                "provider repository, skipping validation"
            );
            return Ok(ValidationResult::empty());
        }

        let workflows = self.scanner.scan()?;
        if workflows.is_empty() {
            debug!(patterns = ?self.scanner.patterns(), "no workflow files found");
            return Ok(ValidationResult::empty());
        }

        let mut actions_found: Vec<String> = Vec::new();
        let mut errors = Vec::new();

        for workflow in &workflows {
            let file = self.relative_name(&workflow.path);
            debug!(workflow = %file, structured = workflow.is_structured(), "validating workflow");

            if let Some(usage) = workflow.find_action(&self.provider, ACTION_CI) {
                record(&mut actions_found, ACTION_CI);
                self.check_ci(usage.input(LINT_VERSION_INPUT), &file, &mut errors);
            }

            self.check_lint_action(workflow, &file, &mut errors);

            if workflow.find_action(&self.provider, ACTION_RELEASE).is_some() {
                record(&mut actions_found, ACTION_RELEASE);
                errors.extend(ReleasePleaseValidator::new(&self.inspector).validate()?);
                errors.extend(check_goreleaser(&self.inspector)?);
            }

            if workflow.find_action(&self.provider, ACTION_SELF_VALIDATE).is_some() {
                record(&mut actions_found, ACTION_SELF_VALIDATE);
            }
        }

        let result = ValidationResult::from_parts(actions_found, errors);
        obs::emit_validation_completed(&result);
        Ok(result)
    }

    fn check_ci(&self, requested: Option<&str>, workflow: &str, errors: &mut Vec<ValidationError>) {
        if !self.inspector.exists(GO_MOD) {
            errors.push(ValidationError::missing_file(
                GO_MOD,
                "go.mod (required for CI actions)",
            ));
        }

        let expected = resolve_lint_version(requested);
        if let Some(err) = check_incompatibility(LintWrapper::GoActionsCi, None, expected) {
            errors.push(err.with_file(workflow));
        }

        let Some(config_file) = self.inspector.first_existing(GOLANGCI_CONFIGS) else {
            return;
        };
        let Some(config_version) = self.golangci_config_version(config_file) else {
            return;
        };

        let expected_major = major_version(expected);
        let actual_major = major_version(&config_version);
        if !compatible(expected_major, actual_major) {
            errors.push(
                ValidationError::new(
                    ValidationErrorKind::VersionMismatch,
                    format!(
                        "{config_file} has version {config_version} but workflow expects version v{expected_major}"
                    ),
                )
                .with_file(config_file)
                .with_versions(format!("v{expected_major}"), config_version),
            );
        }
    }

    fn check_lint_action(
        &self,
        workflow: &WorkflowFile,
        file: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        for usage in workflow.lint_action_usages() {
            let Some(version) = usage.version.as_deref() else {
                continue;
            };
            if let Some(err) =
                check_incompatibility(LintWrapper::GolangciLintAction, usage.action_major, version)
            {
                errors.push(err.with_file(file));
            }
        }
    }

    /// Top-level `version` of a golangci-lint config, if declared.
    fn golangci_config_version(&self, config_file: &str) -> Option<String> {
        let content = self.inspector.read_text(config_file).ok()?;
        match serde_yaml::from_str::<serde_yaml::Value>(&content) {
            Ok(doc) => match doc.get("version")? {
                serde_yaml::Value::String(s) => Some(s.trim().to_string()),
                serde_yaml::Value::Number(n) => Some(n.to_string()),
                _ => None,
            },
            Err(_) => config_version_regex()
                .captures(&content)
                .map(|c| c[1].trim().trim_matches(['"', '\'']).to_string()),
        }
    }

    fn relative_name(&self, path: &Path) -> String {
        path.strip_prefix(self.inspector.root())
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

fn record(actions: &mut Vec<String>, action: &str) {
    if !actions.iter().any(|a| a == action) {
        actions.push(action.to_string());
    }
}
