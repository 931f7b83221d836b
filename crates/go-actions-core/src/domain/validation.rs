//! Validation records produced while checking a consumer repository.
//!
//! Every check appends [`ValidationError`] records to a flat, ordered list;
//! nothing is thrown. A [`ValidationResult`] is built once at the end of a
//! pass and derives `is_valid` from the severities it holds.

use serde::{Deserialize, Serialize};

/// Category of a validation problem.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    MissingFile,
    InvalidJson,
    FormatError,
    FilenameError,
    VersionMismatch,
    IncompatibleVersions,
    GoreleaserConfig,
    ReleasePleaseConfig,
}

impl ValidationErrorKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorKind::MissingFile => "missing_file",
            ValidationErrorKind::InvalidJson => "invalid_json",
            ValidationErrorKind::FormatError => "format_error",
            ValidationErrorKind::FilenameError => "filename_error",
            ValidationErrorKind::VersionMismatch => "version_mismatch",
            ValidationErrorKind::IncompatibleVersions => "incompatible_versions",
            ValidationErrorKind::GoreleaserConfig => "goreleaser_config",
            ValidationErrorKind::ReleasePleaseConfig => "release_please_config",
        }
    }
}

/// Severity of a validation problem. Only `Error` makes a result invalid.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

/// A single problem found during validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    #[serde(rename = "type")]
    pub kind: ValidationErrorKind,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,

    #[serde(default)]
    pub severity: Severity,
}

impl ValidationError {
    /// Create an error-severity record.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file: None,
            expected: None,
            actual: None,
            severity: Severity::Error,
        }
    }

    /// Shorthand for a `missing_file` error on `file`.
    pub fn missing_file(file: &str, message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::MissingFile, message).with_file(file)
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_versions(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }

    /// Downgrade to a warning.
    pub fn warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Outcome of one validation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,

    /// Action names in first-seen order, without duplicates.
    pub actions_found: Vec<String>,

    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// The trivially valid result: no actions, no errors.
    pub fn empty() -> Self {
        Self {
            is_valid: true,
            actions_found: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Build a result, deriving `is_valid` from the error severities.
    pub fn from_parts(actions_found: Vec<String>, errors: Vec<ValidationError>) -> Self {
        let is_valid = !errors.iter().any(ValidationError::is_error);
        Self {
            is_valid,
            actions_found,
            errors,
        }
    }

    /// Number of error-severity records.
    pub fn error_count(&self) -> usize {
        self.errors.iter().filter(|e| e.is_error()).count()
    }

    /// Number of warning-severity records.
    pub fn warning_count(&self) -> usize {
        self.errors.len() - self.error_count()
    }

    /// Records of a given kind, in order.
    pub fn of_kind(&self, kind: ValidationErrorKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_keep_result_valid() {
        let errors = vec![ValidationError::new(
            ValidationErrorKind::GoreleaserConfig,
            "zip archives for linux",
        )
        .warning()];
        let result = ValidationResult::from_parts(vec!["release".to_string()], errors);
        assert!(result.is_valid);
        assert_eq!(result.warning_count(), 1);
        assert_eq!(result.error_count(), 0);
    }

    #[test]
    fn test_any_error_invalidates_result() {
        let errors = vec![
            ValidationError::new(ValidationErrorKind::FormatError, "legacy").warning(),
            ValidationError::missing_file("go.mod", "go.mod (required for CI actions)"),
        ];
        let result = ValidationResult::from_parts(vec![], errors);
        assert!(!result.is_valid);
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn test_serialized_shape() {
        let err = ValidationError::new(ValidationErrorKind::IncompatibleVersions, "too old")
            .with_versions("v2.x.x", "v1.62.2");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "incompatible_versions");
        assert_eq!(json["expected"], "v2.x.x");
        assert_eq!(json["actual"], "v1.62.2");
        assert_eq!(json["severity"], "error");
        assert!(json.get("file").is_none());

        let result = ValidationResult::from_parts(vec!["ci".to_string()], vec![err]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isValid"], false);
        assert_eq!(json["actionsFound"][0], "ci");
    }

    #[test]
    fn test_missing_severity_defaults_to_error() {
        let err: ValidationError = serde_json::from_str(
            r#"{"type":"missing_file","message":"go.mod (required for CI actions)","file":"go.mod"}"#,
        )
        .unwrap();
        assert_eq!(err.severity, Severity::Error);
        assert_eq!(err.kind.as_str(), "missing_file");
    }
}
