//! release-please configuration checks.
//!
//! release-please v16+ reads `release-please-config.json` (no dot) and
//! `.release-please-manifest.json` (dot). Swapping the dot between the two
//! is a common mistake and is reported as `filename_error` rather than a
//! plain missing file.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::domain::{CoreError, Result, ValidationError, ValidationErrorKind};
use crate::inspector::{FileInspector, RELEASE_PLEASE_CONFIG, RELEASE_PLEASE_MANIFEST};

/// The config name with a stray dot prefix.
pub const MISNAMED_CONFIG: &str = ".release-please-config.json";

/// The manifest name without its dot prefix.
pub const MISNAMED_MANIFEST: &str = "release-please-manifest.json";

/// Starter `release-please-config.json` for a Go module.
pub const CONFIG_TEMPLATE: &str = r#"{
  "release-type": "go",
  "package-name": "your-module-name",
  "packages": {
    ".": {}
  }
}"#;

/// Starter `.release-please-manifest.json`.
pub const MANIFEST_TEMPLATE: &str = r#"{
  ".": "0.1.0"
}"#;

fn semver_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+").expect("static regex"))
}

/// Checks the release-please config and manifest of a project.
#[derive(Debug, Clone)]
pub struct ReleasePleaseValidator<'a> {
    inspector: &'a FileInspector,
}

impl<'a> ReleasePleaseValidator<'a> {
    pub fn new(inspector: &'a FileInspector) -> Self {
        Self { inspector }
    }

    /// Run both file checks, config first.
    pub fn validate(&self) -> Result<Vec<ValidationError>> {
        let mut errors = Vec::new();
        self.check_config(&mut errors)?;
        self.check_manifest(&mut errors)?;
        Ok(errors)
    }

    fn check_config(&self, errors: &mut Vec<ValidationError>) -> Result<()> {
        let Some(config) = self.load_json(
            RELEASE_PLEASE_CONFIG,
            MISNAMED_CONFIG,
            "no dot prefix",
            errors,
        )?
        else {
            return Ok(());
        };

        for field in ["release-type", "package-name"] {
            if has_string(&config, field) {
                continue;
            }
            let legacy = config
                .pointer("/packages/.")
                .is_some_and(|pkg| has_string(pkg, field));
            let err = if legacy {
                ValidationError::new(
                    ValidationErrorKind::FormatError,
                    format!(
                        "Release Please configuration uses legacy format. Move {field} to root level for v16+ compatibility"
                    ),
                )
                .warning()
            } else if field == "release-type" {
                ValidationError::new(
                    ValidationErrorKind::FormatError,
                    "Release Please config should use \"release-type\": \"go\" for Go projects",
                )
            } else {
                ValidationError::new(
                    ValidationErrorKind::FormatError,
                    "Release Please config missing \"package-name\" field",
                )
            };
            errors.push(err.with_file(RELEASE_PLEASE_CONFIG));
        }

        if let Some(branch) = config.get("target-branch").and_then(Value::as_str) {
            if branch != "main" && branch != "master" {
                errors.push(
                    ValidationError::new(
                        ValidationErrorKind::ReleasePleaseConfig,
                        format!("Unusual target branch \"{branch}\". Verify this is correct"),
                    )
                    .with_file(RELEASE_PLEASE_CONFIG)
                    .warning(),
                );
            }
        }
        Ok(())
    }

    fn check_manifest(&self, errors: &mut Vec<ValidationError>) -> Result<()> {
        let Some(manifest) = self.load_json(
            RELEASE_PLEASE_MANIFEST,
            MISNAMED_MANIFEST,
            "with dot prefix",
            errors,
        )?
        else {
            return Ok(());
        };

        match manifest.get(".") {
            None => errors.push(
                ValidationError::new(
                    ValidationErrorKind::ReleasePleaseConfig,
                    "Release Please manifest missing \".\" entry for root package",
                )
                .with_file(RELEASE_PLEASE_MANIFEST),
            ),
            Some(version) => {
                let text = match version {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                if !semver_regex().is_match(&text) {
                    errors.push(
                        ValidationError::new(
                            ValidationErrorKind::ReleasePleaseConfig,
                            format!(
                                "Invalid version format \"{text}\". Use semantic versioning (e.g., \"1.0.0\")"
                            ),
                        )
                        .with_file(RELEASE_PLEASE_MANIFEST),
                    );
                }
            }
        }
        Ok(())
    }

    /// Load `expected` as JSON, recording a naming, presence or syntax
    /// problem and returning `None` when there is nothing to inspect.
    fn load_json(
        &self,
        expected: &str,
        misnamed: &str,
        hint: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<Option<Value>> {
        let content = match self.inspector.read_text(expected) {
            Ok(content) => content,
            Err(CoreError::NotFound(_)) => {
                let err = if self.inspector.exists(misnamed) {
                    ValidationError::new(
                        ValidationErrorKind::FilenameError,
                        format!("Found {misnamed} but Release Please expects {expected} ({hint})"),
                    )
                } else {
                    ValidationError::new(
                        ValidationErrorKind::MissingFile,
                        format!("{expected} (required for release action)"),
                    )
                };
                errors.push(err.with_file(expected));
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                errors.push(
                    ValidationError::new(
                        ValidationErrorKind::InvalidJson,
                        format!("Invalid JSON in {expected}: {e}"),
                    )
                    .with_file(expected),
                );
                Ok(None)
            }
        }
    }
}

fn has_string(value: &Value, field: &str) -> bool {
    value
        .get(field)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}
