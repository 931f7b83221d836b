//! GoReleaser configuration checks.

use serde_yaml::Value;

use crate::domain::{CoreError, Result, ValidationError, ValidationErrorKind};
use crate::inspector::{FileInspector, GORELEASER_CONFIGS};

const PROJECT_NAME_TEMPLATE: &str = "{{ .ProjectName }}";

/// Check the first GoReleaser config found under the project.
pub fn check_goreleaser(inspector: &FileInspector) -> Result<Vec<ValidationError>> {
    let Some(file) = inspector.first_existing(GORELEASER_CONFIGS) else {
        return Ok(vec![ValidationError::missing_file(
            GORELEASER_CONFIGS[0],
            ".goreleaser.yaml or .goreleaser.yml (required for release action)",
        )]);
    };

    let content = match inspector.read_text(file) {
        Ok(content) => content,
        Err(CoreError::NotFound(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    Ok(check_goreleaser_document(file, &content))
}

/// Check GoReleaser YAML text.
pub fn check_goreleaser_document(file: &str, content: &str) -> Vec<ValidationError> {
    let issue = |message: String| {
        ValidationError::new(ValidationErrorKind::GoreleaserConfig, message).with_file(file)
    };

    let doc: Value = match serde_yaml::from_str(content) {
        Ok(doc) => doc,
        Err(e) => return vec![issue(format!("Invalid GoReleaser configuration: {e}"))],
    };

    let Some(builds) = doc.get("builds") else {
        return vec![issue(
            "GoReleaser config missing required \"builds\" section".to_string(),
        )];
    };
    let builds: &[Value] = builds.as_sequence().map(|s| s.as_slice()).unwrap_or_default();

    let mut errors = Vec::new();

    let odd_binary = builds.iter().any(|b| {
        b.get("binary")
            .and_then(Value::as_str)
            .is_some_and(|name| !name.contains(PROJECT_NAME_TEMPLATE))
    });
    if odd_binary {
        errors.push(
            issue(format!(
                "GoReleaser binary naming may cause issues. Consider using \"{PROJECT_NAME_TEMPLATE}\""
            ))
            .warning(),
        );
    }

    let targets_linux = builds.iter().any(|b| {
        b.get("goos")
            .and_then(Value::as_sequence)
            .is_some_and(|oses| oses.iter().any(|os| os.as_str() == Some("linux")))
    });
    if targets_linux && uses_zip_archives(&doc) {
        errors.push(
            issue("ZIP format for Linux archives may cause compatibility issues. Consider tar.gz".to_string())
                .warning(),
        );
    }

    errors
}

/// Zip as a default archive format; per-OS overrides do not count.
fn uses_zip_archives(doc: &Value) -> bool {
    let Some(archives) = doc.get("archives").and_then(Value::as_sequence) else {
        return false;
    };
    archives.iter().any(|archive| {
        let single = archive.get("format").and_then(Value::as_str) == Some("zip");
        let listed = archive
            .get("formats")
            .and_then(Value::as_sequence)
            .is_some_and(|fs| fs.iter().any(|f| f.as_str() == Some("zip")));
        single || listed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;

    #[test]
    fn test_missing_config_reports_yaml_name() {
        let dir = tempfile::tempdir().unwrap();
        let errors = check_goreleaser(&FileInspector::new(dir.path())).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::MissingFile);
        assert_eq!(errors[0].file.as_deref(), Some(".goreleaser.yaml"));
    }

    #[test]
    fn test_yml_fallback_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".goreleaser.yml"),
            "builds:\n  - binary: \"{{ .ProjectName }}\"\n    goos: [linux]\n",
        )
        .unwrap();
        assert!(check_goreleaser(&FileInspector::new(dir.path())).unwrap().is_empty());
    }

    #[test]
    fn test_missing_builds_section() {
        let errors = check_goreleaser_document(".goreleaser.yaml", "project_name: demo\n");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_error());
        assert!(errors[0].message.contains("\"builds\""));
    }

    #[test]
    fn test_unparseable_yaml() {
        let errors = check_goreleaser_document(".goreleaser.yaml", "builds: [\n");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("Invalid GoReleaser configuration"));
    }

    #[test]
    fn test_binary_and_zip_warnings() {
        let content = r#"
builds:
  - binary: demo
    goos: [linux, darwin]
archives:
  - format: zip
"#;
        let errors = check_goreleaser_document(".goreleaser.yaml", content);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.severity == Severity::Warning));
        assert!(errors[0].message.contains("binary naming"));
        assert!(errors[1].message.contains("ZIP format"));
    }

    #[test]
    fn test_zip_without_linux_is_fine() {
        let content = "builds:\n  - goos: [windows]\narchives:\n  - formats: [zip]\n";
        assert!(check_goreleaser_document(".goreleaser.yaml", content).is_empty());
    }
}
