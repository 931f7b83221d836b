//! Workflow discovery and action-usage extraction.
//!
//! Workflow files are parsed as YAML and walked for step mappings (any
//! mapping with a string `uses` key). Files that are not valid YAML are
//! still scanned with the line-window text matcher so that a broken
//! workflow referencing an action is not silently ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde_yaml::Value;
use tracing::debug;

use crate::domain::{CoreError, Result};
use crate::version::major_version;

/// Default workflow locations, relative to the working directory.
pub const DEFAULT_WORKFLOW_PATTERNS: &[&str] =
    &[".github/workflows/*.yaml", ".github/workflows/*.yml"];

/// Owner/repository that publishes the go-actions actions.
pub const DEFAULT_PROVIDER: &str = "jrschumacher/go-actions";

/// `uses:` prefix of the upstream golangci-lint action.
pub const GOLANGCI_LINT_ACTION: &str = "golangci/golangci-lint-action";

/// Lines after a text match searched for inline configuration.
const TEXT_WINDOW_LINES: usize = 10;

/// A step that references an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRef {
    pub uses: String,
    pub with: BTreeMap<String, String>,
}

/// A detected use of a provider action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionUsage {
    /// Action name, e.g. `ci`.
    pub action: String,

    /// Inline inputs found for the first matching step.
    pub inputs: BTreeMap<String, String>,
}

impl ActionUsage {
    pub fn input(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).map(String::as_str)
    }
}

/// A direct use of `golangci/golangci-lint-action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintActionUsage {
    /// Major of the action ref (`@v8` -> 8); `None` for SHAs and branches.
    pub action_major: Option<u32>,

    /// `with.version`, if set.
    pub version: Option<String>,
}

/// One workflow file, read and parsed.
#[derive(Debug, Clone)]
pub struct WorkflowFile {
    pub path: PathBuf,
    content: String,
    steps: Option<Vec<StepRef>>,
}

impl WorkflowFile {
    /// Parse workflow text. Non-YAML text is kept for the text matcher.
    pub fn parse(path: impl Into<PathBuf>, content: String) -> Self {
        let path = path.into();
        let steps = match serde_yaml::from_str::<Value>(&content) {
            Ok(tree) => {
                let mut steps = Vec::new();
                collect_steps(&tree, &mut steps);
                Some(steps)
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "workflow is not valid YAML, using text scan");
                None
            }
        };
        Self {
            path,
            content,
            steps,
        }
    }

    /// Whether the file parsed as YAML.
    pub fn is_structured(&self) -> bool {
        self.steps.is_some()
    }

    /// Steps found in the document; empty for unstructured files.
    pub fn steps(&self) -> &[StepRef] {
        self.steps.as_deref().unwrap_or(&[])
    }

    /// First use of `{provider}/{action}@...`, if any.
    pub fn find_action(&self, provider: &str, action: &str) -> Option<ActionUsage> {
        let prefix = format!("{provider}/{action}@");
        match &self.steps {
            Some(steps) => steps
                .iter()
                .find(|s| s.uses.trim().starts_with(&prefix))
                .map(|s| ActionUsage {
                    action: action.to_string(),
                    inputs: s.with.clone(),
                }),
            None => text_find_action(&self.content, &prefix).map(|inputs| ActionUsage {
                action: action.to_string(),
                inputs,
            }),
        }
    }

    /// Every direct golangci-lint-action step, in document order.
    pub fn lint_action_usages(&self) -> Vec<LintActionUsage> {
        let prefix = format!("{GOLANGCI_LINT_ACTION}@");
        match &self.steps {
            Some(steps) => steps
                .iter()
                .filter_map(|s| {
                    let git_ref = s.uses.trim().strip_prefix(&prefix)?;
                    Some(LintActionUsage {
                        action_major: parse_ref_major(git_ref),
                        version: s.with.get("version").cloned(),
                    })
                })
                .collect(),
            None => text_lint_action_usages(&self.content),
        }
    }
}

/// Finds and reads workflow files under a working directory.
#[derive(Debug, Clone)]
pub struct WorkflowScanner {
    root: PathBuf,
    patterns: Vec<String>,
}

impl WorkflowScanner {
    /// Scanner over the default `.github/workflows/*.{yaml,yml}` locations.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            patterns: DEFAULT_WORKFLOW_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Replace the search patterns (comma-separated input form accepted).
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .flat_map(|p| {
                p.as_ref()
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|p| !p.is_empty())
            .collect();
        if !patterns.is_empty() {
            self.patterns = patterns;
        }
        self
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Workflow paths matching the patterns: `.yaml`/`.yml` files only,
    /// sorted and deduplicated.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let escaped_root = glob::Pattern::escape(&self.root.to_string_lossy());
        let mut found = Vec::new();

        for pattern in &self.patterns {
            let full = format!("{}/{}", escaped_root.trim_end_matches('/'), pattern);
            let entries = glob::glob(&full).map_err(|e| CoreError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.msg.to_string(),
            })?;
            for path in entries.flatten() {
                if path.is_file() && has_workflow_extension(&path) {
                    found.push(path);
                }
            }
        }

        found.sort();
        found.dedup();
        Ok(found)
    }

    /// Discover and parse every workflow file.
    ///
    /// # Errors
    ///
    /// Fails if a pattern is invalid or a discovered file cannot be read.
    pub fn scan(&self) -> Result<Vec<WorkflowFile>> {
        self.discover()?
            .into_iter()
            .map(|path| {
                let content = std::fs::read_to_string(&path).map_err(|source| CoreError::Read {
                    path: path.clone(),
                    source,
                })?;
                Ok(WorkflowFile::parse(path, content))
            })
            .collect()
    }
}

fn has_workflow_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn collect_steps(value: &Value, out: &mut Vec<StepRef>) {
    match value {
        Value::Mapping(map) => {
            if let Some(Value::String(uses)) = map.get("uses") {
                let with = match map.get("with") {
                    Some(Value::Mapping(with)) => with
                        .iter()
                        .filter_map(|(k, v)| Some((k.as_str()?.to_string(), scalar_to_string(v)?)))
                        .collect(),
                    _ => BTreeMap::new(),
                };
                out.push(StepRef {
                    uses: uses.clone(),
                    with,
                });
            }
            for (_, child) in map {
                collect_steps(child, out);
            }
        }
        Value::Sequence(items) => {
            for item in items {
                collect_steps(item, out);
            }
        }
        Value::Tagged(tagged) => collect_steps(&tagged.value, out),
        _ => {}
    }
}

fn parse_ref_major(git_ref: &str) -> Option<u32> {
    if !git_ref.starts_with('v') {
        return None;
    }
    major_version(git_ref).parse().ok()
}

fn input_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*-?\s*([A-Za-z0-9_-]+):\s*["']?([^"'\s]+)["']?"#).expect("static regex")
    })
}

fn lint_action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"uses:\s*golangci/golangci-lint-action@v(\d+)").expect("static regex")
    })
}

fn block_version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*version:\s*["']?([^"'\s]+)["']?"#).expect("static regex")
    })
}

/// Text fallback: substring detection plus `key: value` pairs from the
/// following lines.
fn text_find_action(content: &str, prefix: &str) -> Option<BTreeMap<String, String>> {
    let start = content.find(prefix)?;
    let line_start = content[..start].rfind('\n').map_or(0, |i| i + 1);

    let mut inputs = BTreeMap::new();
    for line in content[line_start..].lines().skip(1).take(TEXT_WINDOW_LINES - 1) {
        if let Some(caps) = input_line_regex().captures(line) {
            let key = &caps[1];
            if key == "uses" || key == "with" {
                continue;
            }
            inputs.entry(key.to_string()).or_insert_with(|| caps[2].to_string());
        }
    }
    Some(inputs)
}

fn text_lint_action_usages(content: &str) -> Vec<LintActionUsage> {
    lint_action_regex()
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let block_end = content[whole.end()..]
                .find("- uses:")
                .map_or(content.len(), |i| whole.end() + i);
            let block = &content[whole.end()..block_end];
            Some(LintActionUsage {
                action_major: caps[1].parse().ok(),
                version: block_version_regex()
                    .captures(block)
                    .map(|c| c[1].to_string()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CI_WORKFLOW: &str = r#"
name: CI
on: [pull_request]
jobs:
  lint:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - uses: jrschumacher/go-actions/ci@v1
        with:
          job: lint
          golangci-lint-version: "v1.62.2"
          benchmark-count: 3
"#;

    #[test]
    fn test_structured_find_action() {
        let wf = WorkflowFile::parse("ci.yaml", CI_WORKFLOW.to_string());
        assert!(wf.is_structured());
        assert_eq!(wf.steps().len(), 2);

        let usage = wf.find_action(DEFAULT_PROVIDER, "ci").expect("ci usage");
        assert_eq!(usage.input("job"), Some("lint"));
        assert_eq!(usage.input("golangci-lint-version"), Some("v1.62.2"));
        assert_eq!(usage.input("benchmark-count"), Some("3"));

        assert!(wf.find_action(DEFAULT_PROVIDER, "release").is_none());
    }

    #[test]
    fn test_bare_uses_line_is_a_step() {
        let wf = WorkflowFile::parse("ci.yaml", "uses: jrschumacher/go-actions/ci@main".to_string());
        assert!(wf.find_action(DEFAULT_PROVIDER, "ci").is_some());
    }

    #[test]
    fn test_text_fallback_for_invalid_yaml() {
        let content = "jobs:\n  lint:\n    steps:\n\t- uses: jrschumacher/go-actions/ci@main\n        with:\n          golangci-lint-version: 'v1.54.2'\n";
        let wf = WorkflowFile::parse("broken.yaml", content.to_string());
        assert!(!wf.is_structured());

        let usage = wf.find_action(DEFAULT_PROVIDER, "ci").expect("ci usage");
        assert_eq!(usage.input("golangci-lint-version"), Some("v1.54.2"));
    }

    #[test]
    fn test_lint_action_usages() {
        let content = r#"
jobs:
  lint:
    steps:
      - uses: golangci/golangci-lint-action@v8
        with:
          version: v1.64.0
      - uses: golangci/golangci-lint-action@3a919529898de77ec3da873e3063ca4b10e7f5cc
"#;
        let wf = WorkflowFile::parse("lint.yml", content.to_string());
        let usages = wf.lint_action_usages();
        assert_eq!(usages.len(), 2);
        assert_eq!(usages[0].action_major, Some(8));
        assert_eq!(usages[0].version.as_deref(), Some("v1.64.0"));
        assert_eq!(usages[1].action_major, None);
        assert_eq!(usages[1].version, None);
    }

    #[test]
    fn test_text_lint_action_block_ends_at_next_step() {
        let content = "\t- uses: golangci/golangci-lint-action@v7\n      with:\n        version: v1.60.0\n    - uses: golangci/golangci-lint-action@v8\n";
        let usages = text_lint_action_usages(content);
        assert_eq!(usages.len(), 2);
        assert_eq!(usages[0].version.as_deref(), Some("v1.60.0"));
        assert_eq!(usages[1].version, None);
    }

    #[test]
    fn test_discover_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let wf_dir = dir.path().join(".github/workflows");
        std::fs::create_dir_all(&wf_dir).unwrap();
        for name in ["test.yml", "deploy.yaml", "README.md"] {
            std::fs::write(wf_dir.join(name), "name: x\n").unwrap();
        }

        let scanner = WorkflowScanner::new(dir.path());
        let found = scanner.discover().unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["deploy.yaml".to_string(), "test.yml".to_string()]);
    }

    #[test]
    fn test_discover_without_workflow_dir() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = WorkflowScanner::new(dir.path());
        assert!(scanner.discover().unwrap().is_empty());
    }

    #[test]
    fn test_custom_patterns_from_input() {
        let scanner = WorkflowScanner::new(".")
            .with_patterns([".github/workflows/ci.yaml, ci/*.yml"]);
        assert_eq!(
            scanner.patterns(),
            &[".github/workflows/ci.yaml".to_string(), "ci/*.yml".to_string()]
        );

        let unchanged = WorkflowScanner::new(".").with_patterns([""]);
        assert_eq!(unchanged.patterns().len(), 2);
    }
}
