//! GitHub Actions runner integration: step outputs, exported variables,
//! the step summary, workflow-command annotations and the run context.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use go_actions_core::{Severity, ValidationError, ValidationResult};

/// Events on which the unified comment is posted.
pub const PULL_REQUEST_EVENTS: &[&str] = &["pull_request", "pull_request_target"];

const DEFAULT_API_URL: &str = "https://api.github.com";

/// Writer for the runner's command files.
///
/// Each file is optional; writes to an unset file are dropped with a debug
/// log so jobs also run outside of GitHub Actions.
#[derive(Debug, Clone, Default)]
pub struct ActionsIo {
    output_file: Option<PathBuf>,
    env_file: Option<PathBuf>,
    summary_file: Option<PathBuf>,
}

impl ActionsIo {
    pub fn new(
        output_file: Option<PathBuf>,
        env_file: Option<PathBuf>,
        summary_file: Option<PathBuf>,
    ) -> Self {
        Self {
            output_file,
            env_file,
            summary_file,
        }
    }

    /// Read `GITHUB_OUTPUT`, `GITHUB_ENV` and `GITHUB_STEP_SUMMARY`.
    pub fn from_env() -> Self {
        let path = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self::new(
            path("GITHUB_OUTPUT"),
            path("GITHUB_ENV"),
            path("GITHUB_STEP_SUMMARY"),
        )
    }

    /// Set a step output.
    pub fn set_output(&self, name: &str, value: &str) -> std::io::Result<()> {
        append_key_value(self.output_file.as_deref(), name, value)
    }

    /// Export an environment variable to later steps of the job.
    pub fn export_variable(&self, name: &str, value: &str) -> std::io::Result<()> {
        append_key_value(self.env_file.as_deref(), name, value)
    }

    /// Append markdown to the job summary.
    pub fn append_summary(&self, markdown: &str) -> std::io::Result<()> {
        let Some(path) = self.summary_file.as_deref() else {
            debug!("GITHUB_STEP_SUMMARY not set, dropping summary");
            return Ok(());
        };
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{markdown}")
    }

    /// Print an `::error::` or `::warning::` annotation for every problem
    /// in a validation result.
    pub fn annotate(&self, result: &ValidationResult) {
        for error in &result.errors {
            println!("{}", annotation(error));
        }
    }
}

/// The workflow command annotating one validation problem, attached to its
/// file when it has one.
pub fn annotation(error: &ValidationError) -> String {
    let command = match error.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    workflow_command(command, error.file.as_deref(), &error.message)
}

fn append_key_value(path: Option<&Path>, name: &str, value: &str) -> std::io::Result<()> {
    let Some(path) = path else {
        debug!(name = %name, "runner file not set, dropping value");
        return Ok(());
    };
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(format_key_value(name, value).as_bytes())
}

/// `name=value`, or the heredoc form for multi-line values.
pub fn format_key_value(name: &str, value: &str) -> String {
    if value.contains('\n') || value.contains('\r') {
        let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
        format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
    } else {
        format!("{name}={value}\n")
    }
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

/// Render a workflow command line such as `::error file=go.mod::missing`.
pub fn workflow_command(command: &str, file: Option<&str>, message: &str) -> String {
    match file {
        Some(file) => format!(
            "::{command} file={}::{}",
            escape_property(file),
            escape_data(message)
        ),
        None => format!("::{command}::{}", escape_data(message)),
    }
}

/// Step output name and environment variable for a job's stored result.
pub fn result_output_names(job_name: &str) -> (String, String) {
    (
        format!("{job_name}_results"),
        format!("GO_ACTIONS_{}_RESULTS", job_name.to_uppercase()),
    )
}

/// The workflow run this process belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GithubContext {
    pub event_name: String,

    /// `owner/repo`.
    pub repository: Option<String>,

    pub api_url: String,

    /// Pull request number, when the event carries one.
    pub pr_number: Option<u64>,
}

#[derive(Deserialize)]
struct EventPayload {
    #[serde(default)]
    number: Option<u64>,
    #[serde(default)]
    pull_request: Option<PullRequestPayload>,
}

#[derive(Deserialize)]
struct PullRequestPayload {
    number: u64,
}

impl GithubContext {
    /// Load from the runner's `GITHUB_*` variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pr_number = lookup("GITHUB_EVENT_PATH")
            .and_then(|path| pr_number_from_event_file(Path::new(&path)))
            .or_else(|| lookup("GITHUB_REF").and_then(|r| pr_number_from_ref(&r)));

        Self {
            event_name: lookup("GITHUB_EVENT_NAME").unwrap_or_default(),
            repository: lookup("GITHUB_REPOSITORY"),
            api_url: lookup("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            pr_number,
        }
    }

    /// Whether the run was triggered by a pull request event.
    pub fn is_pull_request(&self) -> bool {
        PULL_REQUEST_EVENTS.iter().any(|e| *e == self.event_name)
    }

    /// `(owner, repo)` split from `GITHUB_REPOSITORY`.
    pub fn owner_repo(&self) -> Option<(&str, &str)> {
        let (owner, repo) = self.repository.as_deref()?.split_once('/')?;
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some((owner, repo))
    }
}

fn pr_number_from_event_file(path: &Path) -> Option<u64> {
    let content = std::fs::read_to_string(path).ok()?;
    let payload: EventPayload = serde_json::from_str(&content).ok()?;
    payload.pull_request.map(|pr| pr.number).or(payload.number)
}

/// `refs/pull/123/merge` -> 123.
fn pr_number_from_ref(git_ref: &str) -> Option<u64> {
    git_ref.strip_prefix("refs/pull/")?.split('/').next()?.parse().ok()
}
