//! The `ci` action's jobs: test, lint and benchmark.
//!
//! Every job hands its result to the result store, then writes its step
//! outputs and, on failure, returns [`CiError::JobFailed`] after the failure result
//! has been stored so the unified comment can still report it.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, Instrument};

use go_actions_core::{
    obs, resolve_lint_version, BenchmarkConfig, BenchmarkResult, JobKind, JobResult, JobStatus,
    LintResult, TestResult,
};

use crate::actions::ActionsIo;
use crate::benchmark::run_benchmarks;
use crate::coverage::extract_coverage;
use crate::error::{CiError, Result};
use crate::runner::{CommandRunner, StageResult};
use crate::stage::{
    StageConfig, COVERAGE_FILE, DEFAULT_BENCHMARK_ARGS, DEFAULT_BENCHMARK_COUNT, DEFAULT_TEST_ARGS,
};
use crate::store::{store_best_effort, ResultStore};

/// Step outputs a job writes once its result is stored.
type StepOutputs = Vec<(&'static str, String)>;

/// Accepted values of the `job` input.
pub const VALID_JOBS: &str = "test, lint, benchmark";

/// Error recorded when golangci-lint reports issues.
pub const LINT_FAILURE_MESSAGE: &str = "Linting issues found - check logs for details";

/// A job the `ci` action can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiJob {
    Test,
    Lint,
    Benchmark,
}

impl CiJob {
    pub fn kind(&self) -> JobKind {
        match self {
            CiJob::Test => JobKind::Test,
            CiJob::Lint => JobKind::Lint,
            CiJob::Benchmark => JobKind::Benchmark,
        }
    }
}

impl FromStr for CiJob {
    type Err = CiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "test" => Ok(CiJob::Test),
            "lint" => Ok(CiJob::Lint),
            "benchmark" => Ok(CiJob::Benchmark),
            other => Err(CiError::UnknownJob {
                job: other.to_string(),
                valid: VALID_JOBS.to_string(),
            }),
        }
    }
}

/// Inputs shared by the `ci` jobs.
#[derive(Debug, Clone, PartialEq)]
pub struct CiJobInputs {
    pub working_directory: PathBuf,
    pub test_args: String,

    /// Requested golangci-lint version; `v2`, `latest` and unset resolve
    /// to the pinned default.
    pub golangci_lint_version: Option<String>,

    pub lint_args: String,
    pub benchmark_args: String,
    pub benchmark_count: u32,

    /// Go toolchain selection; set up by the composite action, only logged here.
    pub go_version: Option<String>,
    pub go_version_file: Option<String>,
}

impl Default for CiJobInputs {
    fn default() -> Self {
        Self {
            working_directory: PathBuf::from("."),
            test_args: DEFAULT_TEST_ARGS.to_string(),
            golangci_lint_version: None,
            lint_args: String::new(),
            benchmark_args: DEFAULT_BENCHMARK_ARGS.to_string(),
            benchmark_count: DEFAULT_BENCHMARK_COUNT,
            go_version: None,
            go_version_file: None,
        }
    }
}

/// Parse the `benchmark-count` input. Zero runs nothing and is rejected.
pub fn parse_benchmark_count(value: &str) -> Result<u32> {
    let invalid = |reason: &str| CiError::InvalidInput {
        name: "benchmark-count".to_string(),
        reason: reason.to_string(),
    };
    match value.trim().parse::<u32>() {
        Ok(0) => Err(invalid("must be at least 1")),
        Ok(count) => Ok(count),
        Err(e) => Err(invalid(&e.to_string())),
    }
}

/// Runs `ci` jobs against injected command runner and result store.
pub struct JobRunner {
    runner: Arc<dyn CommandRunner>,
    store: Arc<dyn ResultStore>,
    io: ActionsIo,
}

impl JobRunner {
    pub fn new(runner: Arc<dyn CommandRunner>, store: Arc<dyn ResultStore>, io: ActionsIo) -> Self {
        Self { runner, store, io }
    }

    /// Run one job to completion.
    pub async fn run(&self, job: CiJob, inputs: &CiJobInputs) -> Result<JobResult> {
        let kind = job.kind();
        let span = obs::job_span(kind);
        self.run_inner(job, inputs).instrument(span).await
    }

    async fn run_inner(&self, job: CiJob, inputs: &CiJobInputs) -> Result<JobResult> {
        let kind = job.kind();
        let start = Instant::now();
        obs::emit_job_started(kind, &inputs.working_directory.display().to_string());
        if let Some(v) = inputs.go_version.as_deref().filter(|v| !v.is_empty()) {
            info!(go_version = %v, "go version");
        }
        if let Some(f) = inputs.go_version_file.as_deref().filter(|f| !f.is_empty()) {
            info!(go_version_file = %f, "go version file");
        }

        let (result, outputs) = match job {
            CiJob::Test => self.run_test(inputs).await?,
            CiJob::Lint => (self.run_lint(inputs).await?, Vec::new()),
            CiJob::Benchmark => self.run_benchmark(inputs).await?,
        };

        let success = result.status() == JobStatus::Success;
        obs::emit_job_finished(kind, start.elapsed().as_millis() as u64, success);
        store_best_effort(self.store.as_ref(), &result).await;

        for (name, value) in &outputs {
            self.io.set_output(name, value)?;
        }

        if success {
            Ok(result)
        } else {
            Err(CiError::JobFailed {
                job: kind,
                message: failure_text(&result),
            })
        }
    }

    async fn run_test(&self, inputs: &CiJobInputs) -> Result<(JobResult, StepOutputs)> {
        let cwd = &inputs.working_directory;
        let stage = StageConfig::go_test(&inputs.test_args, cwd);
        info!(command = %stage.display_command(), "running tests");

        if let Err(error) = passed(self.runner.run(&stage).await) {
            let result = JobResult::Test(TestResult {
                status: JobStatus::Failure,
                coverage: None,
                error: Some(error),
            });
            return Ok((result, Vec::new()));
        }

        let report = extract_coverage(self.runner.as_ref(), cwd, COVERAGE_FILE).await;
        let outputs = vec![
            ("coverage", report.output_value().to_string()),
            ("has_coverage", report.has_coverage.to_string()),
        ];

        let result = JobResult::Test(TestResult {
            status: JobStatus::Success,
            coverage: report.coverage.map(with_percent),
            error: None,
        });
        Ok((result, outputs))
    }

    async fn run_lint(&self, inputs: &CiJobInputs) -> Result<JobResult> {
        let cwd = &inputs.working_directory;
        let version = resolve_lint_version(inputs.golangci_lint_version.as_deref()).to_string();
        let failure = |error: String, issues: Option<String>| {
            JobResult::Lint(LintResult {
                status: JobStatus::Failure,
                version: Some(version.clone()),
                issues,
                error: Some(error),
            })
        };

        let install = StageConfig::install_golangci_lint(&version, cwd);
        info!(version = %version, command = %install.display_command(), "installing golangci-lint");
        if let Err(error) = passed(self.runner.run(&install).await) {
            return Ok(failure(error, None));
        }

        let lint = StageConfig::golangci_lint_run(&inputs.lint_args, cwd);
        info!(command = %lint.display_command(), "running golangci-lint");
        match self.runner.run(&lint).await {
            Ok(result) if result.passed() => Ok(JobResult::Lint(LintResult {
                status: JobStatus::Success,
                version: Some(version.clone()),
                issues: None,
                error: None,
            })),
            Ok(result) => {
                let issues = result.combined_output();
                Ok(failure(
                    LINT_FAILURE_MESSAGE.to_string(),
                    (!issues.is_empty()).then_some(issues),
                ))
            }
            Err(e) => Ok(failure(e.to_string(), None)),
        }
    }

    async fn run_benchmark(&self, inputs: &CiJobInputs) -> Result<(JobResult, StepOutputs)> {
        if inputs.benchmark_count == 0 {
            return Err(CiError::InvalidInput {
                name: "benchmark-count".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let stage = StageConfig::go_bench(&inputs.benchmark_args, &inputs.working_directory);
        info!(
            command = %stage.display_command(),
            count = inputs.benchmark_count,
            "running benchmarks"
        );

        let run = run_benchmarks(self.runner.as_ref(), &stage, inputs.benchmark_count).await;
        let outputs = vec![
            ("benchmark_success", run.success().to_string()),
            ("benchmark_error", run.error.clone().unwrap_or_default()),
        ];

        let result = JobResult::Benchmark(BenchmarkResult {
            status: JobStatus::from_success(run.success()),
            config: Some(BenchmarkConfig {
                args: inputs.benchmark_args.clone(),
                count: inputs.benchmark_count,
            }),
            error: run.error,
        });
        Ok((result, outputs))
    }
}

/// `Ok` when the command ran and exited 0, otherwise a failure message.
fn passed(result: anyhow::Result<StageResult>) -> std::result::Result<StageResult, String> {
    match result {
        Ok(r) if r.passed() => Ok(r),
        Ok(r) => Err(r.failure_message()),
        Err(e) => Err(e.to_string()),
    }
}

/// `go tool cover` prints a percentage already; bare numbers get one.
fn with_percent(coverage: String) -> String {
    if coverage.ends_with('%') {
        coverage
    } else {
        format!("{coverage}%")
    }
}

fn failure_text(result: &JobResult) -> String {
    let error = match result {
        JobResult::Test(r) => r.error.clone(),
        JobResult::Lint(r) => r.error.clone(),
        JobResult::Benchmark(r) => r.error.clone(),
        JobResult::SelfValidate(r) => Some(format!("{} validation error(s)", r.errors.len())),
    };
    error.unwrap_or_else(|| "unknown error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_parsing() {
        assert_eq!("lint".parse::<CiJob>().unwrap(), CiJob::Lint);
        assert_eq!(" benchmark ".parse::<CiJob>().unwrap().kind(), JobKind::Benchmark);

        let err = "deploy".parse::<CiJob>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid job type: deploy. Valid options are: test, lint, benchmark"
        );
    }

    #[test]
    fn test_benchmark_count_parsing() {
        assert_eq!(parse_benchmark_count("3").unwrap(), 3);
        assert!(matches!(
            parse_benchmark_count("0"),
            Err(CiError::InvalidInput { .. })
        ));
        assert!(parse_benchmark_count("five").is_err());
    }

    #[test]
    fn test_default_inputs() {
        let inputs = CiJobInputs::default();
        assert_eq!(inputs.test_args, "-v -race -coverprofile=coverage.out");
        assert_eq!(inputs.benchmark_args, "-bench=. -benchmem");
        assert_eq!(inputs.benchmark_count, 5);
        assert_eq!(inputs.golangci_lint_version, None);
    }

    #[test]
    fn test_with_percent() {
        assert_eq!(with_percent("85.7%".to_string()), "85.7%");
        assert_eq!(with_percent("42".to_string()), "42%");
    }
}
