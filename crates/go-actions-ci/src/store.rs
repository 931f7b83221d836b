//! Hand-off of job results between isolated job runs.
//!
//! Every job writes its result through a [`ResultStore`]; the comment step
//! reads them all back. Jobs run in separate runners, so the only shared
//! medium is the results directory that the composite actions upload and
//! download as named artifacts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use go_actions_core::{obs, CiResults, JobKind, JobResult, Outcome, StoredRecord};

use crate::actions::{result_output_names, ActionsIo};
use crate::error::StoreError;

/// Artifact name prefix used when none is configured.
pub const DEFAULT_ARTIFACT_PREFIX: &str = "go-actions-results";

/// File holding one job's record inside its artifact directory.
pub const RESULT_FILE_NAME: &str = "results.json";

/// Persistence for per-job results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Persist a job's result, replacing any earlier one for the same job.
    async fn store(&self, result: &JobResult) -> Result<(), StoreError>;

    /// Load one job's result.
    async fn load(&self, job: JobKind) -> Outcome<JobResult>;

    /// Load every job's result. Jobs that are absent or unreadable are left
    /// out; one bad record never fails the whole load.
    async fn load_all(&self) -> CiResults {
        let mut results = CiResults::default();
        for job in JobKind::ALL {
            match self.load(job).await {
                Outcome::Completed(result) => results.insert(result),
                Outcome::Absent(reason) => debug!(job = %job, reason = %reason, "no stored result"),
                Outcome::Failed(reason) => {
                    warn!(job = %job, error = %reason, "failed to load stored result")
                }
            }
        }
        results
    }
}

/// Stores results as `{root}/{prefix}-{job}/results.json`.
///
/// Each `{prefix}-{job}` directory is uploaded as an artifact of the same
/// name by the job, and downloaded back under `root` by the comment job.
#[derive(Debug, Clone)]
pub struct ArtifactResultStore {
    root: PathBuf,
    prefix: String,
}

impl ArtifactResultStore {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Artifact (and directory) name for a job.
    pub fn artifact_name(&self, job: JobKind) -> String {
        format!("{}-{}", self.prefix, job.name())
    }

    pub fn result_path(&self, job: JobKind) -> PathBuf {
        self.root.join(self.artifact_name(job)).join(RESULT_FILE_NAME)
    }
}

#[async_trait]
impl ResultStore for ArtifactResultStore {
    fn name(&self) -> &'static str {
        "artifact"
    }

    async fn store(&self, result: &JobResult) -> Result<(), StoreError> {
        let path = self.result_path(result.kind());
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let record = StoredRecord::new(result)?;
        let json = serde_json::to_vec_pretty(&record)?;
        tokio::fs::write(&path, json).await?;
        debug!(path = %path.display(), "wrote result record");
        Ok(())
    }

    async fn load(&self, job: JobKind) -> Outcome<JobResult> {
        let path = self.result_path(job);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Outcome::Absent(format!("{} not found", path.display()));
            }
            Err(e) => return Outcome::Failed(format!("{}: {}", path.display(), e)),
        };
        Outcome::from_result(decode_record(job, &bytes))
    }
}

fn decode_record(job: JobKind, bytes: &[u8]) -> Result<JobResult, StoreError> {
    let record: StoredRecord = serde_json::from_slice(bytes)?;
    if record.job != job {
        return Err(StoreError::MismatchedJob {
            expected: job,
            found: record.job,
        });
    }
    Ok(record.into_result()?)
}

/// Fallback for runs without a results directory: publishes the result as
/// a step output and an exported variable. Nothing can be read back.
#[derive(Debug, Clone)]
pub struct OutputResultStore {
    io: ActionsIo,
}

impl OutputResultStore {
    pub fn new(io: ActionsIo) -> Self {
        Self { io }
    }
}

#[async_trait]
impl ResultStore for OutputResultStore {
    fn name(&self) -> &'static str {
        "output"
    }

    async fn store(&self, result: &JobResult) -> Result<(), StoreError> {
        let json = serde_json::to_string(&result.to_value()?)?;
        let (output, env) = result_output_names(result.kind().name());
        self.io.set_output(&output, &json)?;
        self.io.export_variable(&env, &json)?;
        Ok(())
    }

    async fn load(&self, job: JobKind) -> Outcome<JobResult> {
        Outcome::Absent(format!(
            "{} results are not readable from step outputs",
            job.name()
        ))
    }
}

/// Pick a store: the artifact store when a results directory is configured,
/// otherwise the output fallback.
pub fn select_store(
    results_dir: Option<&Path>,
    prefix: &str,
    io: ActionsIo,
) -> Arc<dyn ResultStore> {
    match results_dir {
        Some(dir) => Arc::new(ArtifactResultStore::new(dir, prefix)),
        None => Arc::new(OutputResultStore::new(io)),
    }
}

/// Store a result, logging instead of failing.
pub async fn store_best_effort(store: &dyn ResultStore, result: &JobResult) -> Outcome<()> {
    match store.store(result).await {
        Ok(()) => {
            obs::emit_result_stored(result.kind(), store.name());
            Outcome::Completed(())
        }
        Err(e) => {
            obs::emit_result_store_failed(result.kind(), &e);
            Outcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use go_actions_core::{JobStatus, LintResult, TestResult};

    fn lint_failure() -> JobResult {
        JobResult::Lint(LintResult {
            status: JobStatus::Failure,
            version: Some("v2.1.0".to_string()),
            issues: Some("main.go:3:2: unused variable".to_string()),
            error: None,
        })
    }

    #[tokio::test]
    async fn test_artifact_store_layout_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactResultStore::new(dir.path(), DEFAULT_ARTIFACT_PREFIX);

        store.store(&lint_failure()).await.unwrap();

        let expected = dir
            .path()
            .join("go-actions-results-lint")
            .join("results.json");
        assert_eq!(store.result_path(JobKind::Lint), expected);
        assert!(expected.exists());

        let loaded = store.load(JobKind::Lint).await;
        assert_eq!(loaded, Outcome::Completed(lint_failure()));
        assert!(matches!(store.load(JobKind::Test).await, Outcome::Absent(_)));
    }

    #[tokio::test]
    async fn test_malformed_record_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactResultStore::new(dir.path(), "ci");
        store
            .store(&JobResult::Test(TestResult {
                status: JobStatus::Success,
                coverage: Some("91.2%".to_string()),
                error: None,
            }))
            .await
            .unwrap();

        let bad = store.result_path(JobKind::Lint);
        std::fs::create_dir_all(bad.parent().unwrap()).unwrap();
        std::fs::write(&bad, "invalid json").unwrap();

        assert!(store.load(JobKind::Lint).await.is_failed());

        let all = store.load_all().await;
        assert!(all.lint.is_none());
        assert_eq!(all.test.unwrap().coverage.as_deref(), Some("91.2%"));
    }

    #[tokio::test]
    async fn test_record_under_wrong_job_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactResultStore::new(dir.path(), "ci");
        store.store(&lint_failure()).await.unwrap();

        let misplaced = store.result_path(JobKind::Benchmark);
        std::fs::create_dir_all(misplaced.parent().unwrap()).unwrap();
        std::fs::copy(store.result_path(JobKind::Lint), &misplaced).unwrap();

        match store.load(JobKind::Benchmark).await {
            Outcome::Failed(reason) => assert!(reason.contains("found under benchmark")),
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_output_store_writes_output_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output");
        let env = dir.path().join("env");
        let store =
            OutputResultStore::new(ActionsIo::new(Some(output.clone()), Some(env.clone()), None));

        let result = JobResult::Test(TestResult {
            status: JobStatus::Success,
            coverage: Some("80%".to_string()),
            error: None,
        });
        store.store(&result).await.unwrap();

        let json = r#"{"coverage":"80%","status":"success"}"#;
        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            format!("test_results={json}\n")
        );
        assert_eq!(
            std::fs::read_to_string(env).unwrap(),
            format!("GO_ACTIONS_TEST_RESULTS={json}\n")
        );
        assert!(store.load_all().await.is_empty());
    }

    #[test]
    fn test_select_store() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            select_store(Some(dir.path()), "p", ActionsIo::default()).name(),
            "artifact"
        );
        assert_eq!(select_store(None, "p", ActionsIo::default()).name(), "output");
    }
}
