//! Per-job results handed from job runners to the unified comment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::CoreError;
use super::validation::ValidationError;

/// The job kinds whose results are aggregated into the unified comment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobKind {
    #[serde(rename = "test")]
    Test,
    #[serde(rename = "lint")]
    Lint,
    #[serde(rename = "benchmark")]
    Benchmark,
    #[serde(rename = "selfValidate")]
    SelfValidate,
}

impl JobKind {
    /// All kinds, in comment order.
    pub const ALL: [JobKind; 4] = [
        JobKind::Test,
        JobKind::Lint,
        JobKind::Benchmark,
        JobKind::SelfValidate,
    ];

    /// Storage key of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            JobKind::Test => "test",
            JobKind::Lint => "lint",
            JobKind::Benchmark => "benchmark",
            JobKind::SelfValidate => "selfValidate",
        }
    }

    /// Human-readable label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            JobKind::Test => "Tests",
            JobKind::Lint => "Lint",
            JobKind::Benchmark => "Benchmarks",
            JobKind::SelfValidate => "Validation",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for JobKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobKind::ALL
            .into_iter()
            .find(|k| {
                k.name().eq_ignore_ascii_case(s)
                    || (s == "self-validate" && *k == JobKind::SelfValidate)
            })
            .ok_or_else(|| CoreError::UnknownJobKind(s.to_string()))
    }
}

/// Status of a finished job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    Failure,
    Skipped,
}

impl JobStatus {
    pub fn from_success(success: bool) -> Self {
        if success {
            JobStatus::Success
        } else {
            JobStatus::Failure
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Success => "success",
            JobStatus::Failure => "failure",
            JobStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestResult {
    pub status: JobStatus,

    /// Coverage as reported by `go tool cover`, e.g. `"85.7%"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LintResult {
    pub status: JobStatus,

    /// golangci-lint version that ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Raw issue text captured from a failing run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BenchmarkConfig {
    pub args: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkResult {
    pub status: JobStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<BenchmarkConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelfValidateResult {
    pub status: JobStatus,

    #[serde(default)]
    pub actions_found: Vec<String>,

    #[serde(default)]
    pub errors: Vec<ValidationError>,
}

/// Result of any job, tagged by its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum JobResult {
    Test(TestResult),
    Lint(LintResult),
    Benchmark(BenchmarkResult),
    SelfValidate(SelfValidateResult),
}

impl JobResult {
    pub fn kind(&self) -> JobKind {
        match self {
            JobResult::Test(_) => JobKind::Test,
            JobResult::Lint(_) => JobKind::Lint,
            JobResult::Benchmark(_) => JobKind::Benchmark,
            JobResult::SelfValidate(_) => JobKind::SelfValidate,
        }
    }

    pub fn status(&self) -> JobStatus {
        match self {
            JobResult::Test(r) => r.status,
            JobResult::Lint(r) => r.status,
            JobResult::Benchmark(r) => r.status,
            JobResult::SelfValidate(r) => r.status,
        }
    }

    /// Serialize the inner record; the kind travels as the storage key.
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            JobResult::Test(r) => serde_json::to_value(r),
            JobResult::Lint(r) => serde_json::to_value(r),
            JobResult::Benchmark(r) => serde_json::to_value(r),
            JobResult::SelfValidate(r) => serde_json::to_value(r),
        }
    }

    /// Decode an inner record stored under `kind`.
    pub fn from_value(kind: JobKind, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            JobKind::Test => JobResult::Test(serde_json::from_value(value)?),
            JobKind::Lint => JobResult::Lint(serde_json::from_value(value)?),
            JobKind::Benchmark => JobResult::Benchmark(serde_json::from_value(value)?),
            JobKind::SelfValidate => JobResult::SelfValidate(serde_json::from_value(value)?),
        })
    }
}

/// Aggregated results of every job that reported, one slot per kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CiResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<TestResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lint: Option<LintResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<BenchmarkResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_validate: Option<SelfValidateResult>,
}

impl CiResults {
    /// Place a result into its slot, replacing any previous one.
    pub fn insert(&mut self, result: JobResult) {
        match result {
            JobResult::Test(r) => self.test = Some(r),
            JobResult::Lint(r) => self.lint = Some(r),
            JobResult::Benchmark(r) => self.benchmark = Some(r),
            JobResult::SelfValidate(r) => self.self_validate = Some(r),
        }
    }

    pub fn status_of(&self, kind: JobKind) -> Option<JobStatus> {
        match kind {
            JobKind::Test => self.test.as_ref().map(|r| r.status),
            JobKind::Lint => self.lint.as_ref().map(|r| r.status),
            JobKind::Benchmark => self.benchmark.as_ref().map(|r| r.status),
            JobKind::SelfValidate => self.self_validate.as_ref().map(|r| r.status),
        }
    }

    /// Kinds present with a non-skipped status, in comment order.
    pub fn reported(&self) -> Vec<JobKind> {
        JobKind::ALL
            .into_iter()
            .filter(|k| matches!(self.status_of(*k), Some(s) if s != JobStatus::Skipped))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.reported().is_empty()
    }

    /// Number of jobs with a non-skipped result.
    pub fn len(&self) -> usize {
        self.reported().len()
    }
}

/// On-disk envelope for a stored job result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub job: JobKind,
    pub recorded_at: DateTime<Utc>,
    pub result: serde_json::Value,
}

impl StoredRecord {
    pub fn new(result: &JobResult) -> serde_json::Result<Self> {
        Ok(Self {
            job: result.kind(),
            recorded_at: Utc::now(),
            result: result.to_value()?,
        })
    }

    pub fn into_result(self) -> serde_json::Result<JobResult> {
        JobResult::from_value(self.job, self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_kind_names() {
        assert_eq!(JobKind::Test.name(), "test");
        assert_eq!(JobKind::SelfValidate.name(), "selfValidate");
        assert_eq!("lint".parse::<JobKind>().unwrap(), JobKind::Lint);
        assert_eq!("self-validate".parse::<JobKind>().unwrap(), JobKind::SelfValidate);
        assert!("deploy".parse::<JobKind>().is_err());
    }

    #[test]
    fn test_reported_skips_skipped_jobs() {
        let mut results = CiResults::default();
        results.insert(JobResult::Test(TestResult {
            status: JobStatus::Success,
            coverage: Some("85%".to_string()),
            error: None,
        }));
        results.insert(JobResult::Lint(LintResult {
            status: JobStatus::Skipped,
            version: None,
            issues: None,
            error: None,
        }));

        assert_eq!(results.reported(), vec![JobKind::Test]);
        assert_eq!(results.len(), 1);
        assert!(!results.is_empty());
    }

    #[test]
    fn test_only_skipped_jobs_count_as_empty() {
        let mut results = CiResults::default();
        results.insert(JobResult::Benchmark(BenchmarkResult {
            status: JobStatus::Skipped,
            config: None,
            error: None,
        }));

        assert!(results.is_empty());
        assert_eq!(results.len(), 0);
    }

    #[test]
    fn test_stored_record_decodes_by_kind() {
        let result = JobResult::Benchmark(BenchmarkResult {
            status: JobStatus::Failure,
            config: Some(BenchmarkConfig {
                args: "-bench=.".to_string(),
                count: 3,
            }),
            error: Some("exit status 1".to_string()),
        });

        let record = StoredRecord::new(&result).unwrap();
        assert_eq!(record.job, JobKind::Benchmark);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"job\":\"benchmark\""));

        let decoded: StoredRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.into_result().unwrap(), result);
    }

    #[test]
    fn test_self_validate_result_uses_camel_case() {
        let json = serde_json::json!({
            "status": "failure",
            "actionsFound": ["ci"],
            "errors": [{"type": "missing_file", "message": "go.mod", "file": "go.mod"}]
        });
        let decoded = JobResult::from_value(JobKind::SelfValidate, json).unwrap();
        match decoded {
            JobResult::SelfValidate(r) => {
                assert_eq!(r.actions_found, vec!["ci".to_string()]);
                assert_eq!(r.errors.len(), 1);
            }
            other => panic!("Expected SelfValidate, got {:?}", other),
        }
    }
}
