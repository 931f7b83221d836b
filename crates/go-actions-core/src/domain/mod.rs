//! Domain model: validation records, job results and best-effort outcomes.

pub mod error;
pub mod job;
pub mod outcome;
pub mod validation;

pub use error::{CoreError, Result};
pub use job::{
    BenchmarkConfig, BenchmarkResult, CiResults, JobKind, JobResult, JobStatus, LintResult,
    SelfValidateResult, StoredRecord, TestResult,
};
pub use outcome::Outcome;
pub use validation::{Severity, ValidationError, ValidationErrorKind, ValidationResult};
