//! go-actions core library
//!
//! Validation of a Go repository's GitHub workflows and configuration files,
//! the per-job result model, and markdown rendering of the unified PR comment.

pub mod domain;
pub mod goreleaser;
pub mod inspector;
pub mod obs;
pub mod project;
pub mod release_please;
pub mod reporter;
pub mod telemetry;
pub mod validator;
pub mod version;
pub mod workflow;

pub use domain::{
    BenchmarkConfig, BenchmarkResult, CiResults, CoreError, JobKind, JobResult, JobStatus,
    LintResult, Outcome, Result, SelfValidateResult, Severity, StoredRecord, TestResult,
    ValidationError, ValidationErrorKind, ValidationResult,
};

pub use inspector::FileInspector;
pub use project::{render_release_instructions, require_release_token, ProjectValidator, ReleaseValidator};
pub use release_please::ReleasePleaseValidator;
pub use reporter::{
    is_unified_comment, overall_status, render_pending_comment, render_unified_comment,
    render_validation_report, COMMENT_HEADER, COMMENT_MARKER,
};
pub use telemetry::init_tracing;
pub use validator::WorkflowValidator;
pub use version::{
    check_incompatibility, compatible, major_version, normalize_lint_version,
    resolve_lint_version, LintWrapper, DEFAULT_GOLANGCI_LINT_VERSION, KNOWN_INCOMPATIBILITIES,
};
pub use workflow::{WorkflowFile, WorkflowScanner, DEFAULT_PROVIDER};
