//! Lifecycle events for jobs, validation passes and the PR comment.
//!
//! Every helper logs one `info!` (or `warn!`) line with a stable `event`
//! field so runs can be filtered with `RUST_LOG` and the JSON formatter.

use tracing::{info, warn};

use crate::domain::{JobKind, ValidationResult};

/// Span tagging everything logged during a job with its kind.
///
/// Attach it with `tracing::Instrument` so it follows the job future
/// across awaits.
pub fn job_span(job: JobKind) -> tracing::Span {
    tracing::info_span!("go_actions.job", job = %job)
}

pub fn emit_job_started(job: JobKind, working_directory: &str) {
    info!(event = "job.started", job = %job, working_directory = %working_directory);
}

pub fn emit_job_finished(job: JobKind, duration_ms: u64, success: bool) {
    info!(
        event = "job.finished",
        job = %job,
        duration_ms = duration_ms,
        success = success,
    );
}

/// Emit event: a workflow validation pass completed.
pub fn emit_validation_completed(result: &ValidationResult) {
    info!(
        event = "validation.completed",
        is_valid = result.is_valid,
        actions = %result.actions_found.join(","),
        errors = result.error_count(),
        warnings = result.warning_count(),
    );
}

pub fn emit_result_stored(job: JobKind, store: &str) {
    info!(event = "result.stored", job = %job, store = %store);
}

/// Emit event: a stored result could not be written (warning level).
pub fn emit_result_store_failed(job: JobKind, error: &dyn std::fmt::Display) {
    warn!(event = "result.store_failed", job = %job, error = %error);
}

pub fn emit_comment_published(pr_number: u64, action: &str, comment_id: u64) {
    info!(
        event = "comment.published",
        pr_number = pr_number,
        action = %action,
        comment_id = comment_id,
    );
}

/// Emit event: the PR comment was not posted (warning level).
pub fn emit_comment_skipped(reason: &str) {
    warn!(event = "comment.skipped", reason = %reason);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_span_create() {
        let _guard = job_span(JobKind::Lint).entered();
        emit_job_started(JobKind::Lint, ".");
        emit_job_finished(JobKind::Lint, 12, true);
    }
}
