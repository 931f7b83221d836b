//! The `self-validate` action: check the repository's own use of go-actions.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, Instrument};

use go_actions_core::{
    obs, render_validation_report, JobKind, JobResult, JobStatus, SelfValidateResult,
    ValidationResult, WorkflowValidator,
};

use crate::actions::{ActionsIo, GithubContext};
use crate::error::{CiError, Result};
use crate::store::{store_best_effort, ResultStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfValidateInputs {
    pub working_directory: PathBuf,

    /// Comma-separated workflow globs; empty keeps the defaults.
    pub workflow_paths: String,

    /// Store the result for the unified PR comment.
    pub comment_on_pr: bool,
}

impl Default for SelfValidateInputs {
    fn default() -> Self {
        Self {
            working_directory: PathBuf::from("."),
            workflow_paths: String::new(),
            comment_on_pr: true,
        }
    }
}

pub struct SelfValidateJob {
    store: Arc<dyn ResultStore>,
    io: ActionsIo,
    context: GithubContext,
}

impl SelfValidateJob {
    pub fn new(store: Arc<dyn ResultStore>, io: ActionsIo, context: GithubContext) -> Self {
        Self { store, io, context }
    }

    /// Validate, publish outputs and annotations, and fail when any
    /// error-severity problem was found.
    pub async fn run(&self, inputs: &SelfValidateInputs) -> Result<ValidationResult> {
        self.run_inner(inputs)
            .instrument(obs::job_span(JobKind::SelfValidate))
            .await
    }

    async fn run_inner(&self, inputs: &SelfValidateInputs) -> Result<ValidationResult> {
        obs::emit_job_started(
            JobKind::SelfValidate,
            &inputs.working_directory.display().to_string(),
        );

        let result = WorkflowValidator::new(&inputs.working_directory)
            .with_patterns([inputs.workflow_paths.as_str()])
            .validate()?;

        self.publish_outputs(&result)?;
        self.io.append_summary(&render_validation_report(&result))?;
        self.io.annotate(&result);

        if inputs.comment_on_pr && self.context.is_pull_request() {
            let stored = JobResult::SelfValidate(SelfValidateResult {
                status: JobStatus::from_success(result.is_valid),
                actions_found: result.actions_found.clone(),
                errors: result.errors.clone(),
            });
            store_best_effort(self.store.as_ref(), &stored).await;
        } else {
            info!(
                comment_on_pr = inputs.comment_on_pr,
                event = %self.context.event_name,
                "not storing validation result"
            );
        }

        if result.is_valid {
            Ok(result)
        } else {
            Err(CiError::ValidationFailed(result.error_count()))
        }
    }

    fn publish_outputs(&self, result: &ValidationResult) -> Result<()> {
        let messages = result
            .errors
            .iter()
            .map(|e| format!("- {}", e.message))
            .collect::<Vec<_>>()
            .join("\n");
        self.io
            .set_output("actions_found", &result.actions_found.join(","))?;
        self.io
            .set_output("validation_failed", &(!result.is_valid).to_string())?;
        self.io.set_output("error_messages", &messages)?;
        Ok(())
    }
}
