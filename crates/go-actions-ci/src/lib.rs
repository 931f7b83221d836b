//! go-actions ci library
//!
//! Runs the Go test, lint and benchmark jobs of the `ci` action, the
//! `self-validate` job, hands each job's result to a [`ResultStore`] and
//! publishes the unified PR comment built from every stored result.

pub mod actions;
pub mod benchmark;
pub mod comment;
pub mod coverage;
pub mod error;
pub mod fakes;
pub mod jobs;
pub mod runner;
pub mod selfvalidate;
pub mod stage;
pub mod store;

pub use actions::{ActionsIo, GithubContext};
pub use comment::{CommentApi, GithubCommentClient, PublishAction, UnifiedCommentPublisher};
pub use error::{CiError, CommentError, Result, StoreError};
pub use jobs::{parse_benchmark_count, CiJob, CiJobInputs, JobRunner};
pub use runner::{CommandRunner, ProcessRunner, StageResult};
pub use selfvalidate::{SelfValidateInputs, SelfValidateJob};
pub use stage::StageConfig;
pub use store::{
    select_store, ArtifactResultStore, OutputResultStore, ResultStore, DEFAULT_ARTIFACT_PREFIX,
};
