//! In-memory fakes for the ci traits (testing only)
//!
//! Provides `MemoryResultStore`, `ScriptedCommandRunner` and
//! `MemoryCommentApi` so jobs and the comment publisher can be exercised
//! without a Go toolchain, a results directory or the GitHub API.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use go_actions_core::{JobKind, JobResult, Outcome};

use crate::comment::{CommentApi, IssueComment, BOT_USER_TYPE};
use crate::error::{CommentError, StoreError};
use crate::runner::{CommandRunner, StageResult};
use crate::stage::StageConfig;
use crate::store::ResultStore;

// ---------------------------------------------------------------------------
// MemoryResultStore
// ---------------------------------------------------------------------------

/// Result store backed by a `HashMap<JobKind, JobResult>`.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    results: Mutex<HashMap<JobKind, JobResult>>,
    fail_writes: bool,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn get(&self, job: JobKind) -> Option<JobResult> {
        self.results.lock().unwrap().get(&job).cloned()
    }

    pub fn len(&self) -> usize {
        self.results.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn store(&self, result: &JobResult) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "memory store is read-only",
            )));
        }
        let mut results = self.results.lock().unwrap();
        results.insert(result.kind(), result.clone());
        Ok(())
    }

    async fn load(&self, job: JobKind) -> Outcome<JobResult> {
        match self.get(job) {
            Some(result) => Outcome::Completed(result),
            None => Outcome::Absent(format!("no {job} result stored")),
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedCommandRunner
// ---------------------------------------------------------------------------

/// One scripted reply to a command.
#[derive(Debug, Clone)]
pub enum ScriptedStep {
    /// The command ran and exited with `code`.
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },

    /// The command could not be started.
    SpawnError(String),
}

/// Command runner that replays scripted replies per stage name.
///
/// Replies for a stage are consumed in order; a stage with no remaining
/// reply exits 0 with no output. Every invocation is recorded.
#[derive(Debug, Default)]
pub struct ScriptedCommandRunner {
    scripts: Mutex<HashMap<String, VecDeque<ScriptedStep>>>,
    invocations: Mutex<Vec<StageConfig>>,
}

impl ScriptedCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(self, stage_name: &str, step: ScriptedStep) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(stage_name.to_string())
            .or_default()
            .push_back(step);
        self
    }

    pub fn with_success(self, stage_name: &str, stdout: &str) -> Self {
        self.with_step(
            stage_name,
            ScriptedStep::Exit {
                code: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        )
    }

    pub fn with_failure(self, stage_name: &str, code: i32, stdout: &str, stderr: &str) -> Self {
        self.with_step(
            stage_name,
            ScriptedStep::Exit {
                code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        )
    }

    /// Every command run so far, in order.
    pub fn invocations(&self) -> Vec<StageConfig> {
        self.invocations.lock().unwrap().clone()
    }

    /// Number of runs of one stage.
    pub fn count(&self, stage_name: &str) -> usize {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.name == stage_name)
            .count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedCommandRunner {
    async fn run(&self, stage: &StageConfig) -> anyhow::Result<StageResult> {
        self.invocations.lock().unwrap().push(stage.clone());

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&stage.name)
            .and_then(VecDeque::pop_front);

        let (code, stdout, stderr) = match step {
            Some(ScriptedStep::SpawnError(message)) => anyhow::bail!(message),
            Some(ScriptedStep::Exit {
                code,
                stdout,
                stderr,
            }) => (code, stdout, stderr),
            None => (0, String::new(), String::new()),
        };

        Ok(StageResult {
            stage_name: stage.name.clone(),
            exit_code: code,
            stdout,
            stderr,
            duration_ms: 1,
            success: code == 0,
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryCommentApi
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct CommentState {
    comments: Vec<(u64, IssueComment)>,
    next_id: u64,
    created: Vec<(u64, String)>,
    updated: Vec<(u64, String)>,
}

/// Comment API backed by a list of `(pr_number, comment)` pairs.
#[derive(Debug, Default)]
pub struct MemoryCommentApi {
    state: Mutex<CommentState>,
    fail_status: Option<u16>,
}

impl MemoryCommentApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// An API that answers every call with HTTP `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::default()
        }
    }

    /// Seed an existing comment on `pr_number`.
    pub fn with_comment(self, pr_number: u64, user_type: &str, body: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = state.next_id;
            state.comments.push((
                pr_number,
                IssueComment {
                    id,
                    user_type: user_type.to_string(),
                    body: body.to_string(),
                },
            ));
        }
        self
    }

    /// `(pr_number, body)` of every created comment.
    pub fn created(&self) -> Vec<(u64, String)> {
        self.state.lock().unwrap().created.clone()
    }

    /// `(comment_id, body)` of every update.
    pub fn updated(&self) -> Vec<(u64, String)> {
        self.state.lock().unwrap().updated.clone()
    }

    fn check(&self) -> Result<(), CommentError> {
        match self.fail_status {
            Some(status) => Err(CommentError::Api {
                status,
                body: r#"{"message":"Server Error"}"#.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CommentApi for MemoryCommentApi {
    async fn list_comments(
        &self,
        _owner: &str,
        _repo: &str,
        pr_number: u64,
    ) -> Result<Vec<IssueComment>, CommentError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .comments
            .iter()
            .filter(|(pr, _)| *pr == pr_number)
            .map(|(_, c)| c.clone())
            .collect())
    }

    async fn create_comment(
        &self,
        _owner: &str,
        _repo: &str,
        pr_number: u64,
        body: &str,
    ) -> Result<u64, CommentError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.comments.push((
            pr_number,
            IssueComment {
                id,
                user_type: BOT_USER_TYPE.to_string(),
                body: body.to_string(),
            },
        ));
        state.created.push((pr_number, body.to_string()));
        Ok(id)
    }

    async fn update_comment(
        &self,
        _owner: &str,
        _repo: &str,
        comment_id: u64,
        body: &str,
    ) -> Result<u64, CommentError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let Some((_, comment)) = state.comments.iter_mut().find(|(_, c)| c.id == comment_id)
        else {
            return Err(CommentError::Api {
                status: 404,
                body: r#"{"message":"Not Found"}"#.to_string(),
            });
        };
        comment.body = body.to_string();
        state.updated.push((comment_id, body.to_string()));
        Ok(comment_id)
    }
}
