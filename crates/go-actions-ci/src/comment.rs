//! Publishing the unified PR comment through the GitHub issues API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use go_actions_core::{is_unified_comment, obs, render_unified_comment, CiResults, Outcome};

use crate::actions::GithubContext;
use crate::error::CommentError;

const USER_AGENT: &str = concat!("go-actions/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const PER_PAGE: usize = 100;

/// `user.type` of comments made with a workflow token.
pub const BOT_USER_TYPE: &str = "Bot";

/// A pull request comment as far as the publisher cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueComment {
    pub id: u64,
    pub user_type: String,
    pub body: String,
}

impl IssueComment {
    fn is_ours(&self) -> bool {
        self.user_type == BOT_USER_TYPE && is_unified_comment(&self.body)
    }
}

/// The slice of the GitHub issues API used for the unified comment.
#[async_trait]
pub trait CommentApi: Send + Sync {
    /// All comments on a pull request, oldest first.
    async fn list_comments(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<Vec<IssueComment>, CommentError>;

    /// Create a comment; returns its id.
    async fn create_comment(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        body: &str,
    ) -> Result<u64, CommentError>;

    /// Replace a comment's body; returns its id.
    async fn update_comment(
        &self,
        owner: &str,
        repo: &str,
        comment_id: u64,
        body: &str,
    ) -> Result<u64, CommentError>;
}

// ---------------------------------------------------------------------------
// GithubCommentClient
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CommentPayload {
    id: u64,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    user: Option<UserPayload>,
}

#[derive(Deserialize)]
struct UserPayload {
    #[serde(rename = "type", default)]
    user_type: String,
}

impl From<CommentPayload> for IssueComment {
    fn from(payload: CommentPayload) -> Self {
        IssueComment {
            id: payload.id,
            user_type: payload.user.map(|u| u.user_type).unwrap_or_default(),
            body: payload.body.unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

/// REST client for issue comments, authenticated with a token.
pub struct GithubCommentClient {
    api_url: String,
    token: String,
    http_client: reqwest::Client,
}

impl GithubCommentClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self, CommentError> {
        let http_client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http_client,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.api_url, path))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send<T: for<'de> Deserialize<'de>>(
        request: reqwest::RequestBuilder,
    ) -> Result<T, CommentError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CommentError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl CommentApi for GithubCommentClient {
    async fn list_comments(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<Vec<IssueComment>, CommentError> {
        let path = format!("/repos/{owner}/{repo}/issues/{pr_number}/comments");
        let mut comments = Vec::new();
        let mut page = 1usize;
        loop {
            let request = self
                .request(reqwest::Method::GET, &path)
                .query(&[("per_page", PER_PAGE), ("page", page)]);
            let batch: Vec<CommentPayload> = Self::send(request).await?;
            let done = batch.len() < PER_PAGE;
            comments.extend(batch.into_iter().map(IssueComment::from));
            if done {
                break;
            }
            page += 1;
        }
        debug!(pr_number = pr_number, count = comments.len(), "listed comments");
        Ok(comments)
    }

    async fn create_comment(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        body: &str,
    ) -> Result<u64, CommentError> {
        let request = self
            .request(
                reqwest::Method::POST,
                &format!("/repos/{owner}/{repo}/issues/{pr_number}/comments"),
            )
            .json(&CommentBody { body });
        let created: CommentPayload = Self::send(request).await?;
        Ok(created.id)
    }

    async fn update_comment(
        &self,
        owner: &str,
        repo: &str,
        comment_id: u64,
        body: &str,
    ) -> Result<u64, CommentError> {
        let request = self
            .request(
                reqwest::Method::PATCH,
                &format!("/repos/{owner}/{repo}/issues/comments/{comment_id}"),
            )
            .json(&CommentBody { body });
        let updated: CommentPayload = Self::send(request).await?;
        Ok(updated.id)
    }
}

// ---------------------------------------------------------------------------
// UnifiedCommentPublisher
// ---------------------------------------------------------------------------

/// What happened to the unified comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
    Created(u64),
    Updated(u64),
}

impl PublishAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishAction::Created(_) => "created",
            PublishAction::Updated(_) => "updated",
        }
    }

    pub fn comment_id(&self) -> u64 {
        match self {
            PublishAction::Created(id) | PublishAction::Updated(id) => *id,
        }
    }
}

/// Creates or updates the single unified comment on a pull request.
///
/// Publishing never fails the calling step: preconditions that are not met
/// give [`Outcome::Absent`], API errors give [`Outcome::Failed`].
pub struct UnifiedCommentPublisher {
    context: GithubContext,

    /// `None` when no token was provided.
    api: Option<Arc<dyn CommentApi>>,
}

impl UnifiedCommentPublisher {
    pub fn new(context: GithubContext, api: Option<Arc<dyn CommentApi>>) -> Self {
        Self { context, api }
    }

    /// Build a publisher backed by [`GithubCommentClient`] when a token is set.
    pub fn from_token(context: GithubContext, token: Option<&str>) -> Result<Self, CommentError> {
        let api = match token.filter(|t| !t.is_empty()) {
            Some(token) => {
                let client = GithubCommentClient::new(&context.api_url, token)?;
                Some(Arc::new(client) as Arc<dyn CommentApi>)
            }
            None => None,
        };
        Ok(Self::new(context, api))
    }

    pub async fn publish(&self, results: &CiResults) -> Outcome<PublishAction> {
        let outcome = self.try_publish(results).await;
        match &outcome {
            Outcome::Completed(action) => {
                if let Some(pr) = self.context.pr_number {
                    obs::emit_comment_published(pr, action.as_str(), action.comment_id());
                }
            }
            Outcome::Absent(reason) => info!(reason = %reason, "skipping PR comment"),
            Outcome::Failed(reason) => obs::emit_comment_skipped(reason),
        }
        outcome
    }

    async fn try_publish(&self, results: &CiResults) -> Outcome<PublishAction> {
        if !self.context.is_pull_request() {
            return Outcome::Absent(format!(
                "event '{}' is not a pull request",
                self.context.event_name
            ));
        }
        if results.is_empty() {
            return Outcome::Absent("no job results to report".to_string());
        }
        let Some(api) = self.api.as_ref() else {
            return Outcome::Absent("No GitHub token found, skipping PR comment".to_string());
        };
        let Some(pr_number) = self.context.pr_number else {
            return Outcome::Absent("pull request number not found in event".to_string());
        };
        let Some((owner, repo)) = self.context.owner_repo() else {
            let repository = self.context.repository.clone().unwrap_or_default();
            return Outcome::Failed(CommentError::InvalidRepository(repository).to_string());
        };

        let body = render_unified_comment(results);
        Outcome::from_result(upsert(api.as_ref(), owner, repo, pr_number, &body).await)
    }
}

async fn upsert(
    api: &dyn CommentApi,
    owner: &str,
    repo: &str,
    pr_number: u64,
    body: &str,
) -> Result<PublishAction, CommentError> {
    let existing = api
        .list_comments(owner, repo, pr_number)
        .await?
        .into_iter()
        .find(IssueComment::is_ours);

    match existing {
        Some(comment) => {
            debug!(comment_id = comment.id, "updating existing unified comment");
            let id = api.update_comment(owner, repo, comment.id, body).await?;
            Ok(PublishAction::Updated(id))
        }
        None => {
            let id = api.create_comment(owner, repo, pr_number, body).await?;
            Ok(PublishAction::Created(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_payload_decoding() {
        let json = r#"[
            {"id": 1, "body": "LGTM", "user": {"login": "octocat", "type": "User"}},
            {"id": 2, "body": null, "user": {"login": "github-actions[bot]", "type": "Bot"}}
        ]"#;
        let payloads: Vec<CommentPayload> = serde_json::from_str(json).unwrap();
        let comments: Vec<IssueComment> = payloads.into_iter().map(IssueComment::from).collect();
        assert_eq!(comments[0].user_type, "User");
        assert_eq!(comments[1].body, "");
        assert_eq!(comments[1].user_type, "Bot");
    }

    #[test]
    fn test_only_bot_comments_with_marker_are_ours() {
        let ours = IssueComment {
            id: 9,
            user_type: "Bot".to_string(),
            body: format!("{}\n## 🚀 Go Actions CI Results", go_actions_core::COMMENT_MARKER),
        };
        let quoted = IssueComment {
            user_type: "User".to_string(),
            ..ours.clone()
        };
        assert!(ours.is_ours());
        assert!(!quoted.is_ours());
    }

    #[test]
    fn test_publish_action_accessors() {
        assert_eq!(PublishAction::Created(4).as_str(), "created");
        assert_eq!(PublishAction::Updated(7).comment_id(), 7);
    }

    #[test]
    fn test_client_trims_api_url() {
        let client = GithubCommentClient::new("https://ghe.example.com/api/v3/", "t").unwrap();
        assert_eq!(client.api_url, "https://ghe.example.com/api/v3");
    }
}
