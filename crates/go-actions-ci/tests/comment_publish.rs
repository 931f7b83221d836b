//! Publishing the unified comment from stored results.

use std::sync::Arc;

use go_actions_ci::fakes::{MemoryCommentApi, MemoryResultStore};
use go_actions_ci::{
    ArtifactResultStore, CommentApi, GithubContext, PublishAction, ResultStore,
    UnifiedCommentPublisher,
};
use go_actions_core::{
    CiResults, JobResult, JobStatus, LintResult, Outcome, TestResult, COMMENT_HEADER,
    COMMENT_MARKER,
};

fn pr_context() -> GithubContext {
    GithubContext {
        event_name: "pull_request".to_string(),
        repository: Some("octo/demo".to_string()),
        api_url: "https://api.github.com".to_string(),
        pr_number: Some(42),
    }
}

fn results() -> CiResults {
    let mut results = CiResults::default();
    results.insert(JobResult::Test(TestResult {
        status: JobStatus::Success,
        coverage: Some("85.7%".to_string()),
        error: None,
    }));
    results.insert(JobResult::Lint(LintResult {
        status: JobStatus::Failure,
        version: Some("v2.1.0".to_string()),
        issues: Some("main.go:7:2: ineffectual assignment".to_string()),
        error: Some("Linting issues found - check logs for details".to_string()),
    }));
    results
}

fn publisher(context: GithubContext, api: &Arc<MemoryCommentApi>) -> UnifiedCommentPublisher {
    let api: Arc<dyn CommentApi> = api.clone();
    UnifiedCommentPublisher::new(context, Some(api))
}

#[tokio::test]
async fn push_events_are_skipped() {
    let api = Arc::new(MemoryCommentApi::new());
    let context = GithubContext {
        event_name: "push".to_string(),
        ..pr_context()
    };

    let outcome = publisher(context, &api).publish(&results()).await;

    assert!(matches!(outcome, Outcome::Absent(_)));
    assert!(api.created().is_empty());
}

#[tokio::test]
async fn missing_token_is_skipped() {
    let publisher = UnifiedCommentPublisher::from_token(pr_context(), None).unwrap();
    match publisher.publish(&results()).await {
        Outcome::Absent(reason) => assert!(reason.contains("No GitHub token")),
        other => panic!("Expected Absent, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_results_are_skipped() {
    let api = Arc::new(MemoryCommentApi::new());
    let outcome = publisher(pr_context(), &api)
        .publish(&CiResults::default())
        .await;
    assert!(matches!(outcome, Outcome::Absent(_)));
}

#[tokio::test]
async fn creates_comment_when_none_exists() {
    let api = Arc::new(
        MemoryCommentApi::new().with_comment(42, "User", "Looks good, one nit below."),
    );

    let outcome = publisher(pr_context(), &api).publish(&results()).await;

    assert!(matches!(outcome, Outcome::Completed(PublishAction::Created(_))));
    let created = api.created();
    assert_eq!(created.len(), 1);
    let (pr, body) = &created[0];
    assert_eq!(*pr, 42);
    assert!(body.starts_with(COMMENT_MARKER));
    assert!(body.contains("**Overall Status:** ❌ FAILURE"));
    assert!(api.updated().is_empty());
}

#[tokio::test]
async fn updates_existing_bot_comment() {
    let api = Arc::new(
        MemoryCommentApi::new()
            .with_comment(42, "User", &format!("quoting {COMMENT_HEADER}"))
            .with_comment(42, "Bot", &format!("{COMMENT_MARKER}\n{COMMENT_HEADER}\nold")),
    );

    let outcome = publisher(pr_context(), &api).publish(&results()).await;

    assert_eq!(outcome, Outcome::Completed(PublishAction::Updated(2)));
    assert!(api.created().is_empty());
    let updated = api.updated();
    assert_eq!(updated.len(), 1);
    assert!(updated[0].1.contains("85.7%"));
}

#[tokio::test]
async fn api_errors_are_reported_not_raised() {
    let api = Arc::new(MemoryCommentApi::failing(502));

    match publisher(pr_context(), &api).publish(&results()).await {
        Outcome::Failed(reason) => assert!(reason.contains("502")),
        other => panic!("Expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_repository_fails() {
    let api = Arc::new(MemoryCommentApi::new());
    let context = GithubContext {
        repository: Some("demo".to_string()),
        ..pr_context()
    };

    let outcome = publisher(context, &api).publish(&results()).await;
    assert!(outcome.is_failed());
}

#[tokio::test]
async fn comment_from_artifact_results() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactResultStore::new(dir.path(), "go-actions-results");
    for result in [
        JobResult::Test(TestResult {
            status: JobStatus::Success,
            coverage: Some("91.0%".to_string()),
            error: None,
        }),
        JobResult::Lint(LintResult {
            status: JobStatus::Success,
            version: Some("v2.1.0".to_string()),
            issues: None,
            error: None,
        }),
    ] {
        store.store(&result).await.unwrap();
    }

    let loaded = store.load_all().await;
    assert_eq!(loaded.len(), 2);

    let api = Arc::new(MemoryCommentApi::new());
    let outcome = publisher(pr_context(), &api).publish(&loaded).await;

    assert!(outcome.is_completed());
    let body = &api.created()[0].1;
    assert!(body.contains("**Overall Status:** ✅ SUCCESS"));
    assert!(body.contains("91.0%"));
}

#[tokio::test]
async fn memory_store_round_trips_through_load_all() {
    let store = MemoryResultStore::new();
    store.store(&results_lint()).await.unwrap();
    let loaded = store.load_all().await;
    assert_eq!(loaded.lint.unwrap().status, JobStatus::Failure);
    assert!(loaded.test.is_none());
}

fn results_lint() -> JobResult {
    JobResult::Lint(LintResult {
        status: JobStatus::Failure,
        version: None,
        issues: None,
        error: Some("Linting issues found - check logs for details".to_string()),
    })
}
