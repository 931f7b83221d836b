//! go-actions - GitHub Actions automation for Go projects
//!
//! The `go-actions` binary backs the composite actions. Every action input
//! is a flag with an `INPUT_*` environment fallback.
//!
//! ## Commands
//!
//! - `ci`: run the test, lint or benchmark job
//! - `self-validate`: check the repository's workflows and config files
//! - `comment`: publish the unified PR comment from stored results
//! - `validate-project`: check the Go project layout
//! - `validate-release`: pre-flight checks for the release action
//! - `release-outputs`: set the release action's outputs

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::{info, warn, Level};

use go_actions_ci::actions::workflow_command;
use go_actions_ci::stage::DEFAULT_BENCHMARK_COUNT;
use go_actions_ci::{
    parse_benchmark_count, select_store, ActionsIo, CiError, CiJob, CiJobInputs, GithubContext,
    JobRunner, ProcessRunner, SelfValidateInputs, SelfValidateJob, UnifiedCommentPublisher,
    DEFAULT_ARTIFACT_PREFIX,
};
use go_actions_core::{
    render_release_instructions, render_validation_report, require_release_token, Outcome,
    ProjectValidator, ReleaseValidator,
};

#[derive(Parser)]
#[command(name = "go-actions")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "GitHub Actions automation for Go projects", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where job results are handed between jobs.
#[derive(Args, Debug, Clone)]
struct StoreArgs {
    /// Directory holding one `{prefix}-{job}` artifact directory per job;
    /// without it results go to step outputs only
    #[arg(long, env = "GO_ACTIONS_RESULTS_DIR")]
    results_dir: Option<PathBuf>,

    /// Artifact name prefix
    #[arg(long, env = "GO_ACTIONS_ARTIFACT_PREFIX", default_value = DEFAULT_ARTIFACT_PREFIX)]
    artifact_prefix: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one CI job
    Ci {
        /// Job to run: test, lint or benchmark
        #[arg(long, env = "INPUT_JOB")]
        job: String,

        #[arg(long, env = "INPUT_WORKING_DIRECTORY", default_value = ".")]
        working_directory: PathBuf,

        /// Arguments for `go test`
        #[arg(long, env = "INPUT_TEST_ARGS", default_value = go_actions_ci::stage::DEFAULT_TEST_ARGS)]
        test_args: String,

        /// golangci-lint version (`v2` and `latest` resolve to the pinned default)
        #[arg(long, env = "INPUT_GOLANGCI_LINT_VERSION")]
        golangci_lint_version: Option<String>,

        /// Arguments for `golangci-lint run`
        #[arg(long, env = "INPUT_LINT_ARGS", default_value = "")]
        lint_args: String,

        /// Arguments for the benchmark `go test`
        #[arg(long, env = "INPUT_BENCHMARK_ARGS", default_value = go_actions_ci::stage::DEFAULT_BENCHMARK_ARGS)]
        benchmark_args: String,

        /// Number of benchmark runs
        #[arg(long, env = "INPUT_BENCHMARK_COUNT")]
        benchmark_count: Option<String>,

        #[arg(long, env = "INPUT_GO_VERSION")]
        go_version: Option<String>,

        #[arg(long, env = "INPUT_GO_VERSION_FILE")]
        go_version_file: Option<String>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Validate the repository's use of go-actions
    SelfValidate {
        #[arg(long, env = "INPUT_WORKING_DIRECTORY", default_value = ".")]
        working_directory: PathBuf,

        /// Comma-separated workflow globs
        #[arg(long, env = "INPUT_WORKFLOW_PATHS", default_value = "")]
        workflow_paths: String,

        /// Store the result for the unified PR comment
        #[arg(
            long,
            env = "INPUT_COMMENT_ON_PR",
            default_value_t = true,
            action = ArgAction::Set
        )]
        comment_on_pr: bool,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Publish the unified PR comment
    Comment {
        #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Check the Go project layout
    ValidateProject {
        #[arg(long, env = "INPUT_WORKING_DIRECTORY", default_value = ".")]
        working_directory: PathBuf,
    },

    /// Check that the release action can run
    ValidateRelease {
        #[arg(long, env = "INPUT_WORKING_DIRECTORY", default_value = ".")]
        working_directory: PathBuf,

        #[arg(long, env = "INPUT_RELEASE_TOKEN", hide_env_values = true)]
        release_token: Option<String>,
    },

    /// Set the release action's outputs from the release-please step
    ReleaseOutputs {
        #[arg(long, env = "RELEASE_CREATED", default_value_t = false, action = ArgAction::Set)]
        release_created: bool,

        #[arg(long, env = "RELEASE_TAG", default_value = "")]
        tag_name: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    go_actions_core::init_tracing(cli.json, level);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}", workflow_command("error", None, &format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<()> {
    let io = ActionsIo::from_env();

    match command {
        Commands::Ci {
            job,
            working_directory,
            test_args,
            golangci_lint_version,
            lint_args,
            benchmark_args,
            benchmark_count,
            go_version,
            go_version_file,
            store,
        } => {
            let benchmark_count = match benchmark_count.as_deref().map(str::trim) {
                None | Some("") => DEFAULT_BENCHMARK_COUNT,
                Some(count) => parse_benchmark_count(count)?,
            };
            let inputs = CiJobInputs {
                working_directory,
                test_args,
                golangci_lint_version,
                lint_args,
                benchmark_args,
                benchmark_count,
                go_version,
                go_version_file,
            };
            cmd_ci(&job, &inputs, &store, io).await
        }
        Commands::SelfValidate {
            working_directory,
            workflow_paths,
            comment_on_pr,
            store,
        } => {
            let inputs = SelfValidateInputs {
                working_directory,
                workflow_paths,
                comment_on_pr,
            };
            cmd_self_validate(&inputs, &store, io).await
        }
        Commands::Comment {
            github_token,
            store,
        } => cmd_comment(github_token.as_deref(), &store, io, GithubContext::from_env()).await,
        Commands::ValidateProject { working_directory } => {
            cmd_validate_project(&working_directory, &io)
        }
        Commands::ValidateRelease {
            working_directory,
            release_token,
        } => cmd_validate_release(&working_directory, release_token.as_deref(), &io),
        Commands::ReleaseOutputs {
            release_created,
            tag_name,
        } => cmd_release_outputs(release_created, &tag_name, &io),
    }
}

async fn cmd_ci(job: &str, inputs: &CiJobInputs, store: &StoreArgs, io: ActionsIo) -> Result<()> {
    let job: CiJob = job.parse()?;
    let results = select_store(store.results_dir.as_deref(), &store.artifact_prefix, io.clone());
    let runner = JobRunner::new(Arc::new(ProcessRunner), results, io);

    let result = runner.run(job, inputs).await?;
    info!(job = %result.kind(), status = %result.status().as_str(), "job completed");
    Ok(())
}

async fn cmd_self_validate(
    inputs: &SelfValidateInputs,
    store: &StoreArgs,
    io: ActionsIo,
) -> Result<()> {
    let results = select_store(store.results_dir.as_deref(), &store.artifact_prefix, io.clone());
    let job = SelfValidateJob::new(results, io, GithubContext::from_env());

    match job.run(inputs).await {
        Ok(result) => {
            info!(actions = %result.actions_found.join(","), "validation passed");
            Ok(())
        }
        Err(e @ CiError::ValidationFailed(_)) => Err(e.into()),
        Err(e) => Err(anyhow::Error::new(e).context("Self-validation could not run")),
    }
}

async fn cmd_comment(
    token: Option<&str>,
    store: &StoreArgs,
    io: ActionsIo,
    context: GithubContext,
) -> Result<()> {
    let results = select_store(store.results_dir.as_deref(), &store.artifact_prefix, io);
    let loaded = results.load_all().await;
    info!(jobs = loaded.len(), "loaded job results");

    // Comment problems never fail the workflow.
    let outcome = match UnifiedCommentPublisher::from_token(context, token) {
        Ok(publisher) => publisher.publish(&loaded).await,
        Err(e) => Outcome::Failed(format!("Failed to create GitHub client: {e}")),
    };
    if let Outcome::Failed(reason) = outcome {
        warn!(reason = %reason, "could not publish PR comment");
        println!("{}", comment_warning(&reason));
    }
    Ok(())
}

fn comment_warning(reason: &str) -> String {
    workflow_command("warning", None, &format!("PR comment not published: {reason}"))
}

fn cmd_validate_project(working_directory: &Path, io: &ActionsIo) -> Result<()> {
    let result = ProjectValidator::new(working_directory)
        .validate()
        .context("Failed to inspect project")?;

    io.annotate(&result);
    io.append_summary(&render_validation_report(&result))?;

    if !result.is_valid {
        anyhow::bail!(
            "Project validation failed with {} error(s)",
            result.error_count()
        );
    }
    info!(warnings = result.warning_count(), "project validation passed");
    Ok(())
}

fn cmd_validate_release(
    working_directory: &Path,
    release_token: Option<&str>,
    io: &ActionsIo,
) -> Result<()> {
    let result = ReleaseValidator::new(working_directory).validate();
    if !result.is_valid {
        io.annotate(&result);
        let instructions = render_release_instructions(&result);
        eprintln!("{instructions}");
        io.append_summary(&format!("```\n{instructions}```"))?;
        anyhow::bail!("Missing required Release Please configuration files");
    }

    require_release_token(release_token)?;
    info!("release configuration found");
    Ok(())
}

fn cmd_release_outputs(release_created: bool, tag_name: &str, io: &ActionsIo) -> Result<()> {
    io.set_output("release_created", &release_created.to_string())?;
    io.set_output("release_tag", tag_name)?;
    if release_created {
        info!(tag = %tag_name, "release created");
    } else {
        info!("no release created");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ci_defaults() {
        let cli = Cli::try_parse_from(["go-actions", "ci", "--job", "test"]).unwrap();
        match cli.command {
            Commands::Ci {
                job,
                test_args,
                benchmark_args,
                store,
                ..
            } => {
                assert_eq!(job, "test");
                assert_eq!(test_args, "-v -race -coverprofile=coverage.out");
                assert_eq!(benchmark_args, "-bench=. -benchmem");
                assert_eq!(store.artifact_prefix, "go-actions-results");
            }
            _ => panic!("Expected ci command"),
        }
    }

    #[test]
    fn test_comment_on_pr_takes_a_value() {
        let cli = Cli::try_parse_from(["go-actions", "self-validate", "--comment-on-pr", "false"])
            .unwrap();
        match cli.command {
            Commands::SelfValidate { comment_on_pr, .. } => assert!(!comment_on_pr),
            _ => panic!("Expected self-validate command"),
        }
    }

    #[test]
    fn test_release_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output");
        let io = ActionsIo::new(Some(output.clone()), None, None);

        cmd_release_outputs(true, "v1.4.0", &io).unwrap();

        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "release_created=true\nrelease_tag=v1.4.0\n"
        );
    }

    #[test]
    fn test_validate_release_requires_files_then_token() {
        let dir = tempfile::tempdir().unwrap();
        let io = ActionsIo::default();
        assert!(cmd_validate_release(dir.path(), Some("t"), &io).is_err());

        std::fs::write(dir.path().join("release-please-config.json"), "{}").unwrap();
        std::fs::write(dir.path().join(".release-please-manifest.json"), "{}").unwrap();
        let err = cmd_validate_release(dir.path(), None, &io).unwrap_err();
        assert!(err.to_string().contains("release-token"));
        assert!(cmd_validate_release(dir.path(), Some("t"), &io).is_ok());
    }

    #[tokio::test]
    async fn test_comment_failures_do_not_fail_the_step() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreArgs {
            results_dir: Some(dir.path().to_path_buf()),
            artifact_prefix: DEFAULT_ARTIFACT_PREFIX.to_string(),
        };
        let results = go_actions_ci::ArtifactResultStore::new(dir.path(), DEFAULT_ARTIFACT_PREFIX);
        go_actions_ci::ResultStore::store(
            &results,
            &go_actions_core::JobResult::Test(go_actions_core::TestResult {
                status: go_actions_core::JobStatus::Success,
                coverage: Some("90.0%".to_string()),
                error: None,
            }),
        )
        .await
        .unwrap();

        // Nothing listens on the discard port, so the API call fails.
        let context = GithubContext {
            event_name: "pull_request".to_string(),
            repository: Some("octo/demo".to_string()),
            api_url: "http://127.0.0.1:9".to_string(),
            pr_number: Some(42),
        };

        let result = cmd_comment(Some("token"), &store, ActionsIo::default(), context).await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_comment_warning() {
        assert_eq!(
            comment_warning("API error 502"),
            "::warning::PR comment not published: API error 502"
        );
    }
}
