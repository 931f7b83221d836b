//! Markdown rendering for the unified PR comment and the self-validation
//! step summary.

use crate::domain::{
    BenchmarkResult, CiResults, JobKind, JobStatus, LintResult, SelfValidateResult, Severity,
    TestResult, ValidationError, ValidationErrorKind, ValidationResult,
};
use crate::inspector::{RELEASE_PLEASE_CONFIG, RELEASE_PLEASE_MANIFEST};
use crate::release_please::{CONFIG_TEMPLATE, MANIFEST_TEMPLATE};
use crate::version::DEFAULT_GOLANGCI_LINT_VERSION;

/// Hidden marker identifying the unified comment among a PR's comments.
pub const COMMENT_MARKER: &str = "<!-- go-actions:unified-comment -->";

/// Visible heading of the unified comment.
pub const COMMENT_HEADER: &str = "## 🚀 Go Actions CI Results";

/// Lint output beyond this many characters is cut from the comment.
pub const MAX_LINT_ISSUES_CHARS: usize = 3000;

const FOOTER: &str = "*Generated by [go-actions](https://github.com/jrschumacher/go-actions)*";
const DOCS_URL: &str = "https://github.com/jrschumacher/go-actions#readme";

/// Whether a comment body was produced by [`render_unified_comment`].
///
/// Older comments carry only the heading, so either is accepted.
pub fn is_unified_comment(body: &str) -> bool {
    body.contains(COMMENT_MARKER) || body.contains(COMMENT_HEADER)
}

/// `failure` if any reported job failed, otherwise `success`.
pub fn overall_status(results: &CiResults) -> JobStatus {
    let failed = results
        .reported()
        .into_iter()
        .any(|kind| results.status_of(kind) == Some(JobStatus::Failure));
    JobStatus::from_success(!failed)
}

fn status_icon(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Success => "✅",
        JobStatus::Failure => "❌",
        JobStatus::Skipped => "⏭️",
    }
}

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "❌",
        Severity::Warning => "⚠️",
    }
}

/// Render the unified comment body for the collected results.
pub fn render_unified_comment(results: &CiResults) -> String {
    let reported = results.reported();
    if reported.is_empty() {
        return render_pending_comment();
    }

    let overall = overall_status(results);
    let mut md = format!("{COMMENT_MARKER}\n{COMMENT_HEADER}\n\n");
    md.push_str(&format!(
        "**Overall Status:** {} {}\n\n",
        status_icon(overall),
        overall.as_str().to_uppercase()
    ));

    md.push_str("| Job | Status | Details |\n");
    md.push_str("|-----|--------|---------|\n");
    for kind in &reported {
        let Some(status) = results.status_of(*kind) else {
            continue;
        };
        let detail = summary_detail(results, *kind);
        let detail = if detail.is_empty() {
            String::new()
        } else {
            format!("{detail} ")
        };
        md.push_str(&format!(
            "| {} | {} {} | {}|\n",
            kind.label(),
            status_icon(status),
            status.as_str(),
            detail
        ));
    }
    md.push('\n');

    for kind in &reported {
        match kind {
            JobKind::Test => {
                if let Some(r) = &results.test {
                    render_test_section(&mut md, r);
                }
            }
            JobKind::Lint => {
                if let Some(r) = &results.lint {
                    render_lint_section(&mut md, r);
                }
            }
            JobKind::Benchmark => {
                if let Some(r) = &results.benchmark {
                    render_benchmark_section(&mut md, r);
                }
            }
            JobKind::SelfValidate => {
                if let Some(r) = &results.self_validate {
                    render_validation_section(&mut md, r);
                }
            }
        }
    }

    md.push_str("---\n");
    md.push_str(FOOTER);
    md
}

/// Placeholder body shown before any job reports.
pub fn render_pending_comment() -> String {
    format!(
        "{COMMENT_MARKER}\n{COMMENT_HEADER}\n\n⏳ No CI jobs have run yet. Results will appear here as jobs complete.\n\n---\n{FOOTER}"
    )
}

fn summary_detail(results: &CiResults, kind: JobKind) -> String {
    match kind {
        JobKind::Test => results
            .test
            .as_ref()
            .and_then(|r| r.coverage.as_deref())
            .map(|c| format!("Coverage: {c}"))
            .unwrap_or_default(),
        JobKind::Lint => results
            .lint
            .as_ref()
            .and_then(|r| r.version.as_deref())
            .map(|v| format!("golangci-lint {v}"))
            .unwrap_or_default(),
        JobKind::Benchmark => results
            .benchmark
            .as_ref()
            .and_then(|r| r.config.as_ref())
            .map(|c| format!("{} run(s)", c.count))
            .unwrap_or_default(),
        JobKind::SelfValidate => results
            .self_validate
            .as_ref()
            .map(|r| {
                let issues = r.errors.len();
                if issues > 0 {
                    format!("{issues} issue(s)")
                } else if r.actions_found.is_empty() {
                    "No actions detected".to_string()
                } else {
                    format!("Actions: {}", r.actions_found.join(", "))
                }
            })
            .unwrap_or_default(),
    }
}

/// Numeric percentage from strings like `"85.7%"`.
fn parse_percent(coverage: &str) -> Option<f64> {
    coverage.trim().trim_end_matches('%').trim().parse().ok()
}

fn coverage_comment(percent: f64) -> &'static str {
    if percent >= 80.0 {
        "🎉 Excellent test coverage!"
    } else if percent >= 60.0 {
        "👍 Good coverage, consider adding more tests."
    } else {
        "⚠️ Low test coverage detected. Please add more tests."
    }
}

fn render_test_section(md: &mut String, r: &TestResult) {
    md.push_str(&format!("### 🧪 Tests {}\n\n", status_icon(r.status)));
    md.push_str("<details><summary>Test details</summary>\n\n");
    match r.coverage.as_deref() {
        Some(coverage) => {
            md.push_str(&format!("**Coverage:** {coverage}\n\n"));
            if let Some(percent) = parse_percent(coverage) {
                md.push_str(coverage_comment(percent));
                md.push_str("\n\n");
            }
        }
        None => md.push_str("No coverage data was reported.\n\n"),
    }
    if let Some(err) = &r.error {
        md.push_str(&format!("**Error:** {err}\n\n"));
    }
    md.push_str("</details>\n\n");
}

/// Cut `issues` to the character budget on a char boundary.
fn truncate_issues(issues: &str) -> (&str, bool) {
    match issues.char_indices().nth(MAX_LINT_ISSUES_CHARS) {
        Some((idx, _)) => (&issues[..idx], true),
        None => (issues, false),
    }
}

fn render_lint_section(md: &mut String, r: &LintResult) {
    md.push_str(&format!("### 🧹 Lint {}\n\n", status_icon(r.status)));
    md.push_str("<details><summary>Lint details</summary>\n\n");
    if let Some(version) = &r.version {
        md.push_str(&format!("**golangci-lint version:** {version}\n\n"));
    }
    match r.issues.as_deref().map(str::trim).filter(|i| !i.is_empty()) {
        Some(issues) => {
            let (shown, truncated) = truncate_issues(issues);
            md.push_str("```\n");
            md.push_str(shown);
            md.push_str("\n```\n\n");
            if truncated {
                md.push_str(&format!(
                    "_Output truncated to {MAX_LINT_ISSUES_CHARS} characters. See the job logs for the full report._\n\n"
                ));
            }
        }
        None if r.status == JobStatus::Success => md.push_str("No lint issues found.\n\n"),
        None => {}
    }
    if let Some(err) = &r.error {
        md.push_str(&format!("**Error:** {err}\n\n"));
    }
    md.push_str("</details>\n\n");
}

fn render_benchmark_section(md: &mut String, r: &BenchmarkResult) {
    md.push_str(&format!("### ⚡ Benchmarks {}\n\n", status_icon(r.status)));
    md.push_str("<details><summary>Benchmark details</summary>\n\n");
    if let Some(config) = &r.config {
        md.push_str(&format!("**Arguments:** `{}`\n\n", config.args));
        md.push_str(&format!("**Runs:** {}\n\n", config.count));
    }
    if let Some(err) = &r.error {
        md.push_str(&format!("**Error:** {err}\n\n"));
    }
    md.push_str("</details>\n\n");
}

fn render_validation_section(md: &mut String, r: &SelfValidateResult) {
    md.push_str(&format!(
        "### 🔍 Configuration Validation {}\n\n",
        status_icon(r.status)
    ));
    md.push_str("<details><summary>Validation details</summary>\n\n");
    if r.actions_found.is_empty() {
        md.push_str("**Actions detected:** none\n\n");
    } else {
        md.push_str(&format!(
            "**Actions detected:** {}\n\n",
            r.actions_found.join(", ")
        ));
    }
    if r.errors.is_empty() {
        md.push_str("All configuration checks passed.\n\n");
    } else {
        for err in &r.errors {
            md.push_str(&format!("- {} {}\n", severity_icon(err.severity), err.message));
        }
        md.push('\n');
    }
    md.push_str("</details>\n\n");
}

// ── self-validation step summary ──────────────────────────────────────────

fn is_goreleaser_missing(e: &ValidationError) -> bool {
    e.kind == ValidationErrorKind::MissingFile
        && e.file.as_deref().is_some_and(|f| f.contains("goreleaser"))
}

fn is_release_please_missing(e: &ValidationError) -> bool {
    e.kind == ValidationErrorKind::MissingFile
        && e.file.as_deref().is_some_and(|f| f.contains("release-please"))
}

fn is_release_please_issue(e: &ValidationError) -> bool {
    matches!(
        e.kind,
        ValidationErrorKind::ReleasePleaseConfig
            | ValidationErrorKind::FormatError
            | ValidationErrorKind::InvalidJson
            | ValidationErrorKind::FilenameError
    )
}

/// Render the standalone validation report written to the step summary.
pub fn render_validation_report(result: &ValidationResult) -> String {
    let errors = &result.errors;
    let has_errors = !result.is_valid;
    let mut md = String::from("# Go Actions Report\n\n");

    if has_errors {
        md.push_str("❌ **Validation Failed**\n\n");
        md.push_str("<details open><summary>Validation Issues</summary>\n\n");
        render_issue_groups(&mut md, errors);
    } else {
        md.push_str("✅ **Validated**\n\n");
    }

    let passing = passing_checks(result);
    if !passing.is_empty() {
        md.push_str("### ✅ Passing Checks\n\n");
        for check in passing {
            md.push_str(&format!("- {check}\n"));
        }
        md.push('\n');
    }

    if has_errors {
        md.push_str("\n### 📝 Configuration Templates\n\n");
        md.push_str(&configuration_templates(errors));

        md.push_str("### 🚀 Next Steps\n\n");
        md.push_str("1. Apply the fixes shown above\n");
        md.push_str("2. Push your changes to trigger re-validation\n");
        md.push_str("3. Once all checks pass, your go-actions workflows will run smoothly\n");
        md.push_str(&format!(
            "4. Need help? Check the [go-actions documentation]({DOCS_URL})\n\n"
        ));
        md.push_str("</details>\n\n");
    } else {
        md.push_str("<details><summary>Validation Details</summary>\n\n");
        md.push_str(&format!(
            "**Actions configured:** {}\n\n",
            result.actions_found.join(", ")
        ));
        if result.warning_count() > 0 {
            md.push_str("**Warnings:**\n");
            for warning in errors.iter().filter(|e| !e.is_error()) {
                md.push_str(&format!("- ⚠️ {}\n", warning.message));
            }
            md.push('\n');
        }
        md.push_str("**Checks passed:**\n");
        md.push_str("- Configuration files present\n");
        md.push_str("- Version compatibility verified\n");
        md.push_str("- Workflow syntax valid\n\n");
        md.push_str("</details>\n\n");
    }

    md.push_str("*🤖 This report updates automatically as you push changes.*\n");
    md.push_str(FOOTER);
    md
}

fn render_issue_groups(md: &mut String, errors: &[ValidationError]) {
    let mut n = 1;

    let go_mod_missing = errors
        .iter()
        .any(|e| e.kind == ValidationErrorKind::MissingFile && e.file.as_deref() == Some("go.mod"));
    if go_mod_missing {
        md.push_str(&format!("{n}. **Go Module** - `go.mod` not found\n"));
        md.push_str("   - 🔧 Fix: Run `go mod init <module-path>` in the working directory\n\n");
        n += 1;
    }

    let goreleaser: Vec<&ValidationError> = errors
        .iter()
        .filter(|e| e.kind == ValidationErrorKind::GoreleaserConfig)
        .collect();
    if errors.iter().any(is_goreleaser_missing) || !goreleaser.is_empty() {
        md.push_str(&format!("{n}. **GoReleaser Config** - Configuration issues detected\n"));
        if errors.iter().any(is_goreleaser_missing) {
            md.push_str("   - 📁 Expected: `.goreleaser.yaml`\n");
            md.push_str("   - 🔧 Fix: Run `goreleaser init` to create initial config\n");
        }
        for e in goreleaser {
            md.push_str(&format!("   - {} {}\n", severity_icon(e.severity), e.message));
        }
        md.push_str("   - 📖 [GoReleaser Documentation](https://goreleaser.com/quick-start/)\n\n");
        n += 1;
    }

    let release_please: Vec<&ValidationError> =
        errors.iter().filter(|e| is_release_please_issue(e)).collect();
    if errors.iter().any(is_release_please_missing) || !release_please.is_empty() {
        md.push_str(&format!("{n}. **Release Please Config** - Configuration issues detected\n"));
        if errors.iter().any(is_release_please_missing) {
            md.push_str(&format!(
                "   - 📁 Expected: `{RELEASE_PLEASE_CONFIG}` and `{RELEASE_PLEASE_MANIFEST}`\n"
            ));
        }
        for e in release_please {
            md.push_str(&format!("   - {} {}\n", severity_icon(e.severity), e.message));
        }
        md.push_str("   - 🔧 Quick fix: Create config files with templates below\n");
        md.push_str("   - 📖 [Release Please Documentation](https://github.com/googleapis/release-please)\n\n");
        n += 1;
    }

    for e in errors
        .iter()
        .filter(|e| e.kind == ValidationErrorKind::IncompatibleVersions)
    {
        md.push_str(&format!("{n}. **golangci-lint Version** - Upgrade needed for compatibility\n"));
        md.push_str(&format!(
            "   - ❌ Current: {}\n",
            e.actual.as_deref().unwrap_or("unknown")
        ));
        md.push_str("   - ✅ Required: v2.0.0 or higher\n");
        md.push_str(&format!("   - ℹ️ {}\n", e.message));
        md.push_str("   - 🔧 Simple fix: Update version in your workflow (see template below)\n\n");
        n += 1;
    }

    for e in errors
        .iter()
        .filter(|e| e.kind == ValidationErrorKind::VersionMismatch)
    {
        md.push_str(&format!("{n}. **Version Mismatch** - Configuration file version mismatch\n"));
        md.push_str(&format!(
            "   - 📁 File: {}\n",
            e.file.as_deref().unwrap_or("unknown")
        ));
        md.push_str(&format!(
            "   - 🔧 Quick fix: Update version to {}\n\n",
            e.expected.as_deref().unwrap_or("the workflow's major version")
        ));
        n += 1;
    }
}

fn passing_checks(result: &ValidationResult) -> Vec<&'static str> {
    let errors = &result.errors;
    let mut checks = Vec::new();

    if !errors
        .iter()
        .any(|e| e.kind == ValidationErrorKind::MissingFile && e.file.as_deref() == Some("go.mod"))
    {
        checks.push("go.mod format");
    }
    if !result.actions_found.is_empty() {
        checks.push("CI workflow syntax");
    }
    if !errors
        .iter()
        .any(|e| e.kind == ValidationErrorKind::IncompatibleVersions)
    {
        checks.push("golangci-lint configuration");
    }
    if !errors.iter().any(is_release_please_missing) {
        checks.push("Release Please configuration");
    }
    if !errors.iter().any(is_goreleaser_missing) {
        checks.push("GoReleaser configuration");
    }
    checks
}

fn configuration_templates(errors: &[ValidationError]) -> String {
    let mut md = String::new();

    if errors.iter().any(is_release_please_missing) {
        md.push_str(&format!(
            "**`{RELEASE_PLEASE_CONFIG}`:**\n```json\n{CONFIG_TEMPLATE}\n```\n\n"
        ));
        md.push_str(&format!(
            "**`{RELEASE_PLEASE_MANIFEST}`:**\n```json\n{MANIFEST_TEMPLATE}\n```\n\n"
        ));
    }

    if errors.iter().any(is_goreleaser_missing) {
        md.push_str("**`.goreleaser.yaml`:**\n```bash\n# Initialize with: goreleaser init\ngoreleaser init\n```\n\n");
    }

    // One upgrade template is enough however many workflows pin v1.
    if let Some(e) = errors
        .iter()
        .find(|e| e.kind == ValidationErrorKind::IncompatibleVersions)
    {
        md.push_str("**Update your CI workflow to use golangci-lint v2:**\n```yaml\n");
        md.push_str("# In your .github/workflows/ci.yaml\n");
        md.push_str("- uses: jrschumacher/go-actions/ci@v1\n");
        md.push_str("  with:\n");
        md.push_str("    job: lint\n");
        md.push_str(&format!(
            "    golangci-lint-version: {DEFAULT_GOLANGCI_LINT_VERSION}  # Updated from {}\n",
            e.actual.as_deref().unwrap_or("v1")
        ));
        md.push_str("```\n\n");
        md.push_str("**Optional: Create `.golangci.yaml` for custom configuration:**\n```yaml\n");
        md.push_str("version: \"2\"\n\nlinters:\n  enable:\n    - govet\n    - errcheck\n    - staticcheck\n    - ineffassign\n    - misspell\n");
        md.push_str("```\n\n");
    }

    md
}
