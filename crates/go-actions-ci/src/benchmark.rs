//! Repeated benchmark runs.

use tracing::{info, warn};

use crate::runner::{CommandRunner, StageResult};
use crate::stage::StageConfig;

/// Outcome of a benchmark series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkRun {
    /// Iterations started, including a failing one.
    pub iterations: u32,

    /// Error of the iteration that stopped the series.
    pub error: Option<String>,

    /// Result of the last iteration that ran.
    pub last: Option<StageResult>,
}

impl BenchmarkRun {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Run `stage` up to `count` times, stopping at the first failure.
pub async fn run_benchmarks(
    runner: &dyn CommandRunner,
    stage: &StageConfig,
    count: u32,
) -> BenchmarkRun {
    let mut run = BenchmarkRun {
        iterations: 0,
        error: None,
        last: None,
    };

    for i in 1..=count {
        run.iterations = i;
        info!(run = i, count = count, "benchmark run");

        match runner.run(stage).await {
            Ok(result) if result.passed() => run.last = Some(result),
            Ok(result) => {
                warn!(run = i, exit_code = result.exit_code, "benchmark run failed");
                run.error = Some(format!(
                    "Benchmark run {i}/{count} failed: {}",
                    result.failure_message()
                ));
                run.last = Some(result);
                return run;
            }
            Err(e) => {
                warn!(run = i, error = %e, "benchmark run could not start");
                run.error = Some(format!("Benchmark run {i}/{count} failed: {e}"));
                return run;
            }
        }
    }

    info!(count = count, "all benchmark runs completed");
    run
}
