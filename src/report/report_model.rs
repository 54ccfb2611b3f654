use crate::run::run_model::{IterationOutcome, RunLog};

// ============================================================================
// Run summary: per-iteration pass/fail derived from a RunLog
// ============================================================================

/// Aggregated counts for a run.
///
/// Built from a [`RunLog`] via `from_log()`. Consumed by the console reporter
/// and by the CLI exit status.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Name shown in report headers
    pub title: String,

    /// Number of iterations across all cases
    pub total: usize,

    /// Iterations with no error record and no soft failure
    pub passed: usize,

    pub failed: usize,

    /// Executed step records (terminal errors excluded)
    pub steps: usize,

    pub soft_failures: usize,

    /// Iterations that ended in a terminal error
    pub errors: usize,

    /// Total execution duration in milliseconds (optional)
    pub duration_ms: Option<u128>,

    pub iterations: Vec<IterationOutcome>,
}

impl RunSummary {
    pub fn from_log(title: &str, log: &RunLog) -> Self {
        let iterations = log.iterations();
        let total = iterations.len();
        let passed = iterations.iter().filter(|o| o.passed()).count();
        Self {
            title: title.to_string(),
            total,
            passed,
            failed: total - passed,
            steps: iterations.iter().map(|o| o.steps_run).sum(),
            soft_failures: iterations.iter().map(|o| o.soft_failures).sum(),
            errors: iterations.iter().filter(|o| o.error.is_some()).count(),
            duration_ms: None,
            iterations,
        }
    }

    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
