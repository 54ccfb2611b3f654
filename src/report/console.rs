use crate::report::report_model::RunSummary;
use crate::run::run_model::{RunLog, StepRecord, StepStatus};

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a run for terminal output.
///
/// Produces output like:
/// ```text
/// === Run: login ===
///
/// ✓ PASS  login #0 [alice@example.com] (4 steps)
///     [0] visit https://x/login -> Success
///     ...
/// ✗ FAIL  login #1 (1 step)
///     [0] visit https://x/login -> No Access
///     [ERROR] Step 1 (input) failed after phase 'pending': ...
///
/// === Results: 1 passed, 1 failed (2 iterations, 5 steps) ===
/// ```
pub fn format_console_report(summary: &RunSummary, log: &RunLog) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Run: {} ===\n\n", summary.title));

    let mut records = log.records().iter();
    for outcome in &summary.iterations {
        let marker = if outcome.passed() {
            "\u{2713} PASS"
        } else {
            "\u{2717} FAIL"
        };
        let group = outcome
            .correlation
            .as_deref()
            .map(|c| format!(" [{}]", c))
            .unwrap_or_default();

        out.push_str(&format!(
            "{}  {} #{}{} ({})\n",
            marker,
            outcome.case_name,
            outcome.iteration,
            group,
            counted(outcome.steps_run, "step")
        ));

        for record in records.by_ref().take(outcome.record_count()) {
            out.push_str(&format_record_line(record));
        }
    }

    out.push_str(&format!(
        "\n=== Results: {} passed, {} failed ({}, {})",
        summary.passed,
        summary.failed,
        counted(summary.total, "iteration"),
        counted(summary.steps, "step")
    ));

    if let Some(ms) = summary.duration_ms {
        let secs = ms as f64 / 1000.0;
        out.push_str(&format!(" in {:.1}s", secs));
    }

    out.push_str(" ===\n");

    out
}

/// `1 step`, `3 steps`
fn counted(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

fn format_record_line(record: &StepRecord) -> String {
    if let StepStatus::Error(message) = &record.status {
        return format!("    [ERROR] {}\n", message);
    }

    let target = if !record.url.is_empty() {
        record.url.clone()
    } else {
        match record.selector_type {
            Some(kind) => format!("{}={}", kind, record.selector_value),
            None => format!("'{}'", record.text),
        }
    };
    let action = record.action.map(|a| a.as_str()).unwrap_or("?");
    let step = record
        .step_index
        .map(|i| i.to_string())
        .unwrap_or_else(|| "-".into());

    let mut line = format!("    [{}] {} {} -> {}\n", step, action, target, record.status);
    for note in &record.notifications {
        line.push_str(&format!("          ! {}\n", note));
    }
    line
}
