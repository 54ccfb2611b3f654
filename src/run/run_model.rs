use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::case::case_model::{ActionKind, SelectorKind};

/// Outcome of one executed step, or the terminal error of an iteration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StepStatus {
    /// Navigation landed on the expected URL, or a success notification appeared
    Success,
    /// Navigation ended somewhere other than the expected URL
    NoAccess,
    /// A non-success notification appeared
    Failed,
    Clicked,
    /// Resolved text that was typed
    Input(String),
    /// Resolved text found in the page
    Asserted(String),
    /// Label of the dropdown option that was clicked
    Selected(String),
    /// No visible dropdown option carried the expected label
    OptionNotFound(String),
    /// The iteration stopped here
    Error(String),
}

impl StepStatus {
    /// Recorded, non-fatal failure.
    pub fn is_soft_failure(&self) -> bool {
        matches!(
            self,
            StepStatus::NoAccess | StepStatus::Failed | StepStatus::OptionNotFound(_)
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StepStatus::Error(_))
    }

    pub fn is_pass(&self) -> bool {
        !self.is_soft_failure() && !self.is_error()
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Success => write!(f, "Success"),
            StepStatus::NoAccess => write!(f, "No Access"),
            StepStatus::Failed => write!(f, "Failed"),
            StepStatus::Clicked => write!(f, "Clicked"),
            StepStatus::Input(value) => write!(f, "Input '{}'", value),
            StepStatus::Asserted(value) => write!(f, "Asserted '{}'", value),
            StepStatus::Selected(label) => write!(f, "Selected '{}'", label),
            StepStatus::OptionNotFound(label) => write!(f, "Dropdown item '{}' not found", label),
            StepStatus::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// One entry of the run log.
///
/// Step records carry the resolved parameters of the step that produced
/// them. A terminal error record has [`StepStatus::Error`] and marks the
/// point where its iteration stopped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepRecord {
    pub case_name: String,

    /// Position of the case in the run's selection; tells apart repeated
    /// selections of the same case
    #[serde(default)]
    pub case_run: usize,

    /// Zero-based iteration within the case's plan
    pub iteration: usize,

    /// Position of the step in the case; for an error record, the step that failed
    pub step_index: Option<usize>,

    pub action: Option<ActionKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector_type: Option<SelectorKind>,

    #[serde(default)]
    pub selector_value: String,

    /// Resolved target URL (visit)
    #[serde(default)]
    pub url: String,

    /// Resolved text (input, assert, select_dropdown)
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub index: usize,

    #[serde(default)]
    pub wait_time: u64,

    /// URL after the step completed
    #[serde(default)]
    pub actual_url: String,

    pub status: StepStatus,

    #[serde(default)]
    pub notifications: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,

    /// Value of the grouping column of the iteration's data row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation: Option<String>,
}

impl StepRecord {
    /// A blank record for a step, filled in by the executor.
    pub fn for_step(
        case_name: &str,
        iteration: usize,
        step_index: usize,
        action: ActionKind,
    ) -> Self {
        Self {
            case_name: case_name.to_string(),
            case_run: 0,
            iteration,
            step_index: Some(step_index),
            action: Some(action),
            selector_type: None,
            selector_value: String::new(),
            url: String::new(),
            text: String::new(),
            index: 0,
            wait_time: 0,
            actual_url: String::new(),
            status: StepStatus::Success,
            notifications: Vec::new(),
            screenshot: None,
            correlation: None,
        }
    }

    /// The single record that ends a failed iteration.
    pub fn terminal_error(
        case_name: &str,
        iteration: usize,
        step_index: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            step_index,
            action: None,
            status: StepStatus::Error(message.into()),
            ..Self::for_step(case_name, iteration, 0, ActionKind::Visit)
        }
    }

    pub fn with_correlation(mut self, correlation: Option<String>) -> Self {
        self.correlation = correlation;
        self
    }

    /// Whether both records come from the same iteration of the same case run.
    pub fn same_iteration(&self, other: &StepRecord) -> bool {
        self.case_run == other.case_run
            && self.iteration == other.iteration
            && self.case_name == other.case_name
    }

    pub fn is_terminal_error(&self) -> bool {
        self.status.is_error()
    }
}

/// Outcome of one iteration, derived from its records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationOutcome {
    pub case_name: String,
    pub case_run: usize,
    pub iteration: usize,
    pub correlation: Option<String>,
    pub steps_run: usize,
    pub soft_failures: usize,
    pub error: Option<String>,
}

impl IterationOutcome {
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.soft_failures == 0
    }

    /// Log records this iteration produced, its error record included.
    pub fn record_count(&self) -> usize {
        self.steps_run + usize::from(self.error.is_some())
    }
}

/// Ordered aggregation of records: case order, then iteration, then step.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RunLog {
    records: Vec<StepRecord>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    pub fn append(&mut self, other: RunLog) {
        self.records.extend(other.records);
    }

    /// Mark every record as belonging to the `case_run`-th selected case.
    pub fn with_case_run(mut self, case_run: usize) -> Self {
        for record in &mut self.records {
            record.case_run = case_run;
        }
        self
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<StepRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records produced by executed steps (terminal errors excluded).
    pub fn step_records(&self) -> impl Iterator<Item = &StepRecord> {
        self.records.iter().filter(|r| !r.is_terminal_error())
    }

    pub fn error_records(&self) -> impl Iterator<Item = &StepRecord> {
        self.records.iter().filter(|r| r.is_terminal_error())
    }

    pub fn screenshot_paths(&self) -> impl Iterator<Item = &Path> {
        self.records.iter().filter_map(|r| r.screenshot.as_deref())
    }

    pub fn has_correlation(&self) -> bool {
        self.records.iter().any(|r| r.correlation.is_some())
    }

    /// Records grouped by correlation value, groups in first-seen order.
    ///
    /// Records without a correlation value are left out.
    pub fn correlation_groups(&self) -> Vec<(&str, Vec<&StepRecord>)> {
        let mut groups: Vec<(&str, Vec<&StepRecord>)> = Vec::new();
        for record in &self.records {
            let Some(key) = record.correlation.as_deref() else {
                continue;
            };
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(record),
                None => groups.push((key, vec![record])),
            }
        }
        groups
    }

    /// One outcome per (case run, iteration), in log order.
    ///
    /// A terminal error record closes its iteration.
    pub fn iterations(&self) -> Vec<IterationOutcome> {
        let mut outcomes: Vec<IterationOutcome> = Vec::new();
        let mut previous: Option<&StepRecord> = None;
        for record in &self.records {
            let same =
                previous.is_some_and(|p| !p.is_terminal_error() && p.same_iteration(record));
            previous = Some(record);
            if !same {
                outcomes.push(IterationOutcome {
                    case_name: record.case_name.clone(),
                    case_run: record.case_run,
                    iteration: record.iteration,
                    correlation: record.correlation.clone(),
                    steps_run: 0,
                    soft_failures: 0,
                    error: None,
                });
            }
            let Some(outcome) = outcomes.last_mut() else {
                continue;
            };
            match &record.status {
                StepStatus::Error(message) => outcome.error = Some(message.clone()),
                status => {
                    outcome.steps_run += 1;
                    if status.is_soft_failure() {
                        outcome.soft_failures += 1;
                    }
                }
            }
        }
        outcomes
    }
}

impl From<Vec<StepRecord>> for RunLog {
    fn from(records: Vec<StepRecord>) -> Self {
        Self { records }
    }
}
