use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::run::run_model::StepRecord;

/// One JSONL line of the run trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,

    pub case_name: String,
    pub iteration: usize,
    pub step: Option<usize>,

    pub action: Option<String>,
    pub status: String,

    pub notifications: Vec<String>,
    pub correlation: Option<String>,
}

impl TraceEvent {
    pub fn now(case_name: &str, iteration: usize, step: Option<usize>) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            case_name: case_name.to_string(),
            iteration,
            step,
            action: None,
            status: String::new(),
            notifications: vec![],
            correlation: None,
        }
    }

    pub fn with_action(mut self, action: impl ToString) -> Self {
        self.action = Some(action.to_string());
        self
    }

    pub fn with_status(mut self, status: impl ToString) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn with_notifications(mut self, notifications: &[String]) -> Self {
        self.notifications = notifications.to_vec();
        self
    }

    pub fn with_correlation(mut self, correlation: Option<&str>) -> Self {
        self.correlation = correlation.map(str::to_string);
        self
    }

    pub fn from_record(record: &StepRecord) -> Self {
        let event = Self::now(&record.case_name, record.iteration, record.step_index)
            .with_status(&record.status)
            .with_notifications(&record.notifications)
            .with_correlation(record.correlation.as_deref());
        match record.action {
            Some(action) => event.with_action(action),
            None => event,
        }
    }
}
