use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use tracing::warn;

use crate::run::run_model::StepRecord;
use crate::trace::trace::TraceEvent;

/// Appends [`TraceEvent`]s to a JSONL file. Write problems are warnings only.
pub struct TraceLogger {
    sink: Option<Mutex<File>>,
}

impl TraceLogger {
    /// Open `path` for appending. If it cannot be opened the logger is disabled.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let sink = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| warn!("Could not open trace file '{}': {}", path.display(), e))
            .ok()
            .map(Mutex::new);
        Self { sink }
    }

    /// A logger that drops every event.
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn log_record(&self, record: &StepRecord) {
        self.log(&TraceEvent::from_record(record));
    }

    pub fn log(&self, event: &TraceEvent) {
        let Some(sink) = &self.sink else {
            return;
        };

        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!("Skipping unserializable trace event: {}", e);
                return;
            }
        };

        match sink.lock() {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", line) {
                    warn!("Trace write failed: {}", e);
                }
            }
            Err(e) => warn!("Trace file lock poisoned: {}", e),
        }
    }
}
