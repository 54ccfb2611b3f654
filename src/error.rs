use thiserror::Error;

use crate::case::case_model::SelectorKind;

/// Main error type for replay-runner.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Locator found zero matches, or fewer matches than the requested index.
    #[error("No element found at index {index} for {kind}: {value}")]
    ElementNotFound {
        kind: SelectorKind,
        value: String,
        index: usize,
    },

    /// Expected text was not a substring of the rendered page.
    #[error("Assertion failed: '{expected}' not found in page content")]
    AssertionFailed { expected: String },

    /// The driver answered a command with ok=false.
    #[error("Driver command '{command}' failed: {message}")]
    Driver { command: String, message: String },

    /// The driver process stopped answering or its pipes broke.
    #[error("Browser session I/O error: {0}")]
    SessionIo(String),

    #[error("Failed to spawn {script} (is Node.js installed?): {source}")]
    Spawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// Storage left over from an earlier iteration was visible in a fresh session.
    #[error("Browser session is not isolated: {0}")]
    SessionNotIsolated(String),

    #[error("Test case '{0}' already exists")]
    DuplicateCase(String),

    #[error("Test case '{0}' not found")]
    CaseNotFound(String),

    #[error("Step index {index} out of range (case has {len} steps)")]
    StepOutOfRange { index: usize, len: usize },

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T> = std::result::Result<T, ReplayError>;

impl ReplayError {
    pub fn driver(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Driver {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn session_io(msg: impl Into<String>) -> Self {
        Self::SessionIo(msg.into())
    }

    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }
}
