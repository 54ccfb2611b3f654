use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::run::run_model::{RunLog, StepRecord};

/// Column header used for the correlation value when no name is given.
pub const DEFAULT_CORRELATION_HEADER: &str = "correlation";

/// Log columns after the optional leading correlation column.
pub const COLUMNS: [&str; 13] = [
    "case",
    "iteration",
    "step",
    "action",
    "selector_type",
    "selector_value",
    "url",
    "text",
    "index",
    "wait_time",
    "actual_url",
    "status",
    "notifications",
];

pub const SCREENSHOT_COLUMN: &str = "screenshot";

/// Header row: correlation first (when any record has one), then [`COLUMNS`], then screenshot.
pub fn header(log: &RunLog, correlation_header: &str) -> Vec<String> {
    let mut header = Vec::with_capacity(COLUMNS.len() + 2);
    if log.has_correlation() {
        header.push(correlation_header.to_string());
    }
    header.extend(COLUMNS.iter().map(|c| c.to_string()));
    header.push(SCREENSHOT_COLUMN.to_string());
    header
}

/// Cells of one record, aligned with [`header`].
pub fn row(record: &StepRecord, with_correlation: bool) -> Vec<String> {
    let mut cells = Vec::with_capacity(COLUMNS.len() + 2);
    if with_correlation {
        cells.push(record.correlation.clone().unwrap_or_default());
    }
    cells.push(record.case_name.clone());
    cells.push(record.iteration.to_string());
    cells.push(record.step_index.map(|i| i.to_string()).unwrap_or_default());
    cells.push(record.action.map(|a| a.to_string()).unwrap_or_default());
    cells.push(record.selector_type.map(|k| k.to_string()).unwrap_or_default());
    cells.push(record.selector_value.clone());
    cells.push(record.url.clone());
    cells.push(record.text.clone());
    cells.push(record.index.to_string());
    cells.push(record.wait_time.to_string());
    cells.push(record.actual_url.clone());
    cells.push(record.status.to_string());
    cells.push(record.notifications.join("; "));
    cells.push(
        record
            .screenshot
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
    );
    cells
}

/// Write the log as a flat delimited table.
pub fn write_csv<W: Write>(log: &RunLog, correlation_header: &str, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let with_correlation = log.has_correlation();
    wtr.write_record(header(log, correlation_header))?;
    for record in log.records() {
        wtr.write_record(row(record, with_correlation))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the CSV to `path` with a UTF-8 BOM so spreadsheet tools pick the right encoding.
pub fn export_csv(log: &RunLog, correlation_header: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all("\u{feff}".as_bytes())?;
    write_csv(log, correlation_header, file)
}
