use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::case::case_model::TestCase;
use crate::data::placeholder::placeholders;
use crate::error::{ReplayError, Result};

/// One record of an uploaded table: field name to optional scalar.
///
/// A `None` value is a missing cell (see [`MISSING_MARKERS`]) or JSON `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataRow {
    values: HashMap<String, Option<String>>,
}

impl DataRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), normalize_cell(v.into())))
            .collect();
        Self { values }
    }

    pub fn with(mut self, field: impl Into<String>, value: Option<&str>) -> Self {
        self.insert(field, value.map(str::to_string));
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Option<String>) {
        self.values.insert(field.into(), value.and_then(normalize_cell));
    }

    /// Present, non-null value of a field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(|v| v.as_deref())
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A rectangular table used as an iteration source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<DataRow>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Placeholder fields used by `case` that no column provides, each once.
    pub fn unknown_fields<'a>(&self, case: &'a TestCase) -> Vec<&'a str> {
        let mut unknown: Vec<&str> = Vec::new();
        for step in &case.steps {
            for field in step.action.templates().into_iter().flat_map(placeholders) {
                if !self.columns.iter().any(|c| c == field) && !unknown.contains(&field) {
                    unknown.push(field);
                }
            }
        }
        unknown
    }

    /// Load by file extension: `.json` as an array of objects, anything else as CSV.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let dataset = if is_json {
            let content = std::fs::read_to_string(path)?;
            Self::from_json_str(&content)?
        } else {
            Self::from_csv_reader(std::fs::File::open(path)?)?
        };
        debug!(
            "Loaded dataset {} ({} rows, {} columns)",
            path.display(),
            dataset.rows.len(),
            dataset.columns.len()
        );
        Ok(dataset)
    }

    /// Parse CSV with a header row. A UTF-8 BOM on the first header is dropped.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let columns: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let mut row = DataRow::new();
            for (column, cell) in columns.iter().zip(record.iter()) {
                row.insert(column.clone(), Some(cell.to_string()));
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Parse a JSON array of flat objects. Nested values are stringified as JSON.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        let records = value
            .as_array()
            .ok_or_else(|| ReplayError::dataset("JSON dataset must be an array of objects"))?;

        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let object = record
                .as_object()
                .ok_or_else(|| ReplayError::dataset(format!("row {} is not an object", i)))?;
            let mut row = DataRow::new();
            for (key, cell) in object {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
                row.insert(key.clone(), scalar_to_string(cell));
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Cell spellings read as a missing value, matched exactly.
pub const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn normalize_cell(cell: String) -> Option<String> {
    if MISSING_MARKERS.contains(&cell.as_str()) || cell.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(cell)
    }
}
