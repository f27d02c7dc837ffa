//! Tabular projection of records for CSV output
//!
//! The header is the union of every field name seen across all records, in
//! first-seen order: records in page order, then array order within a page,
//! then each record's native field order.

use crate::error::{Error, Result};
use crate::types::Record;
use serde_json::Value;
use std::collections::HashSet;

/// Ordered, append-only set of field names
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyUnion {
    keys: Vec<String>,
    seen: HashSet<String>,
}

impl KeyUnion {
    /// Create an empty key union
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the union over `records`, in iteration order
    pub fn from_records<'r>(records: impl IntoIterator<Item = &'r Record>) -> Self {
        let mut union = Self::new();
        for record in records {
            union.observe(record);
        }
        union
    }

    /// Append every field of `record` not seen before
    pub fn observe(&mut self, record: &Record) {
        for key in record.fields().keys() {
            if self.seen.insert(key.clone()) {
                self.keys.push(key.clone());
            }
        }
    }

    /// Field names in first-seen order
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of distinct field names
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no field has been seen
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Text for one CSV cell
///
/// Missing fields and `null` become empty strings, strings are written as-is,
/// other scalars in their JSON spelling, and objects/arrays as compact JSON.
pub fn project_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(nested @ (Value::Object(_) | Value::Array(_))) => nested.to_string(),
    }
}

/// One CSV row for `record`, aligned to `keys`
pub fn project_row(record: &Record, keys: &[String]) -> Vec<String> {
    keys.iter().map(|key| project_cell(record.get(key))).collect()
}

/// Render a header row and one row per record
pub fn render_csv<'r>(
    keys: &KeyUnion,
    records: impl IntoIterator<Item = &'r Record>,
) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(keys.keys())?;
    for record in records {
        writer.write_record(project_row(record, keys.keys()))?;
    }
    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}
