//! CSV rendering of flattened rows.
//!
//! Thin wrapper over the `csv` crate. The contract that matters: the header
//! matches the mapping table's columns verbatim and in order, every data row
//! follows that same column order, and standard double-quote escaping applies.
//! Zero rows is not an error; the payload is then header-only.

use csv::Writer;

use crate::flatten::FlatRow;

#[derive(Debug)]
pub enum SerializeError {
    Csv(csv::Error),
    Buffer(String),
}

impl From<csv::Error> for SerializeError {
    fn from(e: csv::Error) -> Self {
        SerializeError::Csv(e)
    }
}

impl std::fmt::Display for SerializeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializeError::Csv(e) => write!(f, "csv write failed: {e}"),
            SerializeError::Buffer(msg) => write!(f, "csv buffer failed: {msg}"),
        }
    }
}

impl std::error::Error for SerializeError {}

/// Render rows into a CSV text payload with the given header columns.
pub fn to_csv(rows: &[FlatRow], columns: &[&str]) -> Result<String, SerializeError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(&row.values)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| SerializeError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| SerializeError::Buffer(e.to_string()))
}
