//! Reading cleaned records from disk
//!
//! Accepts either a single JSON array or JSON lines (one object per line).

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub fn read_json_records<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    parse_json_records(&text).map_err(|e| match e {
        Error::Serialization(msg) => Error::Serialization(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

pub fn parse_json_records<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let mut records = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line)
            .map_err(|e| Error::Serialization(format!("line {}: {}", line_no + 1, e)))?;
        records.push(record);
    }
    Ok(records)
}
