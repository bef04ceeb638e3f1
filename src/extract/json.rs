// src/extract/json.rs

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::table::{Record, Table, Value};

/// Read newline-delimited JSON: one object per non-blank line, one row per object.
pub fn read_json_lines(path: &Path) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("opening {:?}", path))?;
    parse_json_lines(BufReader::new(file))
}

pub(crate) fn parse_json_lines<R: BufRead>(reader: R) -> Result<Table> {
    let mut table = Table::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: JsonValue = serde_json::from_str(&line)
            .with_context(|| format!("parsing JSON on line {}", idx + 1))?;
        let obj = parsed
            .as_object()
            .with_context(|| format!("line {} is not a JSON object", idx + 1))?;

        let record: Record = obj
            .iter()
            .map(|(key, val)| (key.as_str(), json_to_value(val)))
            .collect();
        table.push_record(record);
    }

    Ok(table)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        JsonValue::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}
