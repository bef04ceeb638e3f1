// src/extract/csv.rs

use ::csv::ReaderBuilder;
use anyhow::{bail, Context, Result};
use std::{collections::HashMap, fs::File, io::Read, path::Path};

use crate::table::{Record, Table, Value};

/// Cell strings treated as missing.
const NA_MARKERS: &[&str] = &[
    "", "NA", "N/A", "NaN", "nan", "NULL", "null", "None", "#N/A", "<NA>",
];

/// Column type decided from every non-missing cell of the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

/// Read a headered CSV file into a table.
pub fn read_csv(path: &Path) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("opening {:?}", path))?;
    parse_csv(file)
}

pub(crate) fn parse_csv<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let raw_headers = rdr.headers().context("reading CSV header")?.clone();
    if raw_headers.is_empty() {
        bail!("no columns to parse from file");
    }
    let headers = dedupe_headers(raw_headers.iter());

    // 1) collect raw cells, missing markers become None
    let mut cells: Vec<Vec<Option<String>>> = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx + 1))?;
        if record.len() > headers.len() {
            bail!(
                "expected {} fields in line {}, saw {}",
                headers.len(),
                idx + 2,
                record.len()
            );
        }
        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|s| (!NA_MARKERS.contains(&s)).then(|| s.to_string()))
            .collect();
        row.resize(headers.len(), None);
        cells.push(row);
    }

    // 2) one kind per column
    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|c| infer_kind(cells.iter().filter_map(|row| row[c].as_deref())))
        .collect();

    // 3) typed rows
    let mut table = Table::new();
    for row in cells {
        let record: Record = headers
            .iter()
            .zip(kinds.iter())
            .zip(row)
            .map(|((name, kind), cell)| (name.as_str(), convert(cell, *kind)))
            .collect();
        table.push_record(record);
    }
    // a header-only file still defines its columns
    if table.is_empty() {
        return Ok(Table::with_columns(headers));
    }
    Ok(table)
}

/// `a, a, b` → `a, a.1, b`
fn dedupe_headers<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .map(|name| {
            let count = seen.entry(name.to_string()).or_insert(0);
            let out = if *count == 0 {
                name.to_string()
            } else {
                format!("{}.{}", name, count)
            };
            *count += 1;
            out
        })
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn infer_kind<'a>(values: impl Iterator<Item = &'a str> + Clone) -> ColumnKind {
    if values.clone().all(|v| v.trim().parse::<i64>().is_ok()) {
        ColumnKind::Int
    } else if values.clone().all(|v| v.trim().parse::<f64>().is_ok()) {
        ColumnKind::Float
    } else if values.clone().all(|v| parse_bool(v).is_some()) {
        ColumnKind::Bool
    } else {
        ColumnKind::Text
    }
}

fn convert(cell: Option<String>, kind: ColumnKind) -> Value {
    let Some(s) = cell else {
        return Value::Null;
    };
    let parsed = match kind {
        ColumnKind::Int => s.trim().parse().ok().map(Value::Int),
        ColumnKind::Float => s.trim().parse().ok().map(Value::Float),
        ColumnKind::Bool => parse_bool(&s).map(Value::Bool),
        ColumnKind::Text => None,
    };
    parsed.unwrap_or(Value::Text(s))
}
