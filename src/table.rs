// src/table.rs

use std::{collections::HashMap, fmt};

/// A single cell. `Null` marks a field the source record did not carry.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

static NULL: Value = Value::Null;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text rendering used by the CSV writer. `Null` and NaN render as an empty field.
    pub fn to_field(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_field())
    }
}

/// Shortest round-trip form, keeping a trailing `.0` on integral values so
/// float columns stay recognisable as floats in the written file.
fn format_float(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else if v.is_infinite() {
        let s = if v > 0.0 { "inf" } else { "-inf" };
        s.to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// One logical entity: ordered field name → value pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`. A repeated field overwrites the earlier value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut rec = Record::new();
        for (k, v) in iter {
            rec.insert(k, v);
        }
        rec
    }
}

/// Row-major table whose column set is the union of every field seen so far.
///
/// Columns keep first-seen order. Rows are stored at the width the table had
/// when they were appended; cells past the end of a row read as `Null`, so
/// adding a column never rewrites existing rows.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero-row table with the given columns.
    pub fn with_columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for name in names {
            table.ensure_column(name.as_ref());
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Position of `name`, adding it as a new trailing column if unseen.
    fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.columns.len();
        self.columns.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    pub fn push_record(&mut self, record: Record) {
        let mut row = vec![Value::Null; self.columns.len()];
        for (name, value) in record.fields {
            let idx = self.ensure_column(&name);
            if idx >= row.len() {
                row.resize(idx + 1, Value::Null);
            }
            row[idx] = value;
        }
        self.rows.push(row);
    }

    /// Append every row of `other` after the existing rows (outer join on columns).
    pub fn append(&mut self, other: Table) {
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|name| self.ensure_column(name))
            .collect();
        let width = self.columns.len();
        self.rows.reserve(other.rows.len());
        for row in other.rows {
            let mut out = vec![Value::Null; width];
            for (src, value) in row.into_iter().enumerate() {
                out[mapping[src]] = value;
            }
            self.rows.push(out);
        }
    }

    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = *self.index.get(name)?;
        self.rows.get(row).map(|r| r.get(idx).unwrap_or(&NULL))
    }

    /// All values of column `name` in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = *self.index.get(name)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.get(idx).unwrap_or(&NULL))
                .collect(),
        )
    }

    /// Replace the values of an existing column. Returns false (and leaves the
    /// table untouched) if the column is unknown or `values` has the wrong length.
    pub fn replace_column(&mut self, name: &str, values: Vec<Value>) -> bool {
        let Some(&idx) = self.index.get(name) else {
            return false;
        };
        if values.len() != self.rows.len() {
            return false;
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            if idx >= row.len() {
                row.resize(idx + 1, Value::Null);
            }
            row[idx] = value;
        }
        true
    }

    /// Rows padded to the full column width.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        let width = self.columns.len();
        self.rows
            .iter()
            .map(move |r| (0..width).map(|i| r.get(i).unwrap_or(&NULL)).collect())
    }
}
