// src/transform.rs

use thiserror::Error;
use tracing::{debug, instrument};

use crate::table::{Table, Value};

pub const INCHES_TO_METERS: f64 = 0.0254;
pub const POUNDS_TO_KILOGRAMS: f64 = 0.453592;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("column '{0}' not found")]
    MissingColumn(String),
    #[error("could not convert {value:?} in column '{column}' (row {row}) to float")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },
}

/// Multiply every value of `column` by `factor`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitConversion {
    pub column: String,
    pub factor: f64,
}

impl UnitConversion {
    pub fn new(column: impl Into<String>, factor: f64) -> Self {
        Self {
            column: column.into(),
            factor,
        }
    }

    fn convert(&self, table: &Table) -> Result<Vec<Value>, TransformError> {
        let values = table
            .column(&self.column)
            .ok_or_else(|| TransformError::MissingColumn(self.column.clone()))?;

        values
            .into_iter()
            .enumerate()
            .map(|(row, v)| match to_float(v) {
                Some(Some(f)) => Ok(Value::Float(f * self.factor)),
                Some(None) => Ok(Value::Null),
                None => Err(TransformError::NotNumeric {
                    column: self.column.clone(),
                    row,
                    value: v.to_field(),
                }),
            })
            .collect()
    }
}

/// `Some(None)` for a missing value, `None` when the value cannot be read as a number.
fn to_float(v: &Value) -> Option<Option<f64>> {
    match v {
        Value::Null => Some(None),
        Value::Bool(b) => Some(Some(if *b { 1.0 } else { 0.0 })),
        Value::Int(i) => Some(Some(*i as f64)),
        Value::Float(f) => Some(Some(*f)),
        Value::Text(s) => s.trim().parse::<f64>().ok().map(Some),
    }
}

/// Applies a fixed set of unit conversions to a table, all or nothing.
#[derive(Debug, Clone)]
pub struct Transformer {
    conversions: Vec<UnitConversion>,
}

impl Default for Transformer {
    /// Height inches → meters, weight pounds → kilograms.
    fn default() -> Self {
        Self::new(vec![
            UnitConversion::new("height", INCHES_TO_METERS),
            UnitConversion::new("weight", POUNDS_TO_KILOGRAMS),
        ])
    }
}

impl Transformer {
    pub fn new(conversions: Vec<UnitConversion>) -> Self {
        Self { conversions }
    }

    pub fn conversions(&self) -> &[UnitConversion] {
        &self.conversions
    }

    /// Rewrite the configured columns in place.
    ///
    /// Every column is converted before any is written back; on error the
    /// table is consumed and only the error comes back.
    #[instrument(level = "info", skip_all, fields(rows = table.num_rows()))]
    pub fn apply(&self, mut table: Table) -> Result<Table, TransformError> {
        let converted = self
            .conversions
            .iter()
            .map(|c| c.convert(&table).map(|vals| (c.column.as_str(), vals)))
            .collect::<Result<Vec<_>, _>>()?;

        // `convert` already checked each column exists and sized its output to
        // the row count, so `replace_column` accepts every entry here.
        for (column, values) in converted {
            if !table.replace_column(column, values) {
                return Err(TransformError::MissingColumn(column.to_string()));
            }
            debug!(column, "converted");
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Record;

    fn person(height: Value, weight: Value) -> Record {
        [("height", height), ("weight", weight)].into_iter().collect()
    }

    fn float_at(t: &Table, row: usize, col: &str) -> f64 {
        match t.get(row, col) {
            Some(Value::Float(f)) => *f,
            other => panic!("expected float at {row}/{col}, got {other:?}"),
        }
    }

    #[test]
    fn converts_inches_and_pounds() {
        let mut t = Table::new();
        t.push_record(person(Value::Int(10), Value::Int(10)));

        let out = Transformer::default().apply(t).unwrap();
        assert!((float_at(&out, 0, "height") - 0.254).abs() < 1e-9);
        assert!((float_at(&out, 0, "weight") - 4.53592).abs() < 1e-9);
    }

    #[test]
    fn numeric_strings_and_missing_values() {
        let mut t = Table::new();
        t.push_record(person(Value::Text(" 65.78 ".into()), Value::Float(112.99)));
        t.push_record(person(Value::Null, Value::Text("136".into())));

        let out = Transformer::default().apply(t).unwrap();
        assert!((float_at(&out, 0, "height") - 65.78 * INCHES_TO_METERS).abs() < 1e-9);
        assert_eq!(out.get(1, "height"), Some(&Value::Null));
        assert!((float_at(&out, 1, "weight") - 136.0 * POUNDS_TO_KILOGRAMS).abs() < 1e-9);
    }

    #[test]
    fn one_bad_value_fails_the_whole_table() {
        let mut t = Table::new();
        t.push_record(person(Value::Int(60), Value::Int(120)));
        t.push_record(person(Value::Int(61), Value::Text("heavy".into())));
        t.push_record(person(Value::Int(62), Value::Int(130)));

        let err = Transformer::default().apply(t).unwrap_err();
        assert_eq!(
            err,
            TransformError::NotNumeric {
                column: "weight".into(),
                row: 1,
                value: "heavy".into()
            }
        );
    }

    #[test]
    fn missing_column_is_an_error() {
        let mut t = Table::new();
        t.push_record([("height", Value::Int(60))].into_iter().collect());
        let err = Transformer::default().apply(t).unwrap_err();
        assert_eq!(err, TransformError::MissingColumn("weight".into()));
    }

    #[test]
    fn empty_table_has_no_columns_to_convert() {
        assert!(matches!(
            Transformer::default().apply(Table::new()),
            Err(TransformError::MissingColumn(_))
        ));
    }

    #[test]
    fn other_columns_are_untouched() {
        let mut t = Table::new();
        let mut r = person(Value::Int(1), Value::Int(1));
        r.insert("name", Value::Text("sam".into()));
        t.push_record(r);

        let out = Transformer::default().apply(t).unwrap();
        assert_eq!(out.get(0, "name"), Some(&Value::Text("sam".into())));
        assert_eq!(out.columns(), &["height", "weight", "name"]);
    }

    #[test]
    fn rows_stored_before_a_column_appeared_are_written_back() {
        let mut t = Table::new();
        t.push_record([("name", Value::Text("early".into()))].into_iter().collect());
        t.push_record(person(Value::Int(10), Value::Int(10)));

        let out = Transformer::default().apply(t).unwrap();
        assert_eq!(out.num_rows(), 2);
        assert_eq!(out.get(0, "height"), Some(&Value::Null));
        assert_eq!(out.get(0, "weight"), Some(&Value::Null));
        assert!((float_at(&out, 1, "height") - 0.254).abs() < 1e-9);
        assert!((float_at(&out, 1, "weight") - 4.53592).abs() < 1e-9);
    }
}
