// src/extract/mod.rs

pub mod csv;
pub mod json;
pub mod xml;

use anyhow::Result;
use std::{
    fmt,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

use crate::audit::AuditLog;
use crate::table::Table;

/// Input formats the extractor knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
    Xml,
}

impl SourceFormat {
    /// Pick a format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }

    /// Parse `path` with this format's reader.
    pub fn read(self, path: &Path) -> Result<Table> {
        match self {
            Self::Csv => csv::read_csv(path),
            Self::Json => json::read_json_lines(path),
            Self::Xml => xml::read_xml(path),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "CSV",
            Self::Json => "JSON",
            Self::Xml => "XML",
        })
    }
}

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Extracted { format: SourceFormat, rows: usize },
    Failed { format: SourceFormat, reason: String },
    Unsupported,
}

/// Combined table plus the per-file outcomes, in processing order.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub table: Table,
    pub files: Vec<(PathBuf, FileOutcome)>,
}

impl ExtractionReport {
    pub fn failed(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .filter(|(_, o)| matches!(o, FileOutcome::Failed { .. }))
            .map(|(p, _)| p.as_path())
    }

    pub fn unsupported(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .filter(|(_, o)| matches!(o, FileOutcome::Unsupported))
            .map(|(p, _)| p.as_path())
    }
}

/// Extract a single file. Errors never escape: they are audited and the file
/// contributes an empty table.
pub fn extract_file(path: &Path, audit: &AuditLog) -> (Table, FileOutcome) {
    let Some(format) = SourceFormat::from_path(path) else {
        audit.record(format!("Unsupported file type: {}", path.display()));
        return (Table::new(), FileOutcome::Unsupported);
    };

    match format.read(path) {
        Ok(table) => {
            audit.record(format!("Extracted data from {}: {}", format, path.display()));
            let rows = table.num_rows();
            (table, FileOutcome::Extracted { format, rows })
        }
        Err(e) => {
            let reason = format!("{:#}", e);
            audit.record(format!(
                "Error extracting from {}: {}, {}",
                format,
                path.display(),
                reason
            ));
            (Table::new(), FileOutcome::Failed { format, reason })
        }
    }
}

/// Extract every path in order and concatenate the results into one table.
#[instrument(level = "info", skip_all, fields(files = paths.len()))]
pub fn extract_all<P: AsRef<Path>>(paths: &[P], audit: &AuditLog) -> ExtractionReport {
    let mut report = ExtractionReport::default();

    for path in paths {
        let path = path.as_ref();
        let (table, outcome) = extract_file(path, audit);
        debug!(path = %path.display(), ?outcome, "file done");
        report.table.append(table);
        report.files.push((path.to_path_buf(), outcome));
    }

    audit.record("Data extraction complete.");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use std::fs;
    use tempfile::tempdir;

    fn quiet_log(dir: &Path) -> AuditLog {
        AuditLog::open(dir.join("etllog.csv"))
            .unwrap()
            .with_console(false)
    }

    #[test]
    fn dispatch_is_case_insensitive() {
        assert_eq!(SourceFormat::from_path(Path::new("a.csv")), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_path(Path::new("a.CSV")), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_path(Path::new("b.Json")), Some(SourceFormat::Json));
        assert_eq!(SourceFormat::from_path(Path::new("c.XML")), Some(SourceFormat::Xml));
        assert_eq!(SourceFormat::from_path(Path::new("c.txt")), None);
        assert_eq!(SourceFormat::from_path(Path::new("noext")), None);
        assert_eq!(SourceFormat::from_path(Path::new("archive.csv.gz")), None);
    }

    #[test]
    fn unsupported_file_is_logged_once_and_adds_no_rows() {
        let tmp = tempdir().unwrap();
        let log = quiet_log(tmp.path());
        let txt = tmp.path().join("c.txt");
        fs::write(&txt, "height,weight\n1,2\n").unwrap();

        let report = extract_all(&[&txt], &log);
        assert_eq!(report.table.num_rows(), 0);
        assert_eq!(report.files[0].1, FileOutcome::Unsupported);

        let text = fs::read_to_string(log.path()).unwrap();
        let unsupported: Vec<_> = text
            .lines()
            .filter(|l| l.contains("Unsupported file type"))
            .collect();
        assert_eq!(unsupported.len(), 1);
        assert!(unsupported[0].ends_with(&txt.display().to_string()));
    }

    #[test]
    fn failed_file_does_not_stop_the_batch() {
        let tmp = tempdir().unwrap();
        let log = quiet_log(tmp.path());

        let bad = tmp.path().join("bad.json");
        fs::write(&bad, "{\"height\": 1}\nnot json\n").unwrap();
        let missing = tmp.path().join("missing.csv");
        let good = tmp.path().join("good.csv");
        fs::write(&good, "height,weight\n60,120\n70,150\n").unwrap();

        let report = extract_all(&[&bad, &missing, &good], &log);
        assert_eq!(report.table.num_rows(), 2);
        assert_eq!(report.failed().count(), 2);
        assert_eq!(
            report.files[2].1,
            FileOutcome::Extracted {
                format: SourceFormat::Csv,
                rows: 2
            }
        );

        let text = fs::read_to_string(log.path()).unwrap();
        assert!(text.contains(&format!("Error extracting from JSON: {}", bad.display())));
        assert!(text.contains(&format!("Error extracting from CSV: {}", missing.display())));
        assert!(text.contains(&format!("Extracted data from CSV: {}", good.display())));
        assert!(text.lines().last().unwrap().ends_with("Data extraction complete."));
    }

    #[test]
    fn rows_follow_file_order_then_record_order() {
        let tmp = tempdir().unwrap();
        let log = quiet_log(tmp.path());

        let xml = tmp.path().join("z.xml");
        fs::write(
            &xml,
            "<people><person><name>x1</name></person><person><name>x2</name></person></people>",
        )
        .unwrap();
        let json = tmp.path().join("a.json");
        fs::write(&json, "{\"name\": \"j1\"}\n").unwrap();

        let report = extract_all(&[&xml, &json], &log);
        let names: Vec<_> = report
            .table
            .column("name")
            .unwrap()
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(
            names,
            vec![
                Value::Text("x1".into()),
                Value::Text("x2".into()),
                Value::Text("j1".into())
            ]
        );
    }

    #[test]
    fn no_inputs_yields_empty_table() {
        let tmp = tempdir().unwrap();
        let log = quiet_log(tmp.path());
        let paths: Vec<PathBuf> = Vec::new();
        let report = extract_all(&paths, &log);
        assert!(report.table.is_empty());
        assert!(report.files.is_empty());
    }
}
