// src/pipeline.rs

use std::{
    fmt,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

use crate::audit::AuditLog;
use crate::extract::{self, ExtractionReport};
use crate::load;
use crate::table::Table;
use crate::transform::{TransformError, Transformer};

/// Stages of a run, always visited in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Started,
    Extracting,
    Transforming,
    Loading,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Started => "started",
            Phase::Extracting => "extracting",
            Phase::Transforming => "transforming",
            Phase::Loading => "loading",
            Phase::Completed => "completed",
        })
    }
}

/// Everything a run produced, including the failures it absorbed.
#[derive(Debug)]
pub struct RunReport {
    pub phases: Vec<Phase>,
    pub extraction: ExtractionReport,
    /// Set when the transform rejected the batch and an empty table was loaded instead.
    pub transform_error: Option<TransformError>,
    pub load_error: Option<String>,
    pub rows_written: usize,
    /// The table handed to the loader.
    pub output: Table,
}

impl RunReport {
    /// True when no phase had to fall back.
    pub fn is_clean(&self) -> bool {
        self.transform_error.is_none()
            && self.load_error.is_none()
            && self.extraction.failed().next().is_none()
    }
}

/// Extract → transform → load over a fixed list of input files.
pub struct Pipeline<'a> {
    audit: &'a AuditLog,
    transformer: Transformer,
    output_path: PathBuf,
}

impl<'a> Pipeline<'a> {
    pub fn new(audit: &'a AuditLog, output_path: impl Into<PathBuf>) -> Self {
        Self {
            audit,
            transformer: Transformer::default(),
            output_path: output_path.into(),
        }
    }

    pub fn with_transformer(mut self, transformer: Transformer) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Run every phase. Never fails: each phase records its own errors in the
    /// audit log and hands the next phase an empty-but-valid table.
    #[instrument(level = "info", skip_all, fields(files = files.len()))]
    pub fn run<P: AsRef<Path>>(&self, files: &[P]) -> RunReport {
        let mut phases = Vec::with_capacity(5);
        enter(&mut phases, Phase::Started);
        self.audit.record("ETL process started.");

        // ─── extract ─────────────────────────────────────────────────────
        enter(&mut phases, Phase::Extracting);
        self.audit.record("Extraction phase started.");
        let mut extraction = extract::extract_all(files, self.audit);
        let combined = std::mem::take(&mut extraction.table);
        info!(
            rows = combined.num_rows(),
            columns = combined.num_columns(),
            "extracted"
        );

        // ─── transform ───────────────────────────────────────────────────
        enter(&mut phases, Phase::Transforming);
        self.audit.record("Transformation phase started.");
        let (transformed, transform_error) = match self.transformer.apply(combined) {
            Ok(table) => {
                self.audit.record("Data transformation complete.");
                (table, None)
            }
            Err(e) => {
                // the whole batch is discarded; a partial transform is never loaded
                self.audit
                    .record(format!("Error during data transformation: {}", e));
                (Table::new(), Some(e))
            }
        };

        // ─── load ────────────────────────────────────────────────────────
        enter(&mut phases, Phase::Loading);
        self.audit.record("Loading phase started.");
        let (rows_written, load_error) = match load::write_csv(&transformed, &self.output_path) {
            Ok(n) => {
                self.audit.record(format!(
                    "Data successfully saved to {}",
                    self.output_path.display()
                ));
                (n, None)
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                self.audit.record(format!("Error saving data: {}", reason));
                (0, Some(reason))
            }
        };

        enter(&mut phases, Phase::Completed);
        self.audit.record("ETL process completed.");

        RunReport {
            phases,
            extraction,
            transform_error,
            load_error,
            rows_written,
            output: transformed,
        }
    }
}

fn enter(phases: &mut Vec<Phase>, phase: Phase) {
    debug!(%phase, "entering phase");
    phases.push(phase);
}
