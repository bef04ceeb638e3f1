// src/load.rs

use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

use crate::table::Table;

/// Write `table` to `path` as CSV: header row, no index column.
///
/// The rows go to a hidden sibling file first which is then renamed over
/// `path`, so an interrupted write leaves any previous artifact in place.
/// Returns the number of data rows written.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = table.num_rows()))]
pub fn write_csv(table: &Table, path: &Path) -> Result<usize> {
    let tmp_path = temp_path_for(path)?;

    let written = write_rows(table, &tmp_path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp_path);
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        anyhow::Error::new(e).context(format!("renaming {:?} -> {:?}", tmp_path, path))
    })?;

    debug!(rows = written, "artifact written");
    Ok(written)
}

fn write_rows(table: &Table, tmp_path: &Path) -> Result<usize> {
    let file = fs::File::create(tmp_path).with_context(|| format!("creating {:?}", tmp_path))?;

    // nothing to describe: leave the file empty rather than a lone blank record
    if table.num_columns() == 0 {
        return Ok(0);
    }

    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
    wtr.write_record(table.columns()).context("writing CSV header")?;

    let mut written = 0;
    for row in table.rows() {
        wtr.write_record(row.iter().map(|v| v.to_field()))
            .with_context(|| format!("writing CSV row {}", written))?;
        written += 1;
    }
    wtr.flush().context("flushing CSV output")?;
    Ok(written)
}

/// `dir/name.csv` → `dir/.name.csv.tmp`
fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .with_context(|| format!("output path {:?} has no file name", path))?;
    let tmp_name = format!(".{}.tmp", name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}
