// src/fetch/mod.rs

pub mod zips;

use anyhow::{Context, Result};
use glob::{glob_with, MatchOptions, Pattern};
use std::path::{Path, PathBuf};

pub use zips::{download_zip, unpack_zip};

/// Top-level entries of `dir` (not recursive), in the order `glob` yields them.
/// Hidden entries (leading `.`) are skipped.
pub fn list_input_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*", Pattern::escape(&dir.as_ref().to_string_lossy()));
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    let mut files = Vec::new();
    let entries =
        glob_with(&pattern, options).with_context(|| format!("bad glob pattern {}", pattern))?;
    for entry in entries {
        files.push(entry.context("reading input directory entry")?);
    }
    Ok(files)
}
