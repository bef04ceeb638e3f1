// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_SOURCE_URL: &str = "https://cf-courses-data.s3.us.cloud-object-storage.appdomain.cloud/IBMDeveloperSkillsNetwork-PY0221EN-SkillsNetwork/labs/module%206/Lab%20-%20Extract%20Transform%20Load/data/source.zip";

/// Paths and source location for one run. Fixed once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Archive to download.
    pub source_url: String,
    /// Where the downloaded archive is saved.
    pub download_dir: PathBuf,
    /// Where the archive is unpacked; its top-level files are the inputs.
    pub unzip_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_file: String,
    pub output_dir: PathBuf,
    pub output_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            download_dir: PathBuf::from("data"),
            unzip_dir: PathBuf::from("data/unzipped"),
            log_dir: PathBuf::from("data/log"),
            log_file: "etllog.csv".to_string(),
            output_dir: PathBuf::from("data/txn"),
            output_file: "transformed_df.csv".to_string(),
        }
    }
}

impl Config {
    /// Parse a YAML config; missing keys take their defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing config YAML")
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        Self::from_yaml(&text).with_context(|| format!("loading config {:?}", path))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_file)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }

    /// Create every directory the run writes into.
    pub fn prepare_dirs(&self) -> Result<()> {
        for d in [&self.download_dir, &self.unzip_dir, &self.log_dir, &self.output_dir] {
            fs::create_dir_all(d).with_context(|| format!("creating directory {:?}", d))?;
        }
        Ok(())
    }
}
