// src/audit.rs

use anyhow::{Context, Result};
use chrono::Local;
use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::warn;

/// Timestamp layout for every audit line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only operator log shared by every phase of a run.
///
/// The file is opened once in append mode and held until the log is dropped.
/// Each entry is flushed as soon as it is written so the file can be tailed,
/// and the same line is echoed to a console sink (stdout unless replaced).
pub struct AuditLog {
    path: PathBuf,
    file: File,
    console: Option<Mutex<Box<dyn Write + Send>>>,
}

impl AuditLog {
    /// Open (or create) the log at `path`, creating its parent directory if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating log directory {:?}", parent))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening audit log {:?}", path))?;
        Ok(Self {
            path,
            file,
            console: Some(console_sink(io::stdout())),
        })
    }

    /// Toggle the stdout echo.
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console.then(|| console_sink(io::stdout()));
        self
    }

    /// Echo entries to `writer` instead of stdout.
    pub fn with_console_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.console = Some(console_sink(writer));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one `[timestamp] message` line.
    ///
    /// A failed write to either sink is reported through tracing and otherwise
    /// ignored; the audit trail must never be the reason a run stops.
    pub fn record(&self, message: impl AsRef<str>) {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let line = format_entry(&timestamp, message.as_ref());

        if let Err(e) = write_line(&mut &self.file, &line) {
            warn!(path = %self.path.display(), error = %e, "audit write failed");
        }

        if let Some(console) = &self.console {
            let mut sink = console.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Err(e) = write_line(&mut *sink, &line) {
                warn!(error = %e, "audit console echo failed");
            }
        }
    }
}

fn console_sink(writer: impl Write + Send + 'static) -> Mutex<Box<dyn Write + Send>> {
    Mutex::new(Box::new(writer))
}

/// Line and newline go out in one `write_all`.
fn write_line<W: Write + ?Sized>(out: &mut W, line: &str) -> io::Result<()> {
    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');
    out.write_all(buf.as_bytes())?;
    out.flush()
}

fn format_entry(timestamp: &str, message: &str) -> String {
    format!("[{}] {}", timestamp, message)
}
