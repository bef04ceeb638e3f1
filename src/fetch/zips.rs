// src/fetch/zips.rs

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};
use url::Url;
use zip::ZipArchive;

/// Download the given ZIP URL and save it under `dest_dir` using the original filename.
/// Returns the full path of the saved file.
#[instrument(level = "info", skip(client, dest_dir))]
pub fn download_zip(client: &Client, url_str: &str, dest_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dest_dir = dest_dir.as_ref();
    let url = Url::parse(url_str).with_context(|| format!("parsing archive URL {}", url_str))?;
    let filename = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or("download.zip");
    let dest_path = dest_dir.join(filename);

    fs::create_dir_all(dest_dir).with_context(|| format!("creating {:?}", dest_dir))?;

    let resp = client
        .get(url.as_str())
        .send()
        .with_context(|| format!("GET {}", url))?
        .error_for_status()?;
    let bytes = resp
        .bytes()
        .with_context(|| format!("reading body from {}", url))?;
    fs::write(&dest_path, &bytes).with_context(|| format!("writing {:?}", dest_path))?;

    debug!(bytes = bytes.len(), path = %dest_path.display(), "saved");
    Ok(dest_path)
}

/// Extract every entry of `zip_path` into `out_dir`, keeping the archive's
/// relative paths. Entries whose names would land outside `out_dir` are an error.
/// Returns the number of files written.
#[instrument(level = "info", skip_all, fields(zip = %zip_path.as_ref().display()))]
pub fn unpack_zip<P: AsRef<Path>, Q: AsRef<Path>>(zip_path: P, out_dir: Q) -> Result<usize> {
    let zip_path = zip_path.as_ref();
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir).with_context(|| format!("creating {:?}", out_dir))?;

    let file = File::open(zip_path).with_context(|| format!("Failed to open ZIP file: {:?}", zip_path))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {:?}", zip_path))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to access ZIP entry #{} in {:?}", i, zip_path))?;
        let Some(rel) = entry.enclosed_name() else {
            bail!("ZIP entry {:?} escapes the output directory", entry.name());
        };
        let target = out_dir.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&target).with_context(|| format!("creating {:?}", target))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }
        let mut out = File::create(&target).with_context(|| format!("creating {:?}", target))?;
        io::copy(&mut entry, &mut out).with_context(|| format!("extracting {:?}", target))?;
        written += 1;
    }

    debug!(files = written, "unpacked");
    Ok(written)
}
