//! Local cache for the downloadable sample model.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

/// Returns `path`, downloading `url` into it first when it does not exist.
///
/// An existing file is trusted as-is. The body is streamed into a `.part`
/// sibling and renamed once complete.
pub fn ensure_sample(url: &str, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        info!("using cached sample {}", path.display());
        return Ok(path.to_path_buf());
    }

    info!("downloading {url}");
    let partial = partial_path(path);
    if let Err(err) = download(url, &partial) {
        let _ = fs::remove_file(&partial);
        return Err(err);
    }
    fs::rename(&partial, path)
        .with_context(|| format!("failed to move download into {}", path.display()))?;
    Ok(path.to_path_buf())
}

fn download(url: &str, dest: &Path) -> Result<()> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .with_context(|| format!("failed to download {url}"))?;

    let file =
        File::create(dest).with_context(|| format!("failed to create {}", dest.display()))?;
    let mut writer = BufWriter::new(file);
    let bytes = response
        .copy_to(&mut writer)
        .with_context(|| format!("failed to read response body from {url}"))?;
    writer
        .into_inner()
        .map_err(|err| err.into_error())
        .with_context(|| format!("failed to write {}", dest.display()))?;
    info!("downloaded {bytes} bytes to {}", dest.display());
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}
