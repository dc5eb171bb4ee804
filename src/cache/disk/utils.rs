//! Utility functions for the disk store

use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};

use crate::constants::{DISK_BODY_EXTENSION, DISK_METADATA_EXTENSION};
use crate::request::RequestKey;

/// Suffix of in-flight temp files; never matches an entry extension
pub const TEMP_SUFFIX: &str = ".tmp";

/// Convert a RequestKey to a SHA256 hash for use as a filename
pub fn key_to_hash(key: &RequestKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.method.as_str().as_bytes());
    hasher.update(b" ");
    hasher.update(key.url.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Directory name of a generation; hex keeps arbitrary names filesystem safe
pub fn generation_dir_name(name: &str) -> String {
    hex::encode(name.as_bytes())
}

/// Generation name from its directory name, if it is one of ours
pub fn generation_name_from_dir(dir_name: &str) -> Option<String> {
    let bytes = hex::decode(dir_name).ok()?;
    String::from_utf8(bytes).ok()
}

/// Generate (metadata, body) file paths of an entry
pub fn entry_paths(generation_dir: &Path, key: &RequestKey) -> (PathBuf, PathBuf) {
    let hash = key_to_hash(key);
    let meta_path = generation_dir.join(format!("{}.{}", hash, DISK_METADATA_EXTENSION));
    let body_path = generation_dir.join(format!("{}.{}", hash, DISK_BODY_EXTENSION));
    (meta_path, body_path)
}

/// File written under a unique temp name next to its destination, not yet visible
///
/// Dropping it without committing removes the temp file.
pub struct StagedFile {
    temp: TempPath,
    dest: PathBuf,
}

impl StagedFile {
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Rename the temp file onto its destination
    pub async fn commit(self) -> std::io::Result<()> {
        let Self { temp, dest } = self;
        run_blocking(move || temp.persist(&dest).map_err(|e| e.error)).await
    }
}

async fn run_blocking<T, F>(f: F) -> std::io::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
}

fn parent_dir(path: &Path) -> std::io::Result<PathBuf> {
    path.parent().map(Path::to_path_buf).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", path.display()),
        )
    })
}

fn temp_sibling(dir: &Path) -> std::io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(".")
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
}

/// Write `data` to a unique sibling of `path` without touching `path`
pub async fn stage_file(path: &Path, data: Bytes) -> std::io::Result<StagedFile> {
    let dir = parent_dir(path)?;
    tokio::fs::create_dir_all(&dir).await?;

    let temp = run_blocking(move || {
        let mut file = temp_sibling(&dir)?;
        file.write_all(&data)?;
        file.flush()?;
        Ok(file.into_temp_path())
    })
    .await?;

    Ok(StagedFile {
        temp,
        dest: path.to_path_buf(),
    })
}

/// Write file contents atomically (unique temp file + rename)
pub async fn write_file_atomic(path: &Path, data: Bytes) -> std::io::Result<()> {
    stage_file(path, data).await?.commit().await
}

/// Move an existing file to a unique sibling so it can be restored later
///
/// Returns `None` when there is no file at `path`. The backup is deleted
/// when the returned guard is dropped.
pub async fn move_aside(path: &Path) -> std::io::Result<Option<TempPath>> {
    let dir = parent_dir(path)?;
    let backup = run_blocking(move || Ok(temp_sibling(&dir)?.into_temp_path())).await?;

    match tokio::fs::rename(path, &backup).await {
        Ok(()) => Ok(Some(backup)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Put a file moved aside by [`move_aside`] back at `path`
pub async fn restore(backup: TempPath, path: &Path) -> std::io::Result<()> {
    let path = path.to_path_buf();
    run_blocking(move || backup.persist(&path).map_err(|e| e.error)).await
}

/// Delete a file, treating a missing file as deleted
pub async fn remove_file_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
