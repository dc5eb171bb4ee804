//! DiskCacheStore implementation

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

use super::types::EntryMetadata;
use super::utils::{
    entry_paths, generation_dir_name, generation_name_from_dir, move_aside,
    remove_file_if_exists, restore, stage_file, write_file_atomic, StagedFile,
};
use crate::cache::error::StoreError;
use crate::cache::stats::GenerationStats;
use crate::cache::traits::CacheStore;
use crate::constants::DISK_METADATA_EXTENSION;
use crate::request::{RequestKey, Response};

/// Step of a batch commit that must be reverted if the batch fails
enum Undo {
    /// The destination did not exist before
    Remove(PathBuf),
    /// The destination held an older file, moved to `backup`
    Restore { backup: TempPath, dest: PathBuf },
}

/// Generation-partitioned store persisted under a root directory
pub struct DiskCacheStore {
    root: PathBuf,
}

impl DiskCacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn generation_dir(&self, name: &str) -> PathBuf {
        self.root.join(generation_dir_name(name))
    }

    async fn write_entry(
        &self,
        generation_dir: &Path,
        key: &RequestKey,
        response: &Response,
    ) -> Result<(), StoreError> {
        let (meta_path, body_path) = entry_paths(generation_dir, key);
        let metadata = EntryMetadata::new(key, response);
        let metadata_json = serde_json::to_vec(&metadata)?;

        // Body first: metadata is what makes the entry visible
        write_file_atomic(&body_path, response.body.clone()).await?;
        write_file_atomic(&meta_path, Bytes::from(metadata_json)).await?;
        Ok(())
    }

    /// Move whatever is at the destination aside, then publish the staged file
    async fn commit_file(file: StagedFile, undo: &mut Vec<Undo>) -> std::io::Result<()> {
        let dest = file.dest().to_path_buf();
        match move_aside(&dest).await? {
            Some(backup) => undo.push(Undo::Restore { backup, dest }),
            None => undo.push(Undo::Remove(dest)),
        }
        file.commit().await
    }

    async fn roll_back(undo: Vec<Undo>) {
        for step in undo.into_iter().rev() {
            let (path, result) = match step {
                Undo::Remove(path) => {
                    let result = remove_file_if_exists(&path).await;
                    (path, result)
                }
                Undo::Restore { backup, dest } => {
                    let result = restore(backup, &dest).await;
                    (dest, result)
                }
            };
            if let Err(e) = result {
                tracing::warn!(path = %path.display(), error = %e, "Failed to roll back batch write");
            }
        }
    }

    async fn read_metadata(path: &Path) -> Result<Option<EntryMetadata>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CacheStore for DiskCacheStore {
    async fn open(&self, name: &str) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(self.generation_dir(name)).await?;
        Ok(())
    }

    async fn has(&self, name: &str) -> Result<bool, StoreError> {
        match tokio::fs::metadata(self.generation_dir(name)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(name) = entry
                .file_name()
                .to_str()
                .and_then(generation_name_from_dir)
            {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        match tokio::fs::remove_dir_all(self.generation_dir(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn match_request(
        &self,
        name: &str,
        key: &RequestKey,
    ) -> Result<Option<Response>, StoreError> {
        let (meta_path, body_path) = entry_paths(&self.generation_dir(name), key);

        let metadata = match Self::read_metadata(&meta_path).await? {
            Some(metadata) if metadata.matches(key) => metadata,
            _ => return Ok(None),
        };

        let body = match tokio::fs::read(&body_path).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::Corrupted(format!("missing body for {}", key)));
            }
            Err(e) => return Err(e.into()),
        };

        metadata.into_response(body).map(Some)
    }

    async fn put(
        &self,
        name: &str,
        key: RequestKey,
        response: Response,
    ) -> Result<(), StoreError> {
        let generation_dir = self.generation_dir(name);
        tokio::fs::create_dir_all(&generation_dir).await?;
        self.write_entry(&generation_dir, &key, &response).await
    }

    async fn put_all(
        &self,
        name: &str,
        entries: Vec<(RequestKey, Response)>,
    ) -> Result<(), StoreError> {
        let generation_dir = self.generation_dir(name);
        tokio::fs::create_dir_all(&generation_dir).await?;

        // Stage everything first; a failure here leaves the generation untouched
        let mut staged = Vec::with_capacity(entries.len() * 2);
        for (key, response) in &entries {
            let (meta_path, body_path) = entry_paths(&generation_dir, key);
            let metadata_json = serde_json::to_vec(&EntryMetadata::new(key, response))?;
            staged.push(stage_file(&body_path, response.body.clone()).await?);
            staged.push(stage_file(&meta_path, Bytes::from(metadata_json)).await?);
        }

        let mut undo = Vec::with_capacity(staged.len());
        let total = staged.len();
        for (committed, file) in staged.into_iter().enumerate() {
            if let Err(e) = Self::commit_file(file, &mut undo).await {
                tracing::warn!(
                    generation = %name,
                    error = %e,
                    committed,
                    total,
                    "Batch write failed, restoring previous entries"
                );
                // Remaining staged files are dropped with the iterator
                Self::roll_back(undo).await;
                return Err(e.into());
            }
        }

        Ok(())
    }

    async fn stats(&self, name: &str) -> Result<GenerationStats, StoreError> {
        let mut dir = match tokio::fs::read_dir(self.generation_dir(name)).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(GenerationStats::default())
            }
            Err(e) => return Err(e.into()),
        };

        let mut stats = GenerationStats::default();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DISK_METADATA_EXTENSION) {
                continue;
            }
            if let Some(metadata) = Self::read_metadata(&path).await? {
                stats.entry_count += 1;
                stats.size_bytes += metadata.size_bytes;
            }
        }
        Ok(stats)
    }
}
