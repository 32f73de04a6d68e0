//! services/api/src/adapters/storage.rs
//!
//! This module contains the local-filesystem media store, the concrete
//! implementation of the `MediaStorageService` port. Objects land under a
//! configured root directory and are served back under a public base URL.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use courseforge_core::ports::{
    MediaStorageService, PortError, PortResult, StorageResourceKind, StoreOptions, StoredObject,
    UploadSource,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A media store that writes binaries to local disk.
#[derive(Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    base_url: String,
}

impl LocalMediaStore {
    /// Creates a new `LocalMediaStore`. `base_url` must be the public prefix
    /// under which `root` is served, without a trailing slash.
    pub fn new(root: PathBuf, base_url: String) -> Self {
        Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn unexpected(e: impl std::fmt::Display) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn extension_of(name: &Path) -> Option<String> {
    name.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn fallback_extension(kind: StorageResourceKind) -> &'static str {
    match kind {
        StorageResourceKind::Video => "mp4",
        StorageResourceKind::Image => "bin",
    }
}

//=========================================================================================
// `MediaStorageService` Trait Implementation
//=========================================================================================

#[async_trait]
impl MediaStorageService for LocalMediaStore {
    async fn store(
        &self,
        source: &UploadSource,
        options: &StoreOptions,
    ) -> PortResult<StoredObject> {
        let extension = match source {
            UploadSource::Bytes { file_name, .. } => extension_of(Path::new(file_name)),
            UploadSource::TempFile { path } => extension_of(path),
        }
        .unwrap_or_else(|| fallback_extension(options.resource_kind).to_string());

        let object_name = format!("{}.{extension}", Uuid::new_v4());
        let dir = self.root.join(&options.folder);
        tokio::fs::create_dir_all(&dir).await.map_err(unexpected)?;
        let target = dir.join(&object_name);

        let size_bytes = match source {
            UploadSource::Bytes { data, .. } => {
                tokio::fs::write(&target, data).await.map_err(unexpected)?;
                data.len() as u64
            }
            UploadSource::TempFile { path } => {
                let copied = tokio::fs::copy(path, &target).await;
                // The temp file is single-use. Cleanup is best-effort.
                let _ = tokio::fs::remove_file(path).await;
                copied.map_err(unexpected)?
            }
        };

        Ok(StoredObject {
            secure_url: format!("{}/{}/{object_name}", self.base_url, options.folder),
            thumbnail_url: None,
            duration_seconds: None,
            size_bytes,
            width: None,
            height: None,
            format: extension,
        })
    }

    /// `object_id` is the folder-relative path produced by `store`.
    async fn delete(&self, object_id: &str, _kind: StorageResourceKind) -> PortResult<()> {
        // Refuse anything that could escape the media root.
        if object_id.contains("..") || object_id.starts_with('/') {
            return Err(PortError::Unexpected(format!(
                "invalid object id: {object_id}"
            )));
        }
        tokio::fs::remove_file(self.root.join(object_id))
            .await
            .map_err(unexpected)
    }
}
