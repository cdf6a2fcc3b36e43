//! BlobStore capability interface
//!
//! The filesystem layer only ever talks to the backing object store through
//! this trait: one-level listing, whole-object download and upload, and a
//! best-effort batch delete. Directories do not exist at this level.

pub mod object;
pub mod recording;

use crate::error::StoreError;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

pub use object::ObjectStoreBlobStore;
pub use recording::{RecordingStore, StoreCall};

/// Metadata reported for one listed entry
///
/// A present `content_kind` is the only signal that the entry is a file.
/// Directory markers carry neither a content kind nor a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_kind: Option<String>,
}

impl ObjectMeta {
    pub fn file(size: u64, last_modified: DateTime<Utc>, content_kind: impl Into<String>) -> Self {
        Self {
            size,
            last_modified: Some(last_modified),
            content_kind: Some(content_kind.into()),
        }
    }

    pub fn directory_marker() -> Self {
        Self {
            size: 0,
            last_modified: None,
            content_kind: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.content_kind.is_some()
    }
}

/// One entry of a single-level listing, named relative to the listed prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub name: String,
    pub meta: ObjectMeta,
}

/// Upload behaviour when the key is already present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub overwrite: bool,
}

impl UploadOptions {
    pub fn overwrite() -> Self {
        Self { overwrite: true }
    }

    pub fn create_only() -> Self {
        Self { overwrite: false }
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// List the immediate entries under `prefix` (non-recursive), at most `limit`.
    async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<ListEntry>, StoreError>;

    /// Fetch a whole object. Fails with `StoreError::NotFound` when absent.
    async fn download(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Store a whole object. Fails with `StoreError::AlreadyExists` when
    /// `overwrite` is false and the key is present.
    async fn upload(&self, key: &str, bytes: Bytes, options: UploadOptions)
        -> Result<(), StoreError>;

    /// Best-effort batch delete. `Ok` carries the keys that could not be deleted.
    async fn delete_many(&self, keys: &[String]) -> Result<Vec<String>, StoreError>;

    /// Public URL for a key, used by viewers only.
    fn public_url(&self, key: &str) -> Result<Url, StoreError>;
}

/// Shared handle to a store implementation
pub type SharedStore = Arc<dyn BlobStore>;
