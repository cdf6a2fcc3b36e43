//! BlobStore adapter over the `object_store` crate
//!
//! Works with any `ObjectStore` backend: in-memory, local filesystem, or S3.
//! Common prefixes are reported as directory markers; objects are reported as
//! files with a content kind inferred from their extension.

use super::{BlobStore, ListEntry, ObjectMeta, UploadOptions};
use crate::config::{StoreBackend, StoreConfig};
use crate::error::{ApiError, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutMode, PutOptions, PutPayload};
use std::sync::Arc;
use tracing::debug;
use url::Url;

const DELETE_CONCURRENCY: usize = 16;

#[derive(Clone)]
pub struct ObjectStoreBlobStore {
    inner: Arc<dyn ObjectStore>,
    public_base: Option<Url>,
}

impl std::fmt::Debug for ObjectStoreBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreBlobStore")
            .field("inner", &self.inner.to_string())
            .field("public_base", &self.public_base)
            .finish()
    }
}

impl ObjectStoreBlobStore {
    pub fn new(inner: Arc<dyn ObjectStore>, public_base: Option<Url>) -> Self {
        Self { inner, public_base }
    }

    /// Empty in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), None)
    }

    /// Store rooted at a local directory, created if missing
    pub fn local(root: &std::path::Path) -> Result<Self, ApiError> {
        std::fs::create_dir_all(root)?;
        let fs = LocalFileSystem::new_with_prefix(root)
            .map_err(|e| ApiError::ConfigError(format!("Invalid local store root: {}", e)))?
            .with_automatic_cleanup(true);
        Ok(Self::new(Arc::new(fs), None))
    }

    /// Build the configured backend
    pub fn from_config(config: &StoreConfig) -> Result<Self, ApiError> {
        let public_base = config
            .public_base_url
            .as_deref()
            .map(parse_public_base)
            .transpose()?;

        let store = match config.backend {
            StoreBackend::Memory => Self::in_memory(),
            StoreBackend::Local => {
                let root = config.root.as_ref().ok_or_else(|| {
                    ApiError::ConfigError("store.root is required for the local backend".into())
                })?;
                Self::local(root)?
            }
            StoreBackend::S3 => {
                let bucket = config.bucket.as_ref().ok_or_else(|| {
                    ApiError::ConfigError("store.bucket is required for the s3 backend".into())
                })?;
                let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
                if let Some(region) = &config.region {
                    builder = builder.with_region(region);
                }
                // localstack/minio
                if let Some(endpoint) = &config.endpoint {
                    builder = builder.with_endpoint(endpoint);
                    if endpoint.starts_with("http://") {
                        builder = builder.with_allow_http(true);
                    }
                }
                let s3 = builder.build().map_err(|e| {
                    ApiError::ConfigError(format!("Unable to build S3 client: {}", e))
                })?;
                Self::new(Arc::new(s3), None)
            }
        };

        Ok(Self {
            public_base,
            ..store
        })
    }
}

fn parse_public_base(raw: &str) -> Result<Url, ApiError> {
    // Url::join replaces the last segment unless the base ends with '/'
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&with_slash)
        .map_err(|e| ApiError::ConfigError(format!("Invalid store.public_base_url: {}", e)))
}

fn store_path(key: &str) -> Result<StorePath, StoreError> {
    StorePath::parse(key).map_err(|e| StoreError::InvalidKey {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn map_error(key: &str, err: object_store::Error) -> StoreError {
    match err {
        object_store::Error::NotFound { .. } => StoreError::NotFound(key.to_string()),
        object_store::Error::AlreadyExists { .. } => StoreError::AlreadyExists(key.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

/// Content kind reported for a listed object, from its extension.
pub fn infer_content_kind(name: &str) -> &'static str {
    let ext = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return "application/octet-stream",
    };
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl BlobStore for ObjectStoreBlobStore {
    async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<ListEntry>, StoreError> {
        let location = if prefix.is_empty() {
            None
        } else {
            Some(store_path(prefix)?)
        };
        let listing = self
            .inner
            .list_with_delimiter(location.as_ref())
            .await
            .map_err(|e| StoreError::ListFailure {
                prefix: prefix.to_string(),
                reason: e.to_string(),
            })?;

        let mut entries = Vec::with_capacity(listing.common_prefixes.len() + listing.objects.len());
        for dir in &listing.common_prefixes {
            if let Some(name) = dir.filename() {
                entries.push(ListEntry {
                    name: name.to_string(),
                    meta: ObjectMeta::directory_marker(),
                });
            }
        }
        for object in listing.objects {
            if let Some(name) = object.location.filename() {
                entries.push(ListEntry {
                    name: name.to_string(),
                    meta: ObjectMeta::file(
                        object.size as u64,
                        object.last_modified,
                        infer_content_kind(name),
                    ),
                });
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries.truncate(limit);
        debug!(prefix = %prefix, entries = entries.len(), "Listed prefix");
        Ok(entries)
    }

    async fn download(&self, key: &str) -> Result<Bytes, StoreError> {
        let location = store_path(key)?;
        let result = self
            .inner
            .get(&location)
            .await
            .map_err(|e| map_error(key, e))?;
        result.bytes().await.map_err(|e| map_error(key, e))
    }

    async fn upload(
        &self,
        key: &str,
        bytes: Bytes,
        options: UploadOptions,
    ) -> Result<(), StoreError> {
        let location = store_path(key)?;
        let mode = if options.overwrite {
            PutMode::Overwrite
        } else {
            PutMode::Create
        };
        let size = bytes.len();
        self.inner
            .put_opts(&location, PutPayload::from(bytes), PutOptions::from(mode))
            .await
            .map_err(|e| map_error(key, e))?;
        debug!(key = %key, size, "Uploaded object");
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<Vec<String>, StoreError> {
        let failed: Vec<String> = stream::iter(keys.iter().cloned())
            .map(|key| {
                let inner = self.inner.clone();
                async move {
                    let location = match store_path(&key) {
                        Ok(location) => location,
                        Err(_) => return Some(key),
                    };
                    match inner.delete(&location).await {
                        Ok(()) => None,
                        Err(e) => {
                            debug!(key = %key, error = %e, "Delete failed");
                            Some(key)
                        }
                    }
                }
            })
            .buffer_unordered(DELETE_CONCURRENCY)
            .filter_map(|failed| async move { failed })
            .collect()
            .await;
        Ok(failed)
    }

    fn public_url(&self, key: &str) -> Result<Url, StoreError> {
        let base = self
            .public_base
            .as_ref()
            .ok_or_else(|| StoreError::Backend("store.public_base_url is not configured".into()))?;
        base.join(key).map_err(|e| StoreError::InvalidKey {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}
