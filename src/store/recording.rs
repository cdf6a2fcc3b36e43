//! Call-recording BlobStore wrapper
//!
//! Records every primitive call in order and can be told to fail specific
//! calls. Used to check how many store round-trips an operation makes and how
//! it behaves when a step fails halfway.

use super::{BlobStore, ListEntry, SharedStore, UploadOptions};
use crate::error::StoreError;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashSet;
use url::Url;

/// One primitive call seen by the wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List(String),
    Download(String),
    Upload(String),
    DeleteMany(Vec<String>),
}

#[derive(Debug, Default)]
struct FailurePlan {
    list: HashSet<String>,
    download: HashSet<String>,
    upload: HashSet<String>,
    delete: HashSet<String>,
}

pub struct RecordingStore {
    inner: SharedStore,
    calls: Mutex<Vec<StoreCall>>,
    failures: Mutex<FailurePlan>,
}

impl RecordingStore {
    pub fn new(inner: SharedStore) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(FailurePlan::default()),
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Every key passed to `delete_many`, across all calls
    pub fn deleted_keys(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                StoreCall::DeleteMany(keys) => Some(keys.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn fail_list(&self, prefix: &str) {
        self.failures.lock().list.insert(prefix.to_string());
    }

    pub fn fail_download(&self, key: &str) {
        self.failures.lock().download.insert(key.to_string());
    }

    pub fn fail_upload(&self, key: &str) {
        self.failures.lock().upload.insert(key.to_string());
    }

    pub fn fail_delete(&self, key: &str) {
        self.failures.lock().delete.insert(key.to_string());
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().push(call);
    }
}

fn injected(what: &str, key: &str) -> StoreError {
    StoreError::Backend(format!("injected {} failure for '{}'", what, key))
}

#[async_trait]
impl BlobStore for RecordingStore {
    async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<ListEntry>, StoreError> {
        self.record(StoreCall::List(prefix.to_string()));
        if self.failures.lock().list.contains(prefix) {
            return Err(StoreError::ListFailure {
                prefix: prefix.to_string(),
                reason: "injected".to_string(),
            });
        }
        self.inner.list(prefix, limit).await
    }

    async fn download(&self, key: &str) -> Result<Bytes, StoreError> {
        self.record(StoreCall::Download(key.to_string()));
        if self.failures.lock().download.contains(key) {
            return Err(injected("download", key));
        }
        self.inner.download(key).await
    }

    async fn upload(
        &self,
        key: &str,
        bytes: Bytes,
        options: UploadOptions,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::Upload(key.to_string()));
        if self.failures.lock().upload.contains(key) {
            return Err(injected("upload", key));
        }
        self.inner.upload(key, bytes, options).await
    }

    async fn delete_many(&self, keys: &[String]) -> Result<Vec<String>, StoreError> {
        self.record(StoreCall::DeleteMany(keys.to_vec()));
        let (blocked, allowed): (Vec<String>, Vec<String>) = {
            let failures = self.failures.lock();
            keys.iter()
                .cloned()
                .partition(|key| failures.delete.contains(key))
        };
        let mut failed = if allowed.is_empty() {
            Vec::new()
        } else {
            self.inner.delete_many(&allowed).await?
        };
        failed.extend(blocked);
        Ok(failed)
    }

    fn public_url(&self, key: &str) -> Result<Url, StoreError> {
        self.inner.public_url(key)
    }
}
