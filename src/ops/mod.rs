//! Directory semantics emulated on BlobStore primitives
//!
//! None of these operations is atomic at the store level. Validation failures
//! and conflicts come back as `Err` before anything is touched; once an
//! operation starts mutating, per-step failures are reported through
//! `Outcome` and nothing is rolled back.

pub mod local;
pub mod outcome;
pub mod transfer;

use crate::config::OpsConfig;
use crate::error::{ApiError, StoreError};
use crate::path;
use crate::store::{ObjectMeta, SharedStore, UploadOptions};
use crate::tree::{Node, TreeBuilder};
use bytes::Bytes;
use tracing::{debug, info, warn};

pub use local::UploadReport;
pub use outcome::{FailedStep, Outcome, Step};

/// What to do when the target path is already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Return `ApiError::AlreadyExists` so the caller can ask the user
    #[default]
    Refuse,
    /// Remove the existing content first
    Replace,
}

#[derive(Clone)]
pub struct PathOps {
    store: SharedStore,
    tree: TreeBuilder,
    list_limit: usize,
    transfer_concurrency: usize,
}

impl PathOps {
    pub fn new(store: SharedStore, config: &OpsConfig) -> Self {
        Self {
            tree: TreeBuilder::new(store.clone(), config.list_limit),
            store,
            list_limit: config.list_limit,
            transfer_concurrency: config.transfer_concurrency.max(1),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn tree_builder(&self) -> &TreeBuilder {
        &self.tree
    }

    /// Listed entry for `path`, found through its parent prefix
    pub async fn lookup(&self, path: &str) -> Result<Option<ObjectMeta>, ApiError> {
        let path = non_root(path)?;
        let name = path::file_name(&path);
        let entries = self.store.list(path::parent(&path), self.list_limit).await?;
        Ok(entries
            .into_iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.meta))
    }

    /// Whether a file or directory is present at `path`
    pub async fn exists(&self, path: &str) -> Result<bool, ApiError> {
        Ok(self.lookup(path).await?.is_some())
    }

    /// Every key below `path`, `.keep` markers included
    pub async fn collect_descendants(&self, path: &str) -> Vec<String> {
        self.tree.collect_keys(path).await
    }

    /// Create an empty directory anchored by a `.keep` placeholder.
    pub async fn create_directory(
        &self,
        path: &str,
        policy: OverwritePolicy,
    ) -> Result<Outcome, ApiError> {
        let path = non_root(path)?;
        let outcome = self.clear_existing(&path, policy).await?;
        if !outcome.is_success() {
            return Ok(outcome);
        }

        self.store
            .upload(&path::keep_key(&path), Bytes::new(), UploadOptions::overwrite())
            .await?;
        info!(path = %path, "Created directory");
        Ok(Outcome::Success)
    }

    /// Upload one object. A replaced object is deleted before the new upload,
    /// so a failure in between loses the entry. If the old object cannot be
    /// deleted the upload is not attempted and the failed delete is reported.
    pub async fn upload_file(
        &self,
        path: &str,
        bytes: Bytes,
        policy: OverwritePolicy,
    ) -> Result<Outcome, ApiError> {
        let path = non_root(path)?;
        let outcome = self.clear_existing(&path, policy).await?;
        if !outcome.is_success() {
            return Ok(outcome);
        }

        let size = bytes.len();
        self.store
            .upload(&path, bytes, UploadOptions::create_only())
            .await?;
        info!(path = %path, size, "Uploaded file");
        Ok(Outcome::Success)
    }

    /// Delete a file, or a directory with everything below it.
    ///
    /// Descendants are fully collected before one batch delete is issued. A
    /// directory with nothing below it is already gone and costs no delete.
    pub async fn delete_recursive(
        &self,
        path: &str,
        is_directory: bool,
    ) -> Result<Outcome, ApiError> {
        let path = non_root(path)?;
        let keys = if is_directory {
            self.collect_descendants(&path).await
        } else {
            vec![path.clone()]
        };
        if keys.is_empty() {
            debug!(path = %path, "Nothing to delete");
            return Ok(Outcome::Success);
        }

        let failed = self.store.delete_many(&keys).await?;
        if failed.is_empty() {
            info!(path = %path, keys = keys.len(), "Deleted");
        } else {
            warn!(
                path = %path,
                failed = failed.len(),
                total = keys.len(),
                "Batch delete partially failed"
            );
        }
        Ok(Outcome::from_failures(
            failed
                .into_iter()
                .map(|key| FailedStep::new(key, Step::Delete, "rejected by store"))
                .collect(),
        ))
    }

    /// Rename a node within its parent directory.
    ///
    /// The new name is sanitised; an empty or unchanged name does nothing.
    pub async fn rename(
        &self,
        node: &Node,
        new_name: &str,
        policy: OverwritePolicy,
    ) -> Result<Outcome, ApiError> {
        let name = path::sanitize_name(new_name);
        if name.is_empty() || name == node.name {
            return Ok(Outcome::Success);
        }
        let new_path = path::join(path::parent(&node.path), &name);

        let cleared = self.clear_existing(&new_path, policy).await?;
        if !cleared.is_success() {
            return Ok(cleared);
        }
        self.move_path(&node.path, &new_path, node.is_dir()).await
    }

    /// Make room at `path` for a new entry.
    ///
    /// Under `Refuse` an occupied path is a conflict. Under `Replace` the
    /// existing entry is deleted; a `PartialFailure` means it is still there.
    async fn clear_existing(
        &self,
        path: &str,
        policy: OverwritePolicy,
    ) -> Result<Outcome, ApiError> {
        let Some(existing) = self.lookup(path).await? else {
            return Ok(Outcome::Success);
        };
        if policy == OverwritePolicy::Refuse {
            return Err(ApiError::AlreadyExists(path.to_string()));
        }
        let outcome = self.delete_recursive(path, !existing.is_file()).await?;
        if !outcome.is_success() {
            warn!(path = %path, "Existing entry could not be replaced");
        }
        Ok(outcome)
    }
}

/// Normalise a path and refuse the store root as a target
fn non_root(path: &str) -> Result<String, ApiError> {
    let normalized = path::normalize(path);
    if normalized.is_empty() {
        return Err(ApiError::InvalidPath(format!(
            "'{}' refers to the store root",
            path
        )));
    }
    Ok(normalized)
}

fn not_found_or(key: &str, err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(_) => ApiError::NotFound(key.to_string()),
        other => ApiError::StorageError(other),
    }
}
