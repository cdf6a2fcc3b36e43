//! Move and copy
//!
//! The store has no rename, so a move is download, clear destination, upload,
//! delete source. If the upload fails the source is untouched; if the final
//! delete fails the object exists at both paths and the outcome says so.
//! Directory moves and copies run the per-object procedure over every
//! descendant key, concurrently.

use super::{non_root, not_found_or, FailedStep, Outcome, PathOps, Step};
use crate::error::ApiError;
use crate::path;
use crate::store::UploadOptions;
use crate::tree::Node;
use bytes::Bytes;
use futures::{stream, StreamExt};
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Move,
    Copy,
}

impl PathOps {
    /// Move a file or directory to `new_path`.
    ///
    /// Moving onto itself is a no-op with no store calls. A directory cannot
    /// be moved below itself.
    pub async fn move_path(
        &self,
        old_path: &str,
        new_path: &str,
        is_directory: bool,
    ) -> Result<Outcome, ApiError> {
        let from = path::normalize(old_path);
        let to = path::normalize(new_path);
        if from == to {
            debug!(path = %from, "Move onto itself, nothing to do");
            return Ok(Outcome::Success);
        }
        let from = non_root(&from)?;
        let to = non_root(&to)?;
        if is_directory && path::is_within(&to, &from) {
            return Err(ApiError::CycleRejected { from, to });
        }

        if !is_directory {
            let bytes = self
                .store
                .download(&from)
                .await
                .map_err(|e| not_found_or(&from, e))?;
            let failed = self.finish_transfer(&from, &to, bytes, Mode::Move).await;
            return Ok(self.report("move", &from, &to, failed));
        }

        let keys = self.collect_descendants(&from).await;
        if keys.is_empty() {
            return Err(ApiError::NotFound(from));
        }
        let (mut failed, stranded) = self.transfer_all(&keys, &from, &to, Mode::Move).await;

        // Runs only after every descendant transfer has finished.
        self.sweep_source(&from, &stranded, &mut failed).await?;
        Ok(self.report("move", &from, &to, failed))
    }

    /// Copy `node` to `dest_path`. The source is never deleted.
    pub async fn copy(&self, node: &Node, dest_path: &str) -> Result<Outcome, ApiError> {
        self.copy_path(&node.path, dest_path, node.is_dir()).await
    }

    /// Copy a file or directory. Existing destination objects are not
    /// overwritten; each conflict is reported as a failed upload.
    pub async fn copy_path(
        &self,
        source: &str,
        dest_path: &str,
        is_directory: bool,
    ) -> Result<Outcome, ApiError> {
        let from = non_root(source)?;
        let to = non_root(dest_path)?;
        if from == to {
            return Err(ApiError::AlreadyExists(to));
        }
        if is_directory && path::is_within(&to, &from) {
            return Err(ApiError::CycleRejected { from, to });
        }

        if !is_directory {
            let bytes = self
                .store
                .download(&from)
                .await
                .map_err(|e| not_found_or(&from, e))?;
            let failed = self.finish_transfer(&from, &to, bytes, Mode::Copy).await;
            return Ok(self.report("copy", &from, &to, failed));
        }

        let keys = self.collect_descendants(&from).await;
        if keys.is_empty() {
            return Err(ApiError::NotFound(from));
        }
        let (failed, _) = self.transfer_all(&keys, &from, &to, Mode::Copy).await;
        Ok(self.report("copy", &from, &to, failed))
    }

    /// Transfer every key under `from`. Returns the failed steps and the
    /// source keys whose object never landed at the destination.
    async fn transfer_all(
        &self,
        keys: &[String],
        from: &str,
        to: &str,
        mode: Mode,
    ) -> (Vec<FailedStep>, HashSet<String>) {
        let results: Vec<(&String, Vec<FailedStep>)> = stream::iter(keys)
            .map(|key| async move {
                let dest = path::rebase(key, from, to)
                    .unwrap_or_else(|| path::join(to, path::file_name(key)));
                (key, self.transfer_object(key, &dest, mode).await)
            })
            .buffer_unordered(self.transfer_concurrency)
            .collect()
            .await;

        let mut failed = Vec::new();
        let mut stranded = HashSet::new();
        for (source, steps) in results {
            if steps
                .iter()
                .any(|step| matches!(step.step, Step::Download | Step::Upload))
            {
                stranded.insert(source.clone());
            }
            failed.extend(steps);
        }
        (failed, stranded)
    }

    async fn transfer_object(&self, src: &str, dest: &str, mode: Mode) -> Vec<FailedStep> {
        match self.store.download(src).await {
            Ok(bytes) => self.finish_transfer(src, dest, bytes, mode).await,
            Err(e) => vec![FailedStep::new(src, Step::Download, e)],
        }
    }

    async fn finish_transfer(
        &self,
        src: &str,
        dest: &str,
        bytes: Bytes,
        mode: Mode,
    ) -> Vec<FailedStep> {
        match mode {
            Mode::Move => {
                // absent destinations make this fail, which is fine
                if let Ok(rejected) = self.store.delete_many(&[dest.to_string()]).await {
                    if !rejected.is_empty() {
                        debug!(key = %dest, "No existing destination object to clear");
                    }
                }
                if let Err(e) = self
                    .store
                    .upload(dest, bytes, UploadOptions::overwrite())
                    .await
                {
                    return vec![FailedStep::new(dest, Step::Upload, e)];
                }
                match self.store.delete_many(&[src.to_string()]).await {
                    Ok(rejected) if rejected.is_empty() => Vec::new(),
                    Ok(_) => vec![FailedStep::new(
                        src,
                        Step::DeleteSource,
                        format!("source left in place, duplicated at '{}'", dest),
                    )],
                    Err(e) => vec![FailedStep::new(src, Step::DeleteSource, e)],
                }
            }
            Mode::Copy => match self
                .store
                .upload(dest, bytes, UploadOptions::create_only())
                .await
            {
                Ok(()) => Vec::new(),
                Err(e) => vec![FailedStep::new(dest, Step::Upload, e)],
            },
        }
    }

    /// Remove placeholders left under a moved directory prefix.
    ///
    /// `stranded` holds source keys whose transfer never landed; they are
    /// left alone. A marker that is removed here no longer counts as
    /// duplicated.
    async fn sweep_source(
        &self,
        from: &str,
        stranded: &HashSet<String>,
        failed: &mut Vec<FailedStep>,
    ) -> Result<(), ApiError> {
        let leftovers: Vec<String> = self
            .collect_descendants(from)
            .await
            .into_iter()
            .filter(|key| {
                path::is_keep_marker(path::file_name(key)) && !stranded.contains(key)
            })
            .collect();
        if leftovers.is_empty() {
            return Ok(());
        }

        let rejected: HashSet<String> = self
            .store
            .delete_many(&leftovers)
            .await?
            .into_iter()
            .collect();
        let swept: HashSet<&String> = leftovers
            .iter()
            .filter(|key| !rejected.contains(*key))
            .collect();
        failed.retain(|step| !(step.step == Step::DeleteSource && swept.contains(&step.key)));
        for key in rejected {
            if !failed.iter().any(|step| step.key == key) {
                failed.push(FailedStep::new(key, Step::DeleteSource, "placeholder left behind"));
            }
        }
        Ok(())
    }

    fn report(&self, what: &str, from: &str, to: &str, failed: Vec<FailedStep>) -> Outcome {
        if failed.is_empty() {
            info!(from = %from, to = %to, "Completed {}", what);
        } else {
            warn!(
                from = %from,
                to = %to,
                failed = failed.len(),
                "{} finished with failures",
                what
            );
        }
        Outcome::from_failures(failed)
    }
}
