//! Transfers between the local filesystem and the store

use super::{not_found_or, FailedStep, OverwritePolicy, PathOps, Step};
use crate::error::ApiError;
use crate::path;
use bytes::Bytes;
use serde::Serialize;
use std::path::{Component, Path};
use tracing::info;
use walkdir::WalkDir;

/// Per-file result of a bulk upload
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    /// Conflicting files the user declined to replace
    pub skipped: Vec<String>,
    pub failed: Vec<FailedStep>,
}

impl UploadReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl PathOps {
    /// Upload a local file or directory tree below `dest_prefix`.
    ///
    /// A directory keeps its own name and relative layout. For every file that
    /// already exists in the store `confirm` is asked whether to replace it;
    /// declined files are skipped.
    pub async fn upload_local<F>(
        &self,
        source: &Path,
        dest_prefix: &str,
        mut confirm: F,
    ) -> Result<UploadReport, ApiError>
    where
        F: FnMut(&str) -> bool,
    {
        let source = dunce::canonicalize(source)?;
        let base = source.parent().unwrap_or(&source).to_path_buf();
        let dest_prefix = path::normalize(dest_prefix);

        let files: Vec<std::path::PathBuf> = if source.is_file() {
            vec![source.clone()]
        } else {
            WalkDir::new(&source)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .collect()
        };

        let mut report = UploadReport::default();
        for file in files {
            let relative = file.strip_prefix(&base).unwrap_or(&file);
            let key = relative
                .components()
                .filter_map(|component| match component {
                    Component::Normal(part) => Some(path::sanitize_name(&part.to_string_lossy())),
                    _ => None,
                })
                .fold(dest_prefix.clone(), |acc, segment| path::join(&acc, &segment));
            let bytes = Bytes::from(tokio::fs::read(&file).await?);

            let result = match self
                .upload_file(&key, bytes.clone(), OverwritePolicy::Refuse)
                .await
            {
                Err(e) if e.is_conflict() => {
                    if !confirm(&key) {
                        report.skipped.push(key);
                        continue;
                    }
                    self.upload_file(&key, bytes, OverwritePolicy::Replace).await
                }
                other => other,
            };

            match result {
                Ok(outcome) => {
                    report.failed.extend(outcome.into_failed_steps());
                    report.uploaded.push(key);
                }
                Err(e) => report.failed.push(FailedStep::new(key, Step::Upload, e)),
            }
        }

        info!(
            uploaded = report.uploaded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Local upload finished"
        );
        Ok(report)
    }

    /// Download one object to a local file, creating parent directories.
    pub async fn download_to(&self, key: &str, dest: &Path) -> Result<u64, ApiError> {
        let key = path::normalize(key);
        let bytes = self
            .store
            .download(&key)
            .await
            .map_err(|e| not_found_or(&key, e))?;
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(dest, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}
