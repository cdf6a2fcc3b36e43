//! Client-local preferences
//!
//! Only the sort order token is persisted, as `{"sort": "date-desc"}`. The
//! file never lives in the object store.

use crate::config::paths::xdg_root;
use crate::config::PreferencesConfig;
use crate::error::ApiError;
use crate::ordering::SortOrder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    sort: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Preferences {
    path: Option<PathBuf>,
    sort: SortOrder,
}

impl Preferences {
    /// Load from the configured file, or the default under the XDG config home.
    pub fn from_config(config: &PreferencesConfig) -> Result<Self, ApiError> {
        let path = match &config.file {
            Some(path) => path.clone(),
            None => xdg_root::preferences_file()?,
        };
        Ok(Self::load(&path))
    }

    /// Read preferences from `path`. A missing file yields defaults; an
    /// unreadable or malformed one is logged and also yields defaults.
    pub fn load(path: &Path) -> Self {
        let sort = match std::fs::read_to_string(path) {
            Ok(contents) => parse_sort(path, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No preference file, using defaults");
                SortOrder::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read preferences");
                SortOrder::default()
            }
        };
        Self {
            path: Some(path.to_path_buf()),
            sort,
        }
    }

    /// Preferences that are never written anywhere
    pub fn in_memory() -> Self {
        Self {
            path: None,
            sort: SortOrder::default(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort
    }

    /// Change the sort order and persist it immediately.
    pub fn set_sort_order(&mut self, sort: SortOrder) -> Result<(), ApiError> {
        self.sort = sort;
        self.save()
    }

    fn save(&self) -> Result<(), ApiError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = PreferenceFile {
            sort: Some(self.sort.to_string()),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| ApiError::PreferenceError(e.to_string()))?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), sort = %self.sort, "Saved preferences");
        Ok(())
    }
}

fn parse_sort(path: &Path, contents: &str) -> SortOrder {
    let file: PreferenceFile = match serde_json::from_str(contents) {
        Ok(file) => file,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Malformed preference file, using defaults");
            return SortOrder::default();
        }
    };
    match file.sort.as_deref().map(str::parse::<SortOrder>) {
        Some(Ok(sort)) => sort,
        Some(Err(e)) => {
            warn!(path = %path.display(), error = %e, "Ignoring stored sort order");
            SortOrder::default()
        }
        None => SortOrder::default(),
    }
}
