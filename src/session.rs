//! Browsing session
//!
//! Owns the explicit state a user works against: the latest tree snapshot,
//! the folder stack, the selection and clipboard, the search query and the
//! persisted preferences. Every mutating call goes through `PathOps` and is
//! followed by a full rebuild of the snapshot.

use crate::config::PrefixFsConfig;
use crate::drag::{self, DropTarget};
use crate::error::ApiError;
use crate::ops::{FailedStep, OverwritePolicy, Outcome, PathOps, Step, UploadReport};
use crate::ordering::SortOrder;
use crate::path;
use crate::preferences::Preferences;
use crate::search::filter_tree;
use crate::selection::{PasteReport, SelectionClipboard};
use crate::store::{ObjectStoreBlobStore, SharedStore};
use crate::tree::{find_node, Node};
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

pub struct Session {
    ops: PathOps,
    preferences: Preferences,
    tree: Vec<Node>,
    folder_stack: Vec<String>,
    selection: SelectionClipboard,
    search: String,
}

impl Session {
    /// Build the configured store, load preferences and take a first snapshot.
    pub async fn open(config: &PrefixFsConfig) -> Result<Self, ApiError> {
        let store: SharedStore = Arc::new(ObjectStoreBlobStore::from_config(&config.store)?);
        let preferences = Preferences::from_config(&config.preferences)?;
        let mut session = Self::new(PathOps::new(store, &config.ops), preferences);
        session.refresh().await;
        info!(
            backend = ?config.store.backend,
            nodes = session.tree.len(),
            "Session opened"
        );
        Ok(session)
    }

    /// Session with an empty snapshot; call `refresh` before browsing.
    pub fn new(ops: PathOps, preferences: Preferences) -> Self {
        Self {
            ops,
            preferences,
            tree: Vec::new(),
            folder_stack: Vec::new(),
            selection: SelectionClipboard::new(),
            search: String::new(),
        }
    }

    pub fn ops(&self) -> &PathOps {
        &self.ops
    }

    pub fn tree(&self) -> &[Node] {
        &self.tree
    }

    /// Rebuild the snapshot from the store.
    ///
    /// Clears the selection and drops folder stack entries that no longer
    /// resolve to a directory.
    pub async fn refresh(&mut self) {
        self.tree = self.ops.tree_builder().build("").await;
        self.selection.on_refresh();

        let tree = &self.tree;
        let valid = self
            .folder_stack
            .iter()
            .take_while(|dir| find_node(tree, dir).map(Node::is_dir).unwrap_or(false))
            .count();
        if valid < self.folder_stack.len() {
            debug!(
                kept = valid,
                dropped = self.folder_stack.len() - valid,
                "Folder stack truncated"
            );
            self.folder_stack.truncate(valid);
        }
    }

    pub fn find_node(&self, path: &str) -> Option<&Node> {
        find_node(&self.tree, &path::normalize(path))
    }

    // Navigation

    pub fn current_dir(&self) -> &str {
        self.folder_stack.last().map(String::as_str).unwrap_or("")
    }

    pub fn folder_stack(&self) -> &[String] {
        &self.folder_stack
    }

    /// Descend into a directory of the current snapshot.
    pub fn enter(&mut self, dir: &str) -> Result<(), ApiError> {
        let dir = path::normalize(dir);
        match self.find_node(&dir).map(Node::is_dir) {
            Some(true) => {
                self.folder_stack.push(dir);
                Ok(())
            }
            Some(false) => Err(ApiError::InvalidPath(format!("'{}' is not a directory", dir))),
            None => Err(ApiError::NotFound(dir)),
        }
    }

    /// Pop one level. Returns false at the root.
    pub fn up(&mut self) -> bool {
        self.folder_stack.pop().is_some()
    }

    pub fn current_children(&self) -> &[Node] {
        let dir = self.current_dir();
        if dir.is_empty() {
            return &self.tree;
        }
        find_node(&self.tree, dir).map(Node::children).unwrap_or(&[])
    }

    /// Children of the current directory in the default domain order
    pub fn browse_view(&self) -> Vec<Node> {
        self.current_children().to_vec()
    }

    /// Children of the current directory filtered by the search query and
    /// ordered by the user's sort preference
    pub fn management_view(&self) -> Vec<Node> {
        let mut nodes = filter_tree(self.current_children(), &self.search);
        self.preferences.sort_order().sort(&mut nodes);
        nodes
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
    }

    pub fn sort_order(&self) -> SortOrder {
        self.preferences.sort_order()
    }

    pub fn set_sort_order(&mut self, sort: SortOrder) -> Result<(), ApiError> {
        self.preferences.set_sort_order(sort)
    }

    // Selection and clipboard

    pub fn selection(&self) -> &SelectionClipboard {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionClipboard {
        &mut self.selection
    }

    pub fn select_all(&mut self) {
        let children = self.current_children().to_vec();
        self.selection.select_all(&children);
    }

    pub fn copy_selection(&mut self) -> usize {
        self.selection.copy(&self.tree)
    }

    pub fn cut_selection(&mut self) -> usize {
        self.selection.cut(&self.tree)
    }

    pub async fn paste(&mut self) -> Option<PasteReport> {
        let current = self.current_dir().to_string();
        let report = self.selection.paste(&self.ops, &current).await?;
        self.refresh().await;
        Some(report)
    }

    /// Delete every selected node. Each node is attempted; failures are
    /// gathered into one outcome.
    pub async fn delete_selected(&mut self) -> Outcome {
        let nodes = self.selection.selected_nodes(&self.tree);
        let mut outcome = Outcome::Success;
        for node in &nodes {
            let result = match self.ops.delete_recursive(&node.path, node.is_dir()).await {
                Ok(done) => done,
                Err(e) => {
                    Outcome::from_failures(vec![FailedStep::new(&node.path, Step::Delete, e)])
                }
            };
            outcome = outcome.merge(result);
        }
        info!(count = nodes.len(), success = outcome.is_success(), "Bulk delete finished");
        self.refresh().await;
        outcome
    }

    /// Drop the node at `dragged` onto another node, or onto the empty
    /// canvas of the current directory when `target` is `None`.
    pub async fn drop_onto(
        &mut self,
        dragged: &str,
        target: Option<&str>,
    ) -> Result<Outcome, ApiError> {
        let dragged = self
            .find_node(dragged)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(dragged.to_string()))?;
        let target = match target {
            Some(path) => Some(
                self.find_node(path)
                    .cloned()
                    .ok_or_else(|| ApiError::NotFound(path.to_string()))?,
            ),
            None => None,
        };
        let target = match &target {
            Some(node) => DropTarget::Node(node),
            None => DropTarget::Canvas,
        };
        let current = self.current_dir().to_string();
        let result = drag::execute_drop(&self.ops, &dragged, target, &current).await;
        self.refresh_after(result).await
    }

    // Mutations in the current directory

    /// Create a directory named `name` inside the current directory.
    pub async fn create_directory(
        &mut self,
        name: &str,
        policy: OverwritePolicy,
    ) -> Result<Outcome, ApiError> {
        let target = self.child_path(name)?;
        let result = self.ops.create_directory(&target, policy).await;
        self.refresh_after(result).await
    }

    /// Upload bytes as `name` inside the current directory.
    pub async fn upload(
        &mut self,
        name: &str,
        bytes: Bytes,
        policy: OverwritePolicy,
    ) -> Result<Outcome, ApiError> {
        let target = self.child_path(name)?;
        let result = self.ops.upload_file(&target, bytes, policy).await;
        self.refresh_after(result).await
    }

    /// Upload a local file or directory tree into the current directory.
    pub async fn upload_local<F>(
        &mut self,
        source: &Path,
        confirm: F,
    ) -> Result<UploadReport, ApiError>
    where
        F: FnMut(&str) -> bool,
    {
        let current = self.current_dir().to_string();
        let result = self.ops.upload_local(source, &current, confirm).await;
        self.refresh_after(result).await
    }

    pub async fn rename(
        &mut self,
        path: &str,
        new_name: &str,
        policy: OverwritePolicy,
    ) -> Result<Outcome, ApiError> {
        let node = self
            .find_node(path)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(path.to_string()))?;
        let result = self.ops.rename(&node, new_name, policy).await;
        self.refresh_after(result).await
    }

    pub async fn delete(&mut self, path: &str) -> Result<Outcome, ApiError> {
        let node = self
            .find_node(path)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(path.to_string()))?;
        let result = self.ops.delete_recursive(&node.path, node.is_dir()).await;
        self.refresh_after(result).await
    }

    pub async fn download_to(&self, key: &str, dest: &Path) -> Result<u64, ApiError> {
        self.ops.download_to(key, dest).await
    }

    pub fn public_url(&self, key: &str) -> Result<Url, ApiError> {
        Ok(self.ops.store().public_url(&path::normalize(key))?)
    }

    fn child_path(&self, name: &str) -> Result<String, ApiError> {
        let name = path::sanitize_name(name);
        if name.is_empty() {
            return Err(ApiError::InvalidPath("name is empty".to_string()));
        }
        Ok(path::join(self.current_dir(), &name))
    }

    async fn refresh_after<T>(&mut self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        self.refresh().await;
        result
    }
}
