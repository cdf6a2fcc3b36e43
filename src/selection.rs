//! Multi-item selection and the cut/copy buffer
//!
//! The selection holds paths only, so it has to be re-resolved against the
//! latest tree snapshot. The clipboard holds nodes by value, taken at the time
//! of the copy or cut, and survives refreshes.

use crate::error::ApiError;
use crate::ops::{Outcome, PathOps};
use crate::path;
use crate::tree::{find_node, Node};
use std::collections::BTreeSet;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardMode {
    Copy,
    Cut,
}

#[derive(Debug, Clone)]
pub struct Clipboard {
    pub mode: ClipboardMode,
    pub nodes: Vec<Node>,
}

/// Result of pasting one clipboard entry
#[derive(Debug)]
pub struct PasteItem {
    pub source: String,
    pub destination: String,
    pub result: Result<Outcome, ApiError>,
}

impl PasteItem {
    pub fn is_success(&self) -> bool {
        matches!(&self.result, Ok(outcome) if outcome.is_success())
    }
}

#[derive(Debug)]
pub struct PasteReport {
    pub mode: ClipboardMode,
    pub items: Vec<PasteItem>,
}

impl PasteReport {
    pub fn is_success(&self) -> bool {
        self.items.iter().all(PasteItem::is_success)
    }
}

#[derive(Debug, Default)]
pub struct SelectionClipboard {
    selection: BTreeSet<String>,
    clipboard: Option<Clipboard>,
}

impl SelectionClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    pub fn is_selected(&self, path: &str) -> bool {
        self.selection.contains(path)
    }

    /// Flip membership of `path`; returns whether it is now selected.
    pub fn toggle(&mut self, path: &str) -> bool {
        if self.selection.remove(path) {
            false
        } else {
            self.selection.insert(path.to_string());
            true
        }
    }

    pub fn select(&mut self, path: &str) {
        self.selection.insert(path.to_string());
    }

    pub fn deselect(&mut self, path: &str) {
        self.selection.remove(path);
    }

    /// Replace the selection with every node in `nodes` (one level).
    pub fn select_all(&mut self, nodes: &[Node]) {
        self.selection = nodes.iter().map(|node| node.path.clone()).collect();
    }

    pub fn clear(&mut self) {
        self.selection.clear();
    }

    /// Selected paths resolved against `tree`; stale paths are dropped.
    pub fn selected_nodes(&self, tree: &[Node]) -> Vec<Node> {
        self.selection
            .iter()
            .filter_map(|path| find_node(tree, path).cloned())
            .collect()
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    /// Snapshot the selection for copying. Returns the number of nodes taken.
    pub fn copy(&mut self, tree: &[Node]) -> usize {
        self.fill(tree, ClipboardMode::Copy)
    }

    /// Snapshot the selection for moving. Returns the number of nodes taken.
    pub fn cut(&mut self, tree: &[Node]) -> usize {
        self.fill(tree, ClipboardMode::Cut)
    }

    fn fill(&mut self, tree: &[Node], mode: ClipboardMode) -> usize {
        let nodes = self.selected_nodes(tree);
        if nodes.is_empty() {
            return 0;
        }
        let count = nodes.len();
        debug!(?mode, count, "Clipboard filled");
        self.clipboard = Some(Clipboard { mode, nodes });
        count
    }

    /// Apply the clipboard into `current_dir`, each node keeping its name.
    ///
    /// Every entry is attempted even when an earlier one fails. A cut is
    /// consumed by the paste; a copy stays available. Returns `None` when the
    /// clipboard is empty.
    pub async fn paste(&mut self, ops: &PathOps, current_dir: &str) -> Option<PasteReport> {
        let clipboard = self.clipboard.as_ref()?;
        let mode = clipboard.mode;
        let mut items = Vec::with_capacity(clipboard.nodes.len());

        for node in &clipboard.nodes {
            let destination = path::join(current_dir, &node.name);
            let result = match mode {
                ClipboardMode::Copy => ops.copy(node, &destination).await,
                ClipboardMode::Cut => ops.move_path(&node.path, &destination, node.is_dir()).await,
            };
            items.push(PasteItem {
                source: node.path.clone(),
                destination,
                result,
            });
        }

        if mode == ClipboardMode::Cut {
            self.clipboard = None;
        }
        let report = PasteReport { mode, items };
        info!(
            ?mode,
            items = report.items.len(),
            success = report.is_success(),
            "Paste finished"
        );
        Some(report)
    }

    /// Called after every tree rebuild.
    pub fn on_refresh(&mut self) {
        self.selection.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::{keys, seeded};
    use crate::store::StoreCall;

    async fn tree(ops: &PathOps) -> Vec<Node> {
        ops.tree_builder().build("").await
    }

    #[tokio::test]
    async fn test_copy_paste_keeps_clipboard() {
        let (_store, ops) = seeded(&["src/a.txt", "src/dir/b.txt", "dst/.keep"]).await;
        let snapshot = tree(&ops).await;

        let mut sc = SelectionClipboard::new();
        sc.select("src/a.txt");
        sc.select("src/dir");
        assert_eq!(sc.copy(&snapshot), 2);

        let report = sc.paste(&ops, "dst").await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.mode, ClipboardMode::Copy);
        assert!(sc.clipboard().is_some());
        assert_eq!(
            keys(&ops).await,
            vec![
                "dst/.keep",
                "dst/a.txt",
                "dst/dir/b.txt",
                "src/a.txt",
                "src/dir/b.txt"
            ]
        );
    }

    #[tokio::test]
    async fn test_cut_paste_moves_and_clears_clipboard() {
        let (_store, ops) = seeded(&["src/a.txt", "dst/.keep"]).await;
        let snapshot = tree(&ops).await;

        let mut sc = SelectionClipboard::new();
        sc.toggle("src/a.txt");
        sc.cut(&snapshot);
        let report = sc.paste(&ops, "dst").await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.items[0].destination, "dst/a.txt");
        assert!(sc.clipboard().is_none());
        assert_eq!(keys(&ops).await, vec!["dst/.keep", "dst/a.txt"]);
        assert!(sc.paste(&ops, "dst").await.is_none());
    }

    #[tokio::test]
    async fn test_paste_continues_past_failures() {
        let (store, ops) = seeded(&["a.txt", "b.txt", "dst/a.txt"]).await;
        let snapshot = tree(&ops).await;

        let mut sc = SelectionClipboard::new();
        sc.select_all(&snapshot);
        sc.deselect("dst");
        sc.copy(&snapshot);
        store.clear_calls();

        let report = sc.paste(&ops, "dst").await.unwrap();
        assert!(!report.is_success());
        let failed: Vec<&str> = report
            .items
            .iter()
            .filter(|item| !item.is_success())
            .map(|item| item.source.as_str())
            .collect();
        assert_eq!(failed, vec!["a.txt"]);
        assert!(store
            .calls()
            .iter()
            .any(|call| matches!(call, StoreCall::Upload(key) if key == "dst/b.txt")));
    }

    #[tokio::test]
    async fn test_selection_resolves_against_snapshot() {
        let (_store, ops) = seeded(&["x.txt"]).await;
        let snapshot = tree(&ops).await;

        let mut sc = SelectionClipboard::new();
        sc.select("x.txt");
        sc.select("gone.txt");
        assert_eq!(sc.selected_nodes(&snapshot).len(), 1);
        assert_eq!(sc.copy(&snapshot), 1);

        sc.on_refresh();
        assert!(sc.selection().is_empty());
        assert!(sc.clipboard().is_some());
        assert_eq!(sc.copy(&snapshot), 0);
    }

    #[test]
    fn test_toggle() {
        let mut sc = SelectionClipboard::new();
        assert!(sc.toggle("a"));
        assert!(sc.is_selected("a"));
        assert!(!sc.toggle("a"));
        assert!(!sc.is_selected("a"));
    }
}
