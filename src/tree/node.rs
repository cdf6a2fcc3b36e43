//! Reconstructed tree nodes

use crate::path;
use crate::store::ObjectMeta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File or directory payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    File {
        size: u64,
        content_kind: Option<String>,
    },
    Directory {
        children: Vec<Node>,
    },
}

/// Node of the in-memory snapshot
///
/// `path` is the full key and doubles as the node's identity. For directories
/// `last_modified` is derived from descendant files and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub path: String,
    pub name: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub kind: NodeKind,
}

impl Node {
    pub fn file(key: &str, meta: &ObjectMeta) -> Self {
        Self {
            path: key.to_string(),
            name: path::file_name(key).to_string(),
            last_modified: meta.last_modified,
            kind: NodeKind::File {
                size: meta.size,
                content_kind: meta.content_kind.clone(),
            },
        }
    }

    pub fn directory(key: &str) -> Self {
        Self {
            path: key.to_string(),
            name: path::file_name(key).to_string(),
            last_modified: None,
            kind: NodeKind::Directory {
                children: Vec::new(),
            },
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir()
    }

    /// File size; directories report zero
    pub fn size(&self) -> u64 {
        match &self.kind {
            NodeKind::File { size, .. } => *size,
            NodeKind::Directory { .. } => 0,
        }
    }

    pub fn content_kind(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { content_kind, .. } => content_kind.as_deref(),
            NodeKind::Directory { .. } => None,
        }
    }

    /// Children of a directory; empty for files
    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Directory { children } => children,
            NodeKind::File { .. } => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match &mut self.kind {
            NodeKind::Directory { children } => Some(children),
            NodeKind::File { .. } => None,
        }
    }
}

/// Depth-first lookup by full path
pub fn find_node<'a>(nodes: &'a [Node], key: &str) -> Option<&'a Node> {
    for node in nodes {
        if node.path == key {
            return Some(node);
        }
        if path::is_within(key, &node.path) {
            if let Some(found) = find_node(node.children(), key) {
                return Some(found);
            }
        }
    }
    None
}

/// Number of file nodes in a forest
pub fn count_files(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .map(|node| match &node.kind {
            NodeKind::File { .. } => 1,
            NodeKind::Directory { children } => count_files(children),
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_with(key: &str, children: Vec<Node>) -> Node {
        let mut node = Node::directory(key);
        *node.children_mut().unwrap() = children;
        node
    }

    fn file(key: &str) -> Node {
        Node::file(key, &ObjectMeta::file(4, Utc::now(), "text/plain"))
    }

    #[test]
    fn test_find_node_descends_only_matching_branches() {
        let tree = vec![
            dir_with("a", vec![dir_with("a/b", vec![file("a/b/c.txt")])]),
            dir_with("ab", vec![file("ab/d.txt")]),
        ];
        assert_eq!(find_node(&tree, "a/b/c.txt").unwrap().name, "c.txt");
        assert_eq!(find_node(&tree, "ab/d.txt").unwrap().name, "d.txt");
        assert!(find_node(&tree, "a/d.txt").is_none());
    }

    #[test]
    fn test_count_files() {
        let tree = vec![
            dir_with("a", vec![file("a/x"), dir_with("a/empty", vec![])]),
            file("top"),
        ];
        assert_eq!(count_files(&tree), 2);
    }

    #[test]
    fn test_directory_accessors() {
        let node = Node::directory("reports/2024");
        assert_eq!(node.name, "2024");
        assert!(node.is_dir());
        assert_eq!(node.size(), 0);
        assert!(node.content_kind().is_none());
        assert!(node.children().is_empty());
    }
}
