//! Name search over a tree snapshot

use crate::tree::{Node, NodeKind};

/// Prune `nodes` down to name matches and their ancestor directories.
///
/// Matching is case-insensitive substring containment on the node name only.
/// A kept directory carries only its matching descendants. A blank query
/// returns the forest unchanged.
pub fn filter_tree(nodes: &[Node], query: &str) -> Vec<Node> {
    let query = query.trim();
    if query.is_empty() {
        return nodes.to_vec();
    }
    let needle = query.to_lowercase();
    prune(nodes, &needle)
}

fn name_matches(node: &Node, needle: &str) -> bool {
    node.name.to_lowercase().contains(needle)
}

fn prune(nodes: &[Node], needle: &str) -> Vec<Node> {
    nodes
        .iter()
        .filter_map(|node| match &node.kind {
            NodeKind::Directory { children } => {
                let kept = prune(children, needle);
                if kept.is_empty() && !name_matches(node, needle) {
                    return None;
                }
                Some(Node {
                    path: node.path.clone(),
                    name: node.name.clone(),
                    last_modified: node.last_modified,
                    kind: NodeKind::Directory { children: kept },
                })
            }
            NodeKind::File { .. } => name_matches(node, needle).then(|| node.clone()),
        })
        .collect()
}
