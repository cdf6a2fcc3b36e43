//! Tree reconstruction from flat prefix listings
//!
//! `TreeBuilder::list_all` fans out one listing per discovered sub-prefix and
//! joins siblings before returning; `build_tree` folds the flat result into a
//! forest, prunes `.keep` placeholders, derives directory timestamps and
//! applies the default ordering.

use crate::ordering;
use crate::path;
use crate::store::{ObjectMeta, SharedStore};
use crate::tree::node::{Node, NodeKind};
use chrono::{DateTime, Utc};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::collections::HashMap;
use tracing::{debug, warn};

/// One object found by a recursive listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    pub key: String,
    pub meta: ObjectMeta,
}

#[derive(Clone)]
pub struct TreeBuilder {
    store: SharedStore,
    list_limit: usize,
}

impl TreeBuilder {
    pub fn new(store: SharedStore, list_limit: usize) -> Self {
        Self { store, list_limit }
    }

    /// Recursively list every object below `prefix`.
    ///
    /// Entries without a content kind are recursed into concurrently. A failed
    /// listing contributes an empty subtree and is logged.
    pub fn list_all(&self, prefix: &str) -> BoxFuture<'_, Vec<ListedObject>> {
        let prefix = path::normalize(prefix);
        async move {
            let entries = match self.store.list(&prefix, self.list_limit).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        prefix = %prefix,
                        error = %e,
                        "Listing failed, treating subtree as empty"
                    );
                    return Vec::new();
                }
            };

            let mut objects = Vec::new();
            let mut nested = Vec::new();
            for entry in entries {
                let key = path::join(&prefix, &entry.name);
                if entry.meta.is_file() {
                    objects.push(ListedObject {
                        key,
                        meta: entry.meta,
                    });
                } else {
                    nested.push(self.list_all(&key));
                }
            }

            for subtree in join_all(nested).await {
                objects.extend(subtree);
            }
            objects
        }
        .boxed()
    }

    /// Every key below `prefix`, placeholders included
    pub async fn collect_keys(&self, prefix: &str) -> Vec<String> {
        self.list_all(prefix)
            .await
            .into_iter()
            .map(|object| object.key)
            .collect()
    }

    /// List and fold into a default-ordered forest
    pub async fn build(&self, prefix: &str) -> Vec<Node> {
        let objects = self.list_all(prefix).await;
        debug!(prefix = %prefix, objects = objects.len(), "Rebuilding tree");
        build_tree(objects)
    }
}

struct Slot {
    node: Node,
    children: Vec<usize>,
}

/// Fold flat objects into a forest.
///
/// Intermediate directories are created once per distinct prefix, in order of
/// first encounter. When a key needs a directory where a file already sits
/// (or repeats an existing path) the later entry is dropped.
pub fn build_tree(objects: Vec<ListedObject>) -> Vec<Node> {
    let mut slots: Vec<Option<Slot>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();

    'objects: for object in objects {
        let parts: Vec<&str> = object
            .key
            .split(path::SEPARATOR)
            .filter(|part| !part.is_empty())
            .collect();
        let mut current = String::new();
        let mut parent: Option<usize> = None;

        for (i, part) in parts.iter().enumerate() {
            current = path::join(&current, part);
            let is_leaf = i + 1 == parts.len();

            let id = match index.get(&current) {
                Some(&id) => {
                    if is_leaf {
                        debug!(key = %object.key, "Duplicate path in listing, keeping first entry");
                        continue 'objects;
                    }
                    id
                }
                None => {
                    let node = if is_leaf && object.meta.is_file() {
                        Node::file(&current, &object.meta)
                    } else {
                        Node::directory(&current)
                    };
                    let id = slots.len();
                    slots.push(Some(Slot {
                        node,
                        children: Vec::new(),
                    }));
                    index.insert(current.clone(), id);
                    match parent {
                        Some(parent_id) => {
                            if let Some(slot) = slots[parent_id].as_mut() {
                                slot.children.push(id);
                            }
                        }
                        None => roots.push(id),
                    }
                    id
                }
            };

            if !is_leaf && slots[id].as_ref().is_some_and(|slot| slot.node.is_file()) {
                warn!(key = %object.key, file = %current, "Key nests under a file, skipping");
                continue 'objects;
            }
            parent = Some(id);
        }
    }

    let mut forest: Vec<Node> = roots
        .into_iter()
        .filter_map(|id| assemble(id, &mut slots))
        .collect();

    prune_keep_markers(&mut forest);
    for node in forest.iter_mut() {
        derive_timestamp(node);
    }
    ordering::sort_default(&mut forest);
    forest
}

fn assemble(id: usize, slots: &mut Vec<Option<Slot>>) -> Option<Node> {
    let slot = slots.get_mut(id)?.take()?;
    let mut node = slot.node;
    let children: Vec<Node> = slot
        .children
        .into_iter()
        .filter_map(|child| assemble(child, slots))
        .collect();
    if let Some(existing) = node.children_mut() {
        *existing = children;
    }
    Some(node)
}

/// Drop `.keep` nodes at every level
fn prune_keep_markers(nodes: &mut Vec<Node>) {
    nodes.retain(|node| !path::is_keep_marker(&node.name));
    for node in nodes.iter_mut() {
        if let Some(children) = node.children_mut() {
            prune_keep_markers(children);
        }
    }
}

/// Set a directory's timestamp to the newest descendant file, bottom-up
fn derive_timestamp(node: &mut Node) -> Option<DateTime<Utc>> {
    match &mut node.kind {
        NodeKind::File { .. } => node.last_modified,
        NodeKind::Directory { children } => {
            let latest = children.iter_mut().filter_map(derive_timestamp).max();
            node.last_modified = latest;
            latest
        }
    }
}
