//! Virtual folder tree
//!
//! The tree is a read-only snapshot of the store. It is rebuilt wholesale after
//! every mutation and never patched in place.

pub mod builder;
pub mod node;

pub use builder::{build_tree, ListedObject, TreeBuilder};
pub use node::{count_files, find_node, Node, NodeKind};
