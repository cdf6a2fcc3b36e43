//! prefixfs: folders over a flat object store
//!
//! Rebuilds a directory tree from one-level prefix listings and emulates
//! directory operations (create, rename, move, copy, recursive delete) with
//! nothing but list, download, upload and batch delete. Ordering, search,
//! selection/clipboard and drag-and-drop moves work over the rebuilt tree.

pub mod config;
pub mod drag;
pub mod error;
pub mod logging;
pub mod ops;
pub mod ordering;
pub mod path;
pub mod preferences;
pub mod search;
pub mod selection;
pub mod session;
pub mod store;
pub mod tooling;
pub mod tree;

pub use error::{ApiError, StoreError};
pub use ops::{OverwritePolicy, Outcome, PathOps};
pub use session::Session;
pub use store::{BlobStore, ObjectStoreBlobStore, SharedStore};
pub use tree::{Node, NodeKind, TreeBuilder};
