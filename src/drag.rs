//! Drag-and-drop moves
//!
//! Planning is pure so a caller can show the effect of a drop before any
//! store call is made.

use crate::error::ApiError;
use crate::ops::{Outcome, PathOps};
use crate::path;
use crate::tree::Node;
use tracing::debug;

/// Where a dragged node was released
#[derive(Debug, Clone, Copy)]
pub enum DropTarget<'a> {
    Node(&'a Node),
    /// Empty space in the browsed directory
    Canvas,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPlan {
    /// The node would land where it already is
    Unchanged,
    IntoOwnSubtree { from: String, to: String },
    Move {
        from: String,
        to: String,
        is_directory: bool,
    },
}

/// Directory a drop on `target` places things into
pub fn destination_prefix(target: DropTarget<'_>, current_dir: &str) -> String {
    match target {
        DropTarget::Node(node) if node.is_dir() => node.path.clone(),
        DropTarget::Node(node) => path::parent(&node.path).to_string(),
        DropTarget::Canvas => path::normalize(current_dir),
    }
}

pub fn plan_drop(dragged: &Node, target: DropTarget<'_>, current_dir: &str) -> DropPlan {
    let prefix = destination_prefix(target, current_dir);
    let to = path::join(&prefix, &dragged.name);
    if to == dragged.path {
        return DropPlan::Unchanged;
    }
    if dragged.is_dir() && path::is_within(&to, &dragged.path) {
        return DropPlan::IntoOwnSubtree {
            from: dragged.path.clone(),
            to,
        };
    }
    DropPlan::Move {
        from: dragged.path.clone(),
        to,
        is_directory: dragged.is_dir(),
    }
}

/// Plan and run a drop. An unchanged drop touches nothing; a drop into the
/// node's own subtree is rejected before any store call.
pub async fn execute_drop(
    ops: &PathOps,
    dragged: &Node,
    target: DropTarget<'_>,
    current_dir: &str,
) -> Result<Outcome, ApiError> {
    match plan_drop(dragged, target, current_dir) {
        DropPlan::Unchanged => {
            debug!(path = %dragged.path, "Drop left node in place");
            Ok(Outcome::Success)
        }
        DropPlan::IntoOwnSubtree { from, to } => Err(ApiError::CycleRejected { from, to }),
        DropPlan::Move {
            from,
            to,
            is_directory,
        } => ops.move_path(&from, &to, is_directory).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::{keys, seeded};
    use crate::store::ObjectMeta;
    use chrono::Utc;

    fn file(path: &str) -> Node {
        Node::file(path, &ObjectMeta::file(3, Utc::now(), "text/plain"))
    }

    #[test]
    fn test_destination_depends_on_target_kind() {
        let dragged = file("inbox/a.txt");
        let folder = Node::directory("2024/Jan");
        let sibling = file("2024/Feb/notes.txt");
        let root_file = file("readme.txt");

        assert_eq!(
            plan_drop(&dragged, DropTarget::Node(&folder), ""),
            DropPlan::Move {
                from: "inbox/a.txt".to_string(),
                to: "2024/Jan/a.txt".to_string(),
                is_directory: false,
            }
        );
        assert!(matches!(
            plan_drop(&dragged, DropTarget::Node(&sibling), ""),
            DropPlan::Move { ref to, .. } if to == "2024/Feb/a.txt"
        ));
        assert!(matches!(
            plan_drop(&dragged, DropTarget::Node(&root_file), "inbox/deep"),
            DropPlan::Move { ref to, .. } if to == "a.txt"
        ));
        assert!(matches!(
            plan_drop(&dragged, DropTarget::Canvas, "archive"),
            DropPlan::Move { ref to, .. } if to == "archive/a.txt"
        ));
    }

    #[test]
    fn test_drop_in_place_is_unchanged() {
        let dragged = file("inbox/a.txt");
        let sibling = file("inbox/b.txt");
        assert_eq!(
            plan_drop(&dragged, DropTarget::Node(&sibling), ""),
            DropPlan::Unchanged
        );
        assert_eq!(
            plan_drop(&dragged, DropTarget::Canvas, "inbox"),
            DropPlan::Unchanged
        );
    }

    #[test]
    fn test_directory_onto_itself_or_descendant_is_rejected() {
        let dragged = Node::directory("a/b");
        let inner = Node::directory("a/b/c");
        assert!(matches!(
            plan_drop(&dragged, DropTarget::Node(&dragged), ""),
            DropPlan::IntoOwnSubtree { .. }
        ));
        assert!(matches!(
            plan_drop(&dragged, DropTarget::Node(&inner), ""),
            DropPlan::IntoOwnSubtree { ref to, .. } if to == "a/b/c/b"
        ));

        // shares a name prefix only
        let neighbour = Node::directory("a/bc");
        assert!(matches!(
            plan_drop(&dragged, DropTarget::Node(&neighbour), ""),
            DropPlan::Move { .. }
        ));
    }

    #[tokio::test]
    async fn test_execute_rejected_drop_makes_no_calls() {
        let (store, ops) = seeded(&["a/b/x.pdf"]).await;
        let dragged = Node::directory("a/b");
        let inner = Node::directory("a/b/c");
        let err = execute_drop(&ops, &dragged, DropTarget::Node(&inner), "")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::CycleRejected { .. }));

        let outcome = execute_drop(&ops, &dragged, DropTarget::Canvas, "a")
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_execute_moves_directory() {
        let (_store, ops) = seeded(&["inbox/Jan/a.pdf", "2024/.keep"]).await;
        let dragged = Node::directory("inbox/Jan");
        let target = Node::directory("2024");
        let outcome = execute_drop(&ops, &dragged, DropTarget::Node(&target), "inbox")
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(keys(&ops).await, vec!["2024/.keep", "2024/Jan/a.pdf"]);
    }
}
