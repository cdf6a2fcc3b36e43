use crate::integration::support::{all_keys, memory_session};
use bytes::Bytes;
use prefixfs::ordering::{SortDirection, SortKey, SortOrder};
use prefixfs::{ApiError, OverwritePolicy};

fn names(nodes: &[prefixfs::Node]) -> Vec<String> {
    nodes.iter().map(|n| n.name.clone()).collect()
}

#[tokio::test]
async fn default_order_puts_initial_first_months_next_and_final_last() {
    let session = memory_session(&[
        "Initial Submission/.keep",
        "March/.keep",
        "Jan/.keep",
        "Final Report/.keep",
        "Zebra/.keep",
    ])
    .await;
    assert_eq!(
        names(&session.browse_view()),
        vec!["Initial Submission", "Jan", "March", "Zebra", "Final Report"]
    );
}

#[tokio::test]
async fn search_keeps_matching_branch_only() {
    let mut session = memory_session(&["Final Report/draft.pdf", "Misc/photo.png"]).await;
    session.set_search("report");
    assert_eq!(names(&session.management_view()), vec!["Final Report"]);
}

#[tokio::test]
async fn recursive_delete_removes_every_descendant() {
    let mut session = memory_session(&["a/x", "a/y/.keep", "a/z/w", "b.txt"]).await;
    let keys = session.ops().collect_descendants("a").await;
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(sorted, vec!["a/x", "a/y/.keep", "a/z/w"]);

    let outcome = session.delete("a").await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(all_keys(session.ops()).await, vec!["b.txt"]);
    assert!(session.find_node("a").is_none());
}

#[tokio::test]
async fn move_into_own_subtree_changes_nothing() {
    let session = memory_session(&["a/b/x.pdf"]).await;
    let err = session.ops().move_path("a/b", "a/b/c", true).await.unwrap_err();
    assert!(matches!(err, ApiError::CycleRejected { .. }));
    assert_eq!(all_keys(session.ops()).await, vec!["a/b/x.pdf"]);
}

#[tokio::test]
async fn empty_directory_survives_refresh() {
    let mut session = memory_session(&[]).await;
    session
        .create_directory("Drafts", OverwritePolicy::Refuse)
        .await
        .unwrap();
    let node = session.find_node("Drafts").unwrap();
    assert!(node.is_dir());
    assert!(node.children().is_empty());

    let err = session
        .create_directory("Drafts", OverwritePolicy::Refuse)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn rename_directory_moves_whole_subtree() {
    let mut session = memory_session(&["2023/Jan/a.pdf", "2023/Feb/.keep"]).await;
    let outcome = session
        .rename("2023", "2024", OverwritePolicy::Refuse)
        .await
        .unwrap();
    assert!(outcome.is_success());
    assert_eq!(
        all_keys(session.ops()).await,
        vec!["2024/Feb/.keep", "2024/Jan/a.pdf"]
    );
}

#[tokio::test]
async fn cut_and_paste_into_browsed_directory() {
    let mut session = memory_session(&["inbox/a.pdf", "inbox/b.pdf", "archive/.keep"]).await;
    session.enter("inbox").unwrap();
    session.select_all();
    assert_eq!(session.cut_selection(), 2);

    session.up();
    session.enter("archive").unwrap();
    let report = session.paste().await.unwrap();
    assert!(report.is_success());
    assert!(session.selection().clipboard().is_none());
    assert_eq!(
        all_keys(session.ops()).await,
        vec!["archive/.keep", "archive/a.pdf", "archive/b.pdf"]
    );
    // inbox emptied out and disappeared
    assert!(session.find_node("inbox").is_none());
}

#[tokio::test]
async fn drop_on_canvas_moves_into_current_directory() {
    let mut session = memory_session(&["loose.pdf", "docs/.keep"]).await;
    session.enter("docs").unwrap();
    let outcome = session.drop_onto("loose.pdf", None).await.unwrap();
    assert!(outcome.is_success());
    assert!(session.find_node("docs/loose.pdf").is_some());
    assert_eq!(session.current_dir(), "docs");
}

#[tokio::test]
async fn management_view_follows_saved_sort_order() {
    let mut session = memory_session(&[]).await;
    session
        .upload("small.txt", Bytes::from_static(b"1"), OverwritePolicy::Refuse)
        .await
        .unwrap();
    session
        .upload("large.txt", Bytes::from(vec![0u8; 4096]), OverwritePolicy::Refuse)
        .await
        .unwrap();
    session
        .set_sort_order(SortOrder::new(SortKey::Size, SortDirection::Desc))
        .unwrap();
    assert_eq!(names(&session.management_view()), vec!["large.txt", "small.txt"]);
    session
        .set_sort_order(SortOrder::new(SortKey::Size, SortDirection::Asc))
        .unwrap();
    assert_eq!(names(&session.management_view()), vec!["small.txt", "large.txt"]);
}
