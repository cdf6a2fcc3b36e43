use crate::integration::support::{all_keys, memory_session, recording_session};
use prefixfs::store::BlobStore;
use prefixfs::tooling::cli::{CliContext, Commands};
use prefixfs::ApiError;
use tempfile::TempDir;

async fn cli(keys: &[&str]) -> CliContext {
    CliContext::with_session(memory_session(keys).await, true)
}

async fn keys(cli: &CliContext) -> Vec<String> {
    all_keys(cli.session().ops()).await
}

#[tokio::test]
async fn mkdir_sanitises_and_refuses_duplicates_without_prompting() {
    let mut cli = cli(&[]).await;
    let out = cli
        .execute(&Commands::Mkdir {
            path: "2024/Q1\\drafts".to_string(),
        })
        .await
        .unwrap();
    assert!(out.contains("2024/Q1_drafts"));
    assert_eq!(keys(&cli).await, vec!["2024/Q1_drafts/.keep"]);

    // --yes confirms the replacement
    cli.execute(&Commands::Mkdir {
        path: "2024/Q1_drafts".to_string(),
    })
    .await
    .unwrap();
    assert_eq!(keys(&cli).await, vec!["2024/Q1_drafts/.keep"]);
}

#[tokio::test]
async fn mv_into_directory_uses_drop_rules() {
    let mut cli = cli(&["a.pdf", "b.pdf", "docs/.keep"]).await;
    cli.execute(&Commands::Mv {
        sources: vec!["a.pdf".to_string(), "b.pdf".to_string()],
        dest: "docs".to_string(),
    })
    .await
    .unwrap();
    assert_eq!(keys(&cli).await, vec!["docs/.keep", "docs/a.pdf", "docs/b.pdf"]);

    let err = cli
        .execute(&Commands::Mv {
            sources: vec!["docs".to_string()],
            dest: "docs".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::CycleRejected { .. }));
}

#[tokio::test]
async fn mv_to_new_path_replaces_existing_target() {
    let mut cli = cli(&["draft.pdf", "final.pdf"]).await;
    cli.execute(&Commands::Mv {
        sources: vec!["draft.pdf".to_string()],
        dest: "final.pdf".to_string(),
    })
    .await
    .unwrap();
    assert_eq!(keys(&cli).await, vec!["final.pdf"]);
    let body = cli
        .session()
        .ops()
        .store()
        .download("final.pdf")
        .await
        .unwrap();
    assert_eq!(body, bytes::Bytes::from("body of draft.pdf"));
}

#[tokio::test]
async fn cp_into_directory_and_to_new_path() {
    let mut cli = cli(&["src/a.txt", "dst/.keep"]).await;
    cli.execute(&Commands::Cp {
        sources: vec!["src".to_string()],
        dest: "dst".to_string(),
    })
    .await
    .unwrap();
    cli.execute(&Commands::Cp {
        sources: vec!["src/a.txt".to_string()],
        dest: "copy.txt".to_string(),
    })
    .await
    .unwrap();
    assert_eq!(
        keys(&cli).await,
        vec!["copy.txt", "dst/.keep", "dst/src/a.txt", "src/a.txt"]
    );
}

#[tokio::test]
async fn rm_reports_missing_paths_and_deletes_recursively() {
    let mut cli = cli(&["a/x", "a/y/.keep", "b.txt"]).await;
    let err = cli
        .execute(&Commands::Rm {
            paths: vec!["a".to_string(), "nope".to_string()],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref missing) if missing == "nope"));
    assert_eq!(keys(&cli).await.len(), 3);

    cli.execute(&Commands::Rm {
        paths: vec!["a".to_string()],
    })
    .await
    .unwrap();
    assert_eq!(keys(&cli).await, vec!["b.txt"]);
}

#[tokio::test]
async fn ls_find_and_tree_render_names() {
    let mut cli = cli(&["Final Report/r.pdf", "Misc/m.png", "Jan/.keep"]).await;
    let tree = cli.execute(&Commands::Tree { path: None }).await.unwrap();
    assert!(tree.contains("Final Report"));
    assert!(tree.contains("r.pdf"));

    let found = cli
        .execute(&Commands::Find {
            query: "report".to_string(),
        })
        .await
        .unwrap();
    assert!(found.contains("Final Report"));
    assert!(!found.contains("Misc"));

    let listing = cli
        .execute(&Commands::Ls {
            path: Some("Misc".to_string()),
            search: None,
            sort: Some("name-asc".to_string()),
        })
        .await
        .unwrap();
    assert!(listing.contains("m.png"));

    let err = cli
        .execute(&Commands::Ls {
            path: None,
            search: None,
            sort: Some("sideways".to_string()),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::PreferenceError(_)));
}

#[tokio::test]
async fn put_get_and_rename_round_trip_through_the_store() {
    let temp = TempDir::new().unwrap();
    let local = temp.path().join("notes.txt");
    std::fs::write(&local, b"hello").unwrap();

    let mut cli = cli(&[]).await;
    cli.execute(&Commands::Put {
        source: local.clone(),
        dest: Some("inbox".to_string()),
    })
    .await
    .unwrap();
    cli.execute(&Commands::Rename {
        path: "inbox/notes.txt".to_string(),
        new_name: "todo.txt".to_string(),
    })
    .await
    .unwrap();
    assert_eq!(keys(&cli).await, vec!["inbox/todo.txt"]);

    let out = temp.path().join("todo.txt");
    cli.execute(&Commands::Get {
        key: "inbox/todo.txt".to_string(),
        dest: out.clone(),
    })
    .await
    .unwrap();
    assert_eq!(std::fs::read(out).unwrap(), b"hello");
}

#[tokio::test]
async fn sort_lists_options_and_marks_current() {
    let mut cli = cli(&[]).await;
    let out = cli.execute(&Commands::Sort { order: None }).await.unwrap();
    assert!(out.lines().any(|line| line.starts_with('*') && line.contains("date-desc")));

    cli.execute(&Commands::Sort {
        order: Some("size-asc".to_string()),
    })
    .await
    .unwrap();
    assert_eq!(cli.session().sort_order().to_string(), "size-asc");
}

#[tokio::test]
async fn rm_partial_failure_is_surfaced_by_finish() {
    let (store, session) = recording_session(&["a/x", "a/y", "b.txt"]).await;
    store.fail_delete("a/y");
    let mut cli = CliContext::with_session(session, true);
    let out = cli
        .execute(&Commands::Rm {
            paths: vec!["a".to_string()],
        })
        .await
        .unwrap();
    assert!(out.contains("a/y"));
    assert_eq!(keys(&cli).await, vec!["a/y", "b.txt"]);

    match cli.finish() {
        Err(ApiError::PartialBatchFailure { failed }) => assert_eq!(failed, vec!["a/y"]),
        other => panic!("unexpected result {:?}", other),
    }
    // failures are reported once
    assert!(cli.finish().is_ok());
}

#[tokio::test]
async fn mv_replace_stops_when_target_cannot_be_deleted() {
    let (store, session) = recording_session(&["draft.pdf", "final.pdf"]).await;
    store.fail_delete("final.pdf");
    let mut cli = CliContext::with_session(session, true);
    cli.execute(&Commands::Mv {
        sources: vec!["draft.pdf".to_string()],
        dest: "final.pdf".to_string(),
    })
    .await
    .unwrap();
    assert_eq!(keys(&cli).await, vec!["draft.pdf", "final.pdf"]);
    let body = store.download("final.pdf").await.unwrap();
    assert_eq!(body, bytes::Bytes::from("body of final.pdf"));
    assert!(matches!(
        cli.finish(),
        Err(ApiError::PartialBatchFailure { .. })
    ));
}

#[tokio::test]
async fn successful_commands_finish_cleanly() {
    let mut cli = cli(&["a.pdf", "docs/.keep"]).await;
    cli.execute(&Commands::Mv {
        sources: vec!["a.pdf".to_string()],
        dest: "docs".to_string(),
    })
    .await
    .unwrap();
    assert!(cli.finish().is_ok());
}
