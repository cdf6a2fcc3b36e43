use crate::integration::support::all_keys;
use bytes::Bytes;
use prefixfs::config::{OpsConfig, PrefixFsConfig, StoreBackend};
use prefixfs::preferences::Preferences;
use prefixfs::store::{BlobStore, ObjectStoreBlobStore, SharedStore};
use prefixfs::{OverwritePolicy, PathOps, Session};
use std::sync::Arc;
use tempfile::TempDir;

async fn local_session(root: &std::path::Path) -> Session {
    let store: SharedStore = Arc::new(ObjectStoreBlobStore::local(root).unwrap());
    let ops = PathOps::new(store, &OpsConfig::default());
    let mut session = Session::new(ops, Preferences::in_memory());
    session.refresh().await;
    session
}

#[tokio::test]
async fn directories_map_onto_the_local_filesystem() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("store");
    let mut session = local_session(&root).await;

    session
        .create_directory("Reports", OverwritePolicy::Refuse)
        .await
        .unwrap();
    assert!(root.join("Reports").join(".keep").is_file());

    session.enter("Reports").unwrap();
    session
        .upload("q1.pdf", Bytes::from_static(b"%PDF"), OverwritePolicy::Refuse)
        .await
        .unwrap();
    assert_eq!(std::fs::read(root.join("Reports").join("q1.pdf")).unwrap(), b"%PDF");

    let node = session.find_node("Reports/q1.pdf").unwrap();
    assert_eq!(node.size(), 4);
    assert_eq!(node.content_kind(), Some("application/pdf"));
    assert!(session.find_node("Reports").unwrap().last_modified.is_some());
}

#[tokio::test]
async fn moving_a_directory_rewrites_every_object() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("store");
    let mut session = local_session(&root).await;
    for key in ["Jan/a.pdf", "Jan/scans/p1.png"] {
        session
            .ops()
            .upload_file(key, Bytes::from(key.to_string()), OverwritePolicy::Refuse)
            .await
            .unwrap();
    }
    session.refresh().await;

    let outcome = session
        .ops()
        .move_path("Jan", "2024/Jan", true)
        .await
        .unwrap();
    assert!(outcome.is_success());
    assert_eq!(
        all_keys(session.ops()).await,
        vec!["2024/Jan/a.pdf", "2024/Jan/scans/p1.png"]
    );
    assert_eq!(
        session.ops().store().download("2024/Jan/scans/p1.png").await.unwrap(),
        Bytes::from_static(b"Jan/scans/p1.png")
    );
}

#[tokio::test]
async fn local_folder_upload_and_download() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("March");
    std::fs::create_dir_all(source.join("receipts")).unwrap();
    std::fs::write(source.join("summary.txt"), b"summary").unwrap();
    std::fs::write(source.join("receipts").join("r1.pdf"), b"r1").unwrap();

    let mut session = local_session(&temp.path().join("store")).await;
    let report = session.upload_local(&source, |_| false).await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.uploaded.len(), 2);
    assert!(session.find_node("March/receipts/r1.pdf").is_some());

    let out = temp.path().join("out").join("summary.txt");
    let size = session.download_to("March/summary.txt", &out).await.unwrap();
    assert_eq!(size, 7);
    assert_eq!(std::fs::read(out).unwrap(), b"summary");
}

#[tokio::test]
async fn session_opens_from_config_with_public_urls() {
    let temp = TempDir::new().unwrap();
    let mut config = PrefixFsConfig::default();
    config.store.backend = StoreBackend::Local;
    config.store.root = Some(temp.path().join("store"));
    config.store.public_base_url = Some("https://files.example.com/docs".to_string());
    config.preferences.file = Some(temp.path().join("preferences.json"));

    let session = Session::open(&config).await.unwrap();
    let url = session.public_url("Reports/q1 final.pdf").unwrap();
    assert!(url.as_str().starts_with("https://files.example.com/docs/Reports/q1"));
}
