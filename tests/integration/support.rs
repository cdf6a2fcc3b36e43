use bytes::Bytes;
use prefixfs::config::OpsConfig;
use prefixfs::preferences::Preferences;
use prefixfs::store::{BlobStore, ObjectStoreBlobStore, RecordingStore, SharedStore, UploadOptions};
use prefixfs::{PathOps, Session};
use std::sync::Arc;

/// In-memory store holding `keys`, each with a small text body
pub async fn memory_store(keys: &[&str]) -> SharedStore {
    let store: SharedStore = Arc::new(ObjectStoreBlobStore::in_memory());
    for key in keys {
        let body = Bytes::from(format!("body of {}", key));
        store
            .upload(key, body, UploadOptions::overwrite())
            .await
            .unwrap();
    }
    store
}

/// Refreshed session over an in-memory store
pub async fn memory_session(keys: &[&str]) -> Session {
    let store = memory_store(keys).await;
    let ops = PathOps::new(store, &OpsConfig::default());
    let mut session = Session::new(ops, Preferences::in_memory());
    session.refresh().await;
    session
}

/// Refreshed session over a recording store, for failure injection
pub async fn recording_session(keys: &[&str]) -> (Arc<RecordingStore>, Session) {
    let store = Arc::new(RecordingStore::new(memory_store(keys).await));
    let shared: SharedStore = store.clone();
    let ops = PathOps::new(shared, &OpsConfig::default());
    let mut session = Session::new(ops, Preferences::in_memory());
    session.refresh().await;
    (store, session)
}

/// Every key in the store, sorted
pub async fn all_keys(ops: &PathOps) -> Vec<String> {
    let mut keys = ops.collect_descendants("").await;
    keys.sort();
    keys
}
