use prefixfs::path;
use prefixfs::store::ObjectMeta;
use prefixfs::tree::{build_tree, count_files, ListedObject, Node};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};

fn segment() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "Jan", "March", "Final Report", "Initial Submission", "misc", "a", "b.pdf", "notes.txt",
    ])
    .prop_map(str::to_string)
}

/// Keys where no key is also used as a directory prefix of another
fn key_set() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::collection::vec(segment(), 1..4), 0..24).prop_map(|paths| {
        let keys: BTreeSet<String> = paths.iter().map(|segments| segments.join("/")).collect();
        keys.iter()
            .filter(|key| !keys.iter().any(|other| path::is_within(other, key)))
            .cloned()
            .collect()
    })
}

fn listed(keys: &[String]) -> Vec<ListedObject> {
    keys.iter()
        .enumerate()
        .map(|(i, key)| ListedObject {
            key: key.clone(),
            meta: ObjectMeta::file(
                i as u64 * 10,
                Utc.timestamp_opt(1_700_000_000 + i as i64 * 60, 0).unwrap(),
                "application/pdf",
            ),
        })
        .collect()
}

fn assert_well_formed(nodes: &[Node], parent: &str) {
    let mut names = HashSet::new();
    for node in nodes {
        assert_eq!(node.path, path::join(parent, &node.name));
        assert!(names.insert(node.name.clone()), "duplicate sibling {}", node.name);
        assert!(!path::is_keep_marker(&node.name));
        assert_well_formed(node.children(), &node.path);
    }
}

proptest! {
    #[test]
    fn built_tree_keeps_paths_and_leaf_count(keys in key_set()) {
        let tree = build_tree(listed(&keys));
        assert_well_formed(&tree, "");
        prop_assert_eq!(count_files(&tree), keys.len());
    }

    #[test]
    fn building_twice_gives_the_same_tree(keys in key_set()) {
        prop_assert_eq!(build_tree(listed(&keys)), build_tree(listed(&keys)));
    }

    #[test]
    fn keep_markers_never_surface(keys in key_set()) {
        let mut objects = listed(&keys);
        for key in &keys {
            let dir = path::parent(key);
            if !dir.is_empty() {
                objects.push(ListedObject {
                    key: path::keep_key(dir),
                    meta: ObjectMeta::file(0, Utc::now(), "application/octet-stream"),
                });
            }
        }
        let tree = build_tree(objects);
        assert_well_formed(&tree, "");
        prop_assert_eq!(count_files(&tree), keys.len());
    }
}
