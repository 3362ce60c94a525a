//! Restart round-trips

use serde_json::json;

use crate::common::*;

#[test]
fn clean_restart_preserves_search_results() {
    let mut ts = TestStore::with_config(8, |c| c.max_distance = 3.0);
    for i in 0..15u64 {
        ts.store
            .add_feature(&format!("img{i}"), &seeded_vector(8, i), Metadata::new())
            .unwrap();
    }
    let query = seeded_vector(8, 3);
    let before = ts.store.search_similar(&query, 10).unwrap();

    ts.reopen();

    let after = ts.store.search_similar(&query, 10).unwrap();
    assert_eq!(before, after);
    assert_eq!(ts.store.stats().total_vectors, 15);
}

#[test]
fn metadata_is_written_verbatim_in_dense_order() {
    let mut ts = TestStore::new(4);
    ts.store
        .add_feature("tom", &axis(4, 0), meta(json!({"zeta": 1, "alpha": [true, null]})))
        .unwrap();
    ts.store.add_feature("jerry", &axis(4, 1), Metadata::new()).unwrap();
    ts.reopen();

    let doc: serde_json::Value =
        serde_json::from_slice(&std::fs::read(ts.metadata_path()).unwrap()).unwrap();
    let object = doc.as_object().unwrap();
    assert_eq!(object.keys().collect::<Vec<_>>(), vec!["0", "1"]);
    assert_eq!(doc["0"]["feature_id"], "tom");
    assert_eq!(doc["1"]["feature_id"], "jerry");

    let keys: Vec<&String> = doc["0"]["metadata"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["zeta", "alpha"]);
    assert_eq!(doc["0"]["metadata"]["alpha"], json!([true, null]));
}

#[test]
fn removal_is_persisted_immediately() {
    let mut ts = TestStore::with_config(4, |c| c.max_distance = 2.0);
    ts.store.add_feature("a", &axis(4, 0), Metadata::new()).unwrap();
    ts.store.add_feature("b", &axis(4, 1), Metadata::new()).unwrap();
    ts.store.add_feature("c", &axis(4, 2), Metadata::new()).unwrap();
    ts.store.remove_features(&["b"]).unwrap();

    ts.crash_and_reopen();

    assert_eq!(ts.store.stats().total_vectors, 2);
    let hits = ts.store.search_similar(&axis(4, 2), 5).unwrap();
    assert_eq!(hit_ids(&hits), vec!["c", "a"]);
}

#[test]
fn dense_ids_continue_after_restart() {
    let mut ts = TestStore::new(4);
    ts.store.add_feature("a", &axis(4, 0), Metadata::new()).unwrap();
    ts.store.add_feature("b", &axis(4, 1), Metadata::new()).unwrap();
    ts.reopen();

    let id = ts.store.add_feature("c", &axis(4, 2), Metadata::new()).unwrap();
    assert_eq!(id, DenseId::new(2));
}

#[test]
fn empty_store_round_trips() {
    let mut ts = TestStore::new(4);
    ts.store.flush().unwrap();
    ts.reopen();
    assert_eq!(ts.store.stats().total_vectors, 0);
    assert!(ts.store.search_similar(&axis(4, 0), 5).unwrap().is_empty());
}
