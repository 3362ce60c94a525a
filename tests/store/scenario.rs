//! Worked scenarios on a 4-dimensional store

use crate::common::*;

fn populate(ts: &TestStore) {
    ts.store.add_feature("x", &[1.0, 0.0, 0.0, 0.0], Metadata::new()).unwrap();
    ts.store.add_feature("y", &[0.0, 1.0, 0.0, 0.0], Metadata::new()).unwrap();
    ts.store.add_feature("xy", &[1.0, 1.0, 0.0, 0.0], Metadata::new()).unwrap();
}

#[test]
fn wide_threshold_returns_all_three_in_distance_order() {
    let ts = TestStore::with_config(4, |c| c.max_distance = 1.5);
    populate(&ts);

    let hits = ts.store.search_similar(&[1.0, 0.0, 0.0, 0.0], 3).unwrap();
    assert_eq!(hit_ids(&hits), vec!["x", "xy", "y"]);
    assert!(hits[0].distance.abs() < 1e-6);
    assert!((hits[1].distance - 0.765).abs() < 1e-3);
    assert!((hits[2].distance - 1.414).abs() < 1e-3);
}

#[test]
fn narrow_threshold_drops_orthogonal_match() {
    let ts = TestStore::with_config(4, |c| c.max_distance = 1.0);
    populate(&ts);

    let hits = ts.store.search_similar(&[1.0, 0.0, 0.0, 0.0], 3).unwrap();
    assert_eq!(hit_ids(&hits), vec!["x", "xy"]);
}

#[test]
fn remove_then_search_skips_removed_entry() {
    let ts = TestStore::with_config(4, |c| c.max_distance = 1.5);
    populate(&ts);

    let outcome = ts.store.remove_features(&["y"]).unwrap();
    assert_eq!(outcome.removed, vec!["y"]);

    let stats = ts.store.stats();
    assert_eq!(stats.total_vectors, 2);
    assert_eq!(stats.metadata_count, 2);

    let hits = ts.store.search_similar(&[1.0, 0.0, 0.0, 0.0], 3).unwrap();
    assert_eq!(hit_ids(&hits), vec!["x", "xy"]);
}

#[test]
fn unnormalized_input_is_stored_normalized() {
    let ts = TestStore::with_config(4, |c| c.max_distance = 0.01);
    ts.store.add_feature("big", &[0.0, 0.0, 30.0, 40.0], Metadata::new()).unwrap();

    let hits = ts.store.search_similar(&[0.0, 0.0, 0.6, 0.8], 1).unwrap();
    assert_eq!(hit_ids(&hits), vec!["big"]);
    assert!(hits[0].distance < 1e-5);
}

#[test]
fn zero_vector_is_accepted_unnormalized() {
    let ts = TestStore::with_config(4, |c| c.max_distance = 2.0);
    ts.store.add_feature("zero", &[0.0; 4], Metadata::new()).unwrap();

    let hits = ts.store.search_similar(&axis(4, 0), 1).unwrap();
    assert_eq!(hit_ids(&hits), vec!["zero"]);
    assert!((hits[0].distance - 1.0).abs() < 1e-6);
}

#[test]
fn extreme_magnitudes_are_normalized() {
    let ts = TestStore::with_config(4, |c| c.max_distance = 2.0);
    ts.store.add_feature("huge", &[1e20, 0.0, 0.0, 0.0], Metadata::new()).unwrap();
    ts.store.add_feature("tiny", &[0.0, 1e-30, 0.0, 0.0], Metadata::new()).unwrap();

    let hits = ts.store.search_similar(&axis(4, 0), 1).unwrap();
    assert_eq!(hit_ids(&hits), vec!["huge"]);
    assert!(hits[0].distance < 1e-6);

    let hits = ts.store.search_similar(&axis(4, 1), 1).unwrap();
    assert_eq!(hit_ids(&hits), vec!["tiny"]);
    assert!(hits[0].distance < 1e-6);
}

#[test]
fn ties_resolve_by_insertion_order() {
    let ts = TestStore::with_config(4, |c| c.max_distance = 2.0);
    for id in ["first", "second", "third"] {
        ts.store.add_feature(id, &axis(4, 1), Metadata::new()).unwrap();
    }

    let hits = ts.store.search_similar(&axis(4, 0), 3).unwrap();
    assert_eq!(hit_ids(&hits), vec!["first", "second", "third"]);
}

#[test]
fn duplicate_feature_ids_are_removed_together() {
    let ts = TestStore::with_config(4, |c| c.max_distance = 2.0);
    ts.store.add_feature("pet", &axis(4, 0), Metadata::new()).unwrap();
    ts.store.add_feature("other", &axis(4, 1), Metadata::new()).unwrap();
    ts.store.add_feature("pet", &axis(4, 2), Metadata::new()).unwrap();

    let outcome = ts.store.remove_features(&["pet"]).unwrap();
    assert_eq!(outcome.removed, vec!["pet"]);
    assert_eq!(ts.store.stats().total_vectors, 1);

    let hits = ts.store.search_similar(&axis(4, 2), 5).unwrap();
    assert_eq!(hit_ids(&hits), vec!["other"]);
}

#[test]
fn remove_reports_unknown_ids() {
    let ts = TestStore::new(4);
    ts.store.add_feature("a", &axis(4, 0), Metadata::new()).unwrap();

    let outcome = ts.store.remove_features(&["ghost", "a", "phantom"]).unwrap();
    assert_eq!(outcome.removed, vec!["a"]);
    assert_eq!(outcome.not_found, vec!["ghost", "phantom"]);
}

#[test]
fn invalid_feature_ids_are_rejected() {
    let ts = TestStore::new(4);
    for bad in ["", "../etc/passwd", "a/b", "tab\there"] {
        let err = ts.store.add_feature(bad, &axis(4, 0), Metadata::new()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFeatureId { .. }), "{bad:?}: {err}");
    }
    assert_eq!(ts.store.stats().total_vectors, 0);
}
