//! Periodic snapshot checkpoints

use crate::common::*;

fn add_n(ts: &TestStore, range: std::ops::Range<u64>) {
    for i in range {
        ts.store
            .add_feature(&format!("f{i}"), &seeded_vector(4, i), Metadata::new())
            .unwrap();
    }
}

#[test]
fn no_snapshot_before_first_interval() {
    let ts = TestStore::with_config(4, |c| c.snapshot_interval = 5);
    add_n(&ts, 0..4);
    assert!(!ts.vectors_path().exists());

    add_n(&ts, 4..5);
    assert!(ts.vectors_path().exists());
    assert!(ts.metadata_path().exists());
}

#[test]
fn crash_loses_only_adds_since_last_checkpoint() {
    let mut ts = TestStore::with_config(4, |c| c.snapshot_interval = 5);
    add_n(&ts, 0..13);

    ts.crash_and_reopen();

    assert_eq!(ts.store.stats().total_vectors, 10);
}

#[test]
fn checkpoint_counts_total_vectors_not_adds() {
    let mut ts = TestStore::with_config(4, |c| c.snapshot_interval = 4);
    add_n(&ts, 0..3);
    ts.store.remove_features(&["f0"]).unwrap();
    // 2 vectors remain; the snapshot is taken when the total reaches 4.
    add_n(&ts, 3..5);

    ts.crash_and_reopen();

    assert_eq!(ts.store.stats().total_vectors, 4);
}

#[test]
fn no_temp_files_left_after_save() {
    let ts = TestStore::with_config(4, |c| c.snapshot_interval = 1);
    add_n(&ts, 0..3);

    let leftovers: Vec<_> = std::fs::read_dir(ts.data_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
