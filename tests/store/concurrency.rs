//! Shared access from many threads

use std::sync::{Arc, Barrier};
use std::thread;

use crate::common::*;

const THREADS: usize = 8;
const PER_THREAD: usize = 25;

#[test]
fn concurrent_adds_keep_count_and_ids_consistent() {
    let ts = TestStore::with_config(16, |c| c.snapshot_interval = 50);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = Arc::clone(&ts.store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..PER_THREAD)
                    .map(|i| {
                        let v = seeded_vector(16, (t * PER_THREAD + i) as u64);
                        store
                            .add_feature(&format!("t{t}-{i}"), &v, Metadata::new())
                            .unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .map(|id| id.as_u64())
        .collect();
    ids.sort_unstable();

    let expected: Vec<u64> = (0..(THREADS * PER_THREAD) as u64).collect();
    assert_eq!(ids, expected);

    let stats = ts.store.stats();
    assert_eq!(stats.total_vectors, THREADS * PER_THREAD);
    assert_eq!(stats.metadata_count, THREADS * PER_THREAD);
}

#[test]
fn searches_interleaved_with_mutations_never_fail() {
    let ts = TestStore::with_memory_cache(8);
    for i in 0..20 {
        ts.store
            .add_feature(&format!("seed{i}"), &seeded_vector(8, i), Metadata::new())
            .unwrap();
    }
    let barrier = Arc::new(Barrier::new(4));

    let writer = {
        let store = Arc::clone(&ts.store);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for i in 0..40u64 {
                store
                    .add_feature(&format!("w{i}"), &seeded_vector(8, 1000 + i), Metadata::new())
                    .unwrap();
                if i % 10 == 9 {
                    store.remove_features(&[format!("seed{}", i / 10)]).unwrap();
                }
            }
        })
    };

    let readers: Vec<_> = (0..3u64)
        .map(|r| {
            let store = Arc::clone(&ts.store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..100u64 {
                    let hits = store
                        .search_similar(&seeded_vector(8, r * 100 + i), 10)
                        .unwrap();
                    assert!(hits.len() <= 10);
                    for pair in hits.windows(2) {
                        assert!(pair[0].distance <= pair[1].distance);
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }

    assert_eq!(ts.store.stats().total_vectors, 20 + 40 - 4);
}
