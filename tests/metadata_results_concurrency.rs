//! Concurrency tests for per-block query metadata results
//!
//! Simulates shards contributing cardinality results for a query spanning
//! several index blocks, all writing into one shared accumulator.

use std::sync::Arc;
use std::time::Duration;

use kuba_index_query::index::{QueryMetadataAggregateResult, QueryMetadataResults};
use kuba_index_query::query::MetadataDirective;
use kuba_index_query::types::{BlockStart, HashFn, NamespaceId};

const BLOCK_SIZE: Duration = Duration::from_secs(2 * 3600);

fn shard_hash() -> HashFn {
    Arc::new(|id: &[u8]| {
        id.iter()
            .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(*b as u32))
            % 64
    })
}

fn block(i: i64) -> BlockStart {
    BlockStart::from_nanos(i * BLOCK_SIZE.as_nanos() as i64)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_add_result_loses_nothing() {
    const CONTRIBUTIONS: usize = 500;
    const BLOCKS: i64 = 6;

    let results = Arc::new(QueryMetadataResults::new(
        NamespaceId::from("metrics"),
        shard_hash(),
    ));

    let mut handles = Vec::with_capacity(CONTRIBUTIONS);
    for i in 0..CONTRIBUTIONS {
        let results = Arc::clone(&results);
        handles.push(tokio::spawn(async move {
            results.add_result(
                block(i as i64 % BLOCKS),
                QueryMetadataAggregateResult::new(
                    (i % 64) as u32,
                    MetadataDirective::Cardinality,
                    i as u64,
                ),
            );
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let snapshot = results.snapshot();
    assert_eq!(snapshot.len(), BLOCKS as usize);

    let total: usize = snapshot.values().map(|b| b.results.len()).sum();
    assert_eq!(total, CONTRIBUTIONS);

    // Every contribution appears exactly once
    let mut values: Vec<u64> = snapshot
        .values()
        .flat_map(|b| b.results.iter().map(|r| r.value))
        .collect();
    values.sort_unstable();
    assert_eq!(values, (0..CONTRIBUTIONS as u64).collect::<Vec<_>>());

    for (start, entry) in &snapshot {
        assert_eq!(*start, entry.block_start);
    }

    Arc::try_unwrap(results).unwrap().finalize();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_snapshots_during_writes_are_consistent() {
    const WRITERS: usize = 8;
    const PER_WRITER: usize = 200;

    let results = Arc::new(QueryMetadataResults::new(
        NamespaceId::from("metrics"),
        shard_hash(),
    ));

    let mut writers = Vec::new();
    for w in 0..WRITERS {
        let results = Arc::clone(&results);
        writers.push(tokio::task::spawn_blocking(move || {
            for i in 0..PER_WRITER {
                results.add_result(
                    block((i % 3) as i64),
                    QueryMetadataAggregateResult::new(w as u32, MetadataDirective::Cardinality, 1),
                );
            }
        }));
    }

    let reader = {
        let results = Arc::clone(&results);
        tokio::task::spawn_blocking(move || {
            let mut last = 0usize;
            for _ in 0..100 {
                let snapshot = results.snapshot();
                let count: usize = snapshot.values().map(|b| b.results.len()).sum();
                // Results are only ever appended
                assert!(count >= last);
                for (start, entry) in &snapshot {
                    assert_eq!(*start, entry.block_start);
                    assert!(!entry.results.is_empty());
                }
                last = count;
            }
        })
    };

    for writer in writers {
        writer.await.unwrap();
    }
    reader.await.unwrap();

    assert_eq!(results.result_count(), WRITERS * PER_WRITER);
    assert_eq!(
        results.total_value(&MetadataDirective::Cardinality),
        (WRITERS * PER_WRITER) as u64
    );
}

#[test]
fn test_consecutive_snapshots_are_equal() {
    let results = QueryMetadataResults::new(NamespaceId::from("metrics"), shard_hash());
    for i in 0..10 {
        results.add_result(
            block(i % 2),
            QueryMetadataAggregateResult::new(i as u32, MetadataDirective::Cardinality, 1),
        );
    }

    assert_eq!(results.snapshot(), results.snapshot());
}

#[test]
fn test_cardinality_summed_across_shards_and_blocks() {
    // 100 series spread across 4 shards and two blocks
    let results = QueryMetadataResults::new(NamespaceId::from("metrics"), shard_hash());
    let base = BlockStart::truncate(1_700_000_000_000_000_000, BLOCK_SIZE);

    for shard in 0..4u32 {
        results.add_result(
            base,
            QueryMetadataAggregateResult::new(shard, MetadataDirective::Cardinality, 20),
        );
        results.add_result(
            base.next(BLOCK_SIZE),
            QueryMetadataAggregateResult::new(shard, MetadataDirective::Cardinality, 5),
        );
    }

    assert_eq!(results.block_count(), 2);
    assert_eq!(results.total_value(&MetadataDirective::Cardinality), 100);
    assert_eq!(
        results.snapshot()[&base].total_value(&MetadataDirective::Cardinality),
        80
    );
}

#[test]
fn test_hash_fn_returned_verbatim() {
    let hash_fn = shard_hash();
    let results = QueryMetadataResults::new(NamespaceId::from("metrics"), Arc::clone(&hash_fn));

    let returned = results.hash_fn();
    assert_eq!(returned(&b"series-a"[..]), hash_fn(&b"series-a"[..]));
    assert_eq!(results.namespace().as_bytes(), b"metrics");
}
