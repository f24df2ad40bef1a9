//! Per-block query metadata results
//!
//! When a query carries metadata directives (for example a cardinality
//! request), each shard or index segment produces an aggregate result per
//! time block instead of series data. [`QueryMetadataResults`] collects these
//! contributions for one namespace while many shards write concurrently.
//!
//! # Concurrency
//!
//! A single `parking_lot::RwLock` guards the whole block map. Writers take
//! the write lock only for an O(1) insert/append; readers take the read lock
//! and clone. Block counts are bounded by query range / block size, so
//! per-block locking is not worth it.
//!
//! # Example
//!
//! ```rust
//! use kuba_index_query::index::{QueryMetadataAggregateResult, QueryMetadataResults};
//! use kuba_index_query::query::MetadataDirective;
//! use kuba_index_query::types::{BlockStart, NamespaceId};
//! use std::sync::Arc;
//!
//! let hash_fn = Arc::new(|id: &[u8]| id.len() as u32);
//! let results = QueryMetadataResults::new(NamespaceId::from("metrics"), hash_fn);
//! results.add_result(
//!     BlockStart::from_nanos(0),
//!     QueryMetadataAggregateResult::new(0, MetadataDirective::Cardinality, 42),
//! );
//!
//! assert_eq!(results.total_value(&MetadataDirective::Cardinality), 42);
//! results.finalize();
//! ```

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::metrics;
use crate::query::MetadataDirective;
use crate::types::{BlockStart, HashFn, NamespaceId};

/// Aggregate produced by one shard for one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMetadataAggregateResult {
    /// Shard that produced the result
    pub shard: u32,
    /// Directive the result answers
    pub directive: MetadataDirective,
    /// Aggregate value (e.g. number of matching series)
    pub value: u64,
}

impl QueryMetadataAggregateResult {
    /// Create a result
    pub fn new(shard: u32, directive: MetadataDirective, value: u64) -> Self {
        Self {
            shard,
            directive,
            value,
        }
    }
}

/// All results contributed for one time block, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMetadataBlockResults {
    /// Start of the block
    pub block_start: BlockStart,
    /// Contributed results
    pub results: Vec<QueryMetadataAggregateResult>,
}

impl QueryMetadataBlockResults {
    /// Create an empty block entry
    pub fn new(block_start: BlockStart) -> Self {
        Self {
            block_start,
            results: Vec::new(),
        }
    }

    /// Sum of values for `directive` within this block
    pub fn total_value(&self, directive: &MetadataDirective) -> u64 {
        self.results
            .iter()
            .filter(|r| &r.directive == directive)
            .map(|r| r.value)
            .sum()
    }
}

/// Metadata results for one query against one namespace
///
/// Shared (usually behind an `Arc`) by every shard contributing to the
/// query. Consumed by [`QueryMetadataResults::finalize`] once all
/// contributors are done.
pub struct QueryMetadataResults {
    namespace: NamespaceId,
    hash_fn: HashFn,
    results: RwLock<HashMap<BlockStart, QueryMetadataBlockResults>>,
}

impl QueryMetadataResults {
    /// Create an empty accumulator for `namespace`
    pub fn new(namespace: NamespaceId, hash_fn: HashFn) -> Self {
        Self {
            namespace,
            hash_fn,
            results: RwLock::new(HashMap::new()),
        }
    }

    /// Namespace the query runs against
    pub fn namespace(&self) -> NamespaceId {
        self.namespace.clone()
    }

    /// Sharding hash function supplied at construction
    pub fn hash_fn(&self) -> HashFn {
        self.hash_fn.clone()
    }

    /// Append `result` to the entry for `block_start`, creating it if absent
    pub fn add_result(&self, block_start: BlockStart, result: QueryMetadataAggregateResult) {
        {
            let mut results = self.results.write();
            results
                .entry(block_start)
                .or_insert_with(|| {
                    trace!(block_start = %block_start, "Created metadata block entry");
                    QueryMetadataBlockResults::new(block_start)
                })
                .results
                .push(result);
        }
        metrics::record_metadata_result();
    }

    /// Copy of the current block map
    ///
    /// A snapshot taken while writers are active may or may not include an
    /// in-flight write, but every block entry in it is complete.
    pub fn snapshot(&self) -> HashMap<BlockStart, QueryMetadataBlockResults> {
        self.results.read().clone()
    }

    /// Number of blocks with at least one result
    pub fn block_count(&self) -> usize {
        self.results.read().len()
    }

    /// Number of results across all blocks
    pub fn result_count(&self) -> usize {
        self.results.read().values().map(|b| b.results.len()).sum()
    }

    /// Sum of values for `directive` across all blocks
    pub fn total_value(&self, directive: &MetadataDirective) -> u64 {
        self.results
            .read()
            .values()
            .map(|b| b.total_value(directive))
            .sum()
    }

    /// Release resources held by the accumulator
    ///
    /// Currently a no-op. Taking `self` means no contributor can add results
    /// after the accumulator has been finalized.
    pub fn finalize(self) {
        debug!(
            namespace = %self.namespace,
            blocks = self.block_count(),
            "Finalized query metadata results"
        );
    }
}

impl fmt::Debug for QueryMetadataResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryMetadataResults")
            .field("namespace", &self.namespace)
            .field("blocks", &self.block_count())
            .finish_non_exhaustive()
    }
}
