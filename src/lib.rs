//! Kuba index query - query codec and metadata aggregation for the secondary index
//!
//! This library provides:
//! - A boolean query tree over tagged series (term, field, regexp, negation,
//!   conjunction, disjunction, all)
//! - A prost wire codec for moving queries between coordinator and storage nodes
//! - Metadata tunneling: auxiliary directives such as cardinality requests
//!   carried as `__metadata__` terms without changing the wire schema
//! - A concurrent per-block accumulator for metadata results from index shards
//!
//! # Example
//!
//! ```rust
//! use kuba_index_query::query::{decode_with_metadata, encode, with_metadata, MetadataDirective, Query};
//!
//! let query = with_metadata(Query::term("tag", "value"), [MetadataDirective::Cardinality]);
//! let bytes = encode(&query).unwrap();
//!
//! let (tree, metadata) = decode_with_metadata(&bytes).unwrap();
//! assert_eq!(tree, Query::conjunction(vec![Query::term("tag", "value"), Query::All]));
//! assert_eq!(metadata, vec!["cardinality".to_string()]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod index;
pub mod types;

/// Query tree, wire codec, and metadata tunneling
pub mod query;

/// Configuration management with TOML support
pub mod config;

/// Prometheus metrics for codec and aggregation
pub mod metrics;

// Re-export main types
pub use error::{Error, Result};
pub use index::{QueryMetadataAggregateResult, QueryMetadataBlockResults, QueryMetadataResults};
pub use query::{decode, decode_with_metadata, encode, Query};
pub use types::{BlockStart, HashFn, NamespaceId};
