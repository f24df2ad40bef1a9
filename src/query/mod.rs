//! Index query model and wire codec
//!
//! This module provides the query side of the secondary index:
//! - A boolean query tree over tagged series ([`Query`])
//! - prost wire messages for coordinator/storage-node transport ([`proto`])
//! - Encoding and the two decode modes ([`codec`])
//! - The metadata tunneling convention on the `__metadata__` field ([`metadata`])
//!
//! # Architecture
//!
//! ```text
//! Coordinator                         Storage node
//! ───────────                         ────────────
//! Query ──encode──► bytes ──────────► decode               → Query
//!   + sentinel terms                  decode_with_metadata → (Query, tokens)
//! ```
//!
//! # Example
//!
//! ```rust
//! use kuba_index_query::query::{decode, encode, Query};
//!
//! let query = Query::disjunction(vec![
//!     Query::term("host", "server01"),
//!     Query::term("host", "server02"),
//! ]);
//! let bytes = encode(&query).unwrap();
//! assert_eq!(decode(&bytes).unwrap(), query);
//! ```

pub mod ast;
pub mod codec;
pub mod metadata;
pub mod proto;

// Re-export main types
pub use ast::{FieldQuery, Query, QueryKind, RegexLimits, RegexpQuery, TermQuery};
pub use codec::{
    decode, decode_with_metadata, encode, from_proto, from_proto_with_metadata, QueryCodec,
    MAX_QUERY_DEPTH,
};
pub use metadata::{is_metadata_field, with_metadata, MetadataDirective, METADATA_FIELD};
