//! Index-side query support
//!
//! Query execution against posting lists happens elsewhere; this module holds
//! the structures execution writes into, currently the per-block metadata
//! result accumulator used by metadata-tunneled queries.

pub mod metadata_results;

pub use metadata_results::{
    QueryMetadataAggregateResult, QueryMetadataBlockResults, QueryMetadataResults,
};
