//! Wire messages for index queries
//!
//! Hand-written prost definitions of the query schema exchanged between the
//! coordinator and storage nodes:
//!
//! ```protobuf
//! message Query {
//!   oneof query {
//!     TermQuery term = 1;
//!     RegexpQuery regexp = 2;
//!     NegationQuery negation = 3;
//!     ConjunctionQuery conjunction = 4;
//!     DisjunctionQuery disjunction = 5;
//!     AllQuery all = 6;
//!     FieldQuery field = 7;
//!   }
//! }
//!
//! message TermQuery { bytes field = 1; bytes term = 2; }
//! message RegexpQuery { bytes field = 1; bytes regexp = 2; }
//! message NegationQuery { Query query = 1; }
//! message ConjunctionQuery { repeated Query queries = 1; }
//! message DisjunctionQuery { repeated Query queries = 1; }
//! message AllQuery {}
//! message FieldQuery { bytes field = 1; }
//! ```
//!
//! A oneof tag this version does not know is skipped by prost and surfaces
//! as `query: None`.

use bytes::Bytes;
use prost::{Message, Oneof};

/// A query node on the wire
#[derive(Clone, PartialEq, Message)]
pub struct Query {
    /// The node variant, `None` when unset or unknown
    #[prost(oneof = "query::Kind", tags = "1, 2, 3, 4, 5, 6, 7")]
    pub query: Option<query::Kind>,
}

/// Nested types for [`Query`]
pub mod query {
    use super::*;

    /// The variants a wire query node can take
    #[derive(Clone, PartialEq, Oneof)]
    pub enum Kind {
        /// Exact field/value match
        #[prost(message, tag = "1")]
        Term(TermQuery),
        /// Regular expression match on a field value
        #[prost(message, tag = "2")]
        Regexp(RegexpQuery),
        /// Complement of the inner query
        #[prost(message, tag = "3")]
        Negation(NegationQuery),
        /// AND of the inner queries
        #[prost(message, tag = "4")]
        Conjunction(ConjunctionQuery),
        /// OR of the inner queries
        #[prost(message, tag = "5")]
        Disjunction(DisjunctionQuery),
        /// Matches everything
        #[prost(message, tag = "6")]
        All(AllQuery),
        /// Matches any document containing the field
        #[prost(message, tag = "7")]
        Field(FieldQuery),
    }
}

/// Exact field/value match
#[derive(Clone, PartialEq, Message)]
pub struct TermQuery {
    /// Field name
    #[prost(bytes = "bytes", tag = "1")]
    pub field: Bytes,
    /// Field value
    #[prost(bytes = "bytes", tag = "2")]
    pub term: Bytes,
}

/// Regular expression match on a field value
#[derive(Clone, PartialEq, Message)]
pub struct RegexpQuery {
    /// Field name
    #[prost(bytes = "bytes", tag = "1")]
    pub field: Bytes,
    /// Uncompiled pattern
    #[prost(bytes = "bytes", tag = "2")]
    pub regexp: Bytes,
}

/// Complement of the inner query
#[derive(Clone, PartialEq, Message)]
pub struct NegationQuery {
    /// Negated query
    #[prost(message, optional, boxed, tag = "1")]
    pub query: Option<Box<Query>>,
}

/// AND of the inner queries
#[derive(Clone, PartialEq, Message)]
pub struct ConjunctionQuery {
    /// Queries that must all match
    #[prost(message, repeated, tag = "1")]
    pub queries: Vec<Query>,
}

/// OR of the inner queries
#[derive(Clone, PartialEq, Message)]
pub struct DisjunctionQuery {
    /// Queries of which at least one must match
    #[prost(message, repeated, tag = "1")]
    pub queries: Vec<Query>,
}

/// Matches everything
#[derive(Clone, PartialEq, Message)]
pub struct AllQuery {}

/// Matches any document containing the field
#[derive(Clone, PartialEq, Message)]
pub struct FieldQuery {
    /// Field name
    #[prost(bytes = "bytes", tag = "1")]
    pub field: Bytes,
}

impl Query {
    /// Wrap a variant into a query node
    pub fn from_kind(kind: query::Kind) -> Self {
        Self { query: Some(kind) }
    }

    /// The term payload, if this node is a term query
    pub fn term(&self) -> Option<&TermQuery> {
        match &self.query {
            Some(query::Kind::Term(term)) => Some(term),
            _ => None,
        }
    }

    /// Short name of the variant, used in logs and errors
    pub fn kind_name(&self) -> &'static str {
        match &self.query {
            Some(query::Kind::Term(_)) => "term",
            Some(query::Kind::Regexp(_)) => "regexp",
            Some(query::Kind::Negation(_)) => "negation",
            Some(query::Kind::Conjunction(_)) => "conjunction",
            Some(query::Kind::Disjunction(_)) => "disjunction",
            Some(query::Kind::All(_)) => "all",
            Some(query::Kind::Field(_)) => "field",
            None => "unset",
        }
    }
}
