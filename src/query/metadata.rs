//! Query metadata tunneling
//!
//! Auxiliary per-query directives travel inside ordinary query trees as term
//! nodes on the reserved field `__metadata__`. The wire schema is unchanged:
//! a normal decoder drops these terms when they are direct children of a
//! conjunction or disjunction, while a metadata-aware decoder lifts their
//! values into a side list and puts `All` in their place.
//!
//! # Example
//!
//! ```rust
//! use kuba_index_query::query::metadata::{with_metadata, MetadataDirective};
//! use kuba_index_query::query::{decode, decode_with_metadata, encode, Query};
//!
//! let query = with_metadata(Query::term("tag", "value"), [MetadataDirective::Cardinality]);
//! let bytes = encode(&query).unwrap();
//!
//! // Executors that don't know about metadata only see the predicate
//! assert_eq!(
//!     decode(&bytes).unwrap(),
//!     Query::conjunction(vec![Query::term("tag", "value")])
//! );
//!
//! let (_, metadata) = decode_with_metadata(&bytes).unwrap();
//! assert_eq!(metadata, vec!["cardinality".to_string()]);
//! ```

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use super::ast::Query;

/// Reserved field name marking a term as a metadata directive
pub const METADATA_FIELD: &str = "__metadata__";

/// Whether `field` is the reserved metadata field
#[inline]
pub fn is_metadata_field(field: &[u8]) -> bool {
    field == METADATA_FIELD.as_bytes()
}

impl Query {
    /// Whether this node is a term on the reserved metadata field
    pub fn is_metadata_term(&self) -> bool {
        matches!(self, Query::Term(t) if is_metadata_field(&t.field))
    }
}

/// Typed view of a metadata token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetadataDirective {
    /// Return series cardinality instead of series data
    Cardinality,
    /// Any other token, carried through unchanged
    Other(String),
}

impl MetadataDirective {
    /// Wire token for this directive
    pub fn as_str(&self) -> &str {
        match self {
            MetadataDirective::Cardinality => "cardinality",
            MetadataDirective::Other(token) => token,
        }
    }
}

impl From<&str> for MetadataDirective {
    fn from(s: &str) -> Self {
        match s {
            "cardinality" => MetadataDirective::Cardinality,
            other => MetadataDirective::Other(other.to_string()),
        }
    }
}

impl FromStr for MetadataDirective {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for MetadataDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sentinel term carrying `directive`
pub fn metadata_term(directive: &MetadataDirective) -> Query {
    Query::term(
        METADATA_FIELD,
        bytes::Bytes::copy_from_slice(directive.as_str().as_bytes()),
    )
}

/// Attach metadata directives to `query`
///
/// Sentinel terms are appended to `query` if it is already a conjunction;
/// any other query becomes the first child of a new conjunction. Sentinels
/// must sit directly under a boolean node so that normal decoders drop them.
pub fn with_metadata<I>(query: Query, directives: I) -> Query
where
    I: IntoIterator<Item = MetadataDirective>,
{
    let mut queries = match query {
        Query::Conjunction(queries) => queries,
        other => vec![other],
    };
    queries.extend(directives.into_iter().map(|d| metadata_term(&d)));
    Query::Conjunction(queries)
}

/// Parse extracted tokens into directives
pub fn parse_directives(tokens: &[String]) -> Vec<MetadataDirective> {
    tokens.iter().map(|t| MetadataDirective::from(t.as_str())).collect()
}
