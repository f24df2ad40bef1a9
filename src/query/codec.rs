//! Index query wire codec
//!
//! Converts [`Query`] trees to and from the prost wire messages in
//! [`super::proto`]. Two decode modes exist:
//!
//! - **Normal** ([`decode`]): metadata terms that are direct children of a
//!   conjunction or disjunction are dropped. A metadata term anywhere else
//!   (the root, or under a negation) decodes as an ordinary term.
//! - **Metadata-aware** ([`decode_with_metadata`]): every metadata term, at
//!   any depth, has its value appended to the returned token list and is
//!   replaced by [`Query::All`]. A conjunction or disjunction left with no
//!   real predicate collapses to `All`.
//!
//! Decoding aborts on the first error; no partial tree is returned.
//!
//! Trees deeper than [`MAX_QUERY_DEPTH`] cannot be carried: every level nests
//! two protobuf messages and prost refuses to decode past 100. The codec
//! rejects them on encode so that anything it encodes it can also decode.

use prost::Message;
use tracing::{debug, warn};

use super::ast::{Query, RegexLimits};
use super::metadata::is_metadata_field;
use super::proto::{self, query::Kind};
use crate::error::{Error, Result};
use crate::metrics;

/// Deepest query tree the wire format can carry (leaves have depth 1)
pub const MAX_QUERY_DEPTH: usize = 50;

/// Query encoder/decoder
///
/// Stateless apart from the regexp limits and depth bound applied to
/// queries; a single codec can be shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct QueryCodec {
    limits: RegexLimits,
    max_depth: usize,
}

impl Default for QueryCodec {
    fn default() -> Self {
        Self {
            limits: RegexLimits::default(),
            max_depth: MAX_QUERY_DEPTH,
        }
    }
}

impl QueryCodec {
    /// Create a codec with default regexp limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits applied when compiling decoded regexp patterns
    pub fn with_regex_limits(mut self, limits: RegexLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Regexp limits in effect
    pub fn regex_limits(&self) -> &RegexLimits {
        &self.limits
    }

    /// Set the maximum tree depth, capped at [`MAX_QUERY_DEPTH`]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.min(MAX_QUERY_DEPTH);
        self
    }

    /// Maximum tree depth accepted by encode and decode
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Encode a query to wire bytes
    ///
    /// Fails with [`Error::NilQuery`] when no query is given and with
    /// [`Error::QueryTooDeep`] when the tree is deeper than
    /// [`QueryCodec::max_depth`].
    pub fn encode<'a>(&self, query: impl Into<Option<&'a Query>>) -> Result<Vec<u8>> {
        let Some(query) = query.into() else {
            metrics::record_encode(false);
            return Err(Error::NilQuery);
        };
        let depth = query.depth();
        if depth > self.max_depth {
            metrics::record_encode(false);
            warn!(
                depth,
                max_depth = self.max_depth,
                "Refusing to encode index query"
            );
            return Err(Error::QueryTooDeep {
                depth,
                max_depth: self.max_depth,
            });
        }
        let encoded = query.to_proto().encode_to_vec();
        metrics::record_encode(true);
        Ok(encoded)
    }

    /// Decode wire bytes, dropping direct metadata children of boolean nodes
    pub fn decode(&self, data: &[u8]) -> Result<Query> {
        let result = parse(data).and_then(|pb| self.from_proto(&pb));
        finish("normal", &result);
        result
    }

    /// Decode wire bytes, extracting metadata tokens
    ///
    /// Returns the tree with every metadata term replaced by `All`, plus the
    /// metadata tokens in pre-order.
    pub fn decode_with_metadata(&self, data: &[u8]) -> Result<(Query, Vec<String>)> {
        let result = parse(data).and_then(|pb| self.from_proto_with_metadata(&pb));
        finish("metadata", &result);
        if let Ok((_, metadata)) = &result {
            if !metadata.is_empty() {
                metrics::record_metadata_tokens(metadata.len());
                debug!(tokens = ?metadata, "Extracted query metadata");
            }
        }
        result
    }

    /// Rebuild a query from an already-parsed wire message (normal mode)
    pub fn from_proto(&self, pb: &proto::Query) -> Result<Query> {
        Decoder {
            limits: &self.limits,
            max_depth: self.max_depth,
            metadata: None,
        }
        .decode(pb, 1)
    }

    /// Rebuild a query from an already-parsed wire message (metadata-aware)
    pub fn from_proto_with_metadata(&self, pb: &proto::Query) -> Result<(Query, Vec<String>)> {
        let mut decoder = Decoder {
            limits: &self.limits,
            max_depth: self.max_depth,
            metadata: Some(Vec::new()),
        };
        let query = decoder.decode(pb, 1)?;
        Ok((query, decoder.metadata.unwrap_or_default()))
    }
}

/// Encode a query with the default codec
pub fn encode<'a>(query: impl Into<Option<&'a Query>>) -> Result<Vec<u8>> {
    QueryCodec::default().encode(query)
}

/// Decode a query with the default codec (normal mode)
pub fn decode(data: &[u8]) -> Result<Query> {
    QueryCodec::default().decode(data)
}

/// Decode a query and its metadata tokens with the default codec
pub fn decode_with_metadata(data: &[u8]) -> Result<(Query, Vec<String>)> {
    QueryCodec::default().decode_with_metadata(data)
}

/// Rebuild a query from a wire message with the default codec (normal mode)
pub fn from_proto(pb: &proto::Query) -> Result<Query> {
    QueryCodec::default().from_proto(pb)
}

/// Rebuild a query and its metadata tokens from a wire message with the
/// default codec
pub fn from_proto_with_metadata(pb: &proto::Query) -> Result<(Query, Vec<String>)> {
    QueryCodec::default().from_proto_with_metadata(pb)
}

fn parse(data: &[u8]) -> Result<proto::Query> {
    Ok(proto::Query::decode(data)?)
}

fn finish<T>(mode: &str, result: &Result<T>) {
    match result {
        Ok(_) => metrics::record_decode(mode, true),
        Err(e) => {
            metrics::record_decode(mode, false);
            warn!(mode, error = %e, "Failed to decode index query");
        },
    }
}

// ============================================================================
// Encoding
// ============================================================================

impl Query {
    /// Convert to the wire message form
    pub fn to_proto(&self) -> proto::Query {
        let kind = match self {
            Query::All => Kind::All(proto::AllQuery {}),
            Query::Field(q) => Kind::Field(proto::FieldQuery {
                field: q.field.clone(),
            }),
            Query::Term(q) => Kind::Term(proto::TermQuery {
                field: q.field.clone(),
                term: q.term.clone(),
            }),
            Query::Regexp(q) => Kind::Regexp(proto::RegexpQuery {
                field: q.field().clone(),
                regexp: q.pattern().clone(),
            }),
            Query::Negation(inner) => Kind::Negation(proto::NegationQuery {
                query: Some(Box::new(inner.to_proto())),
            }),
            Query::Conjunction(queries) => Kind::Conjunction(proto::ConjunctionQuery {
                queries: queries.iter().map(Query::to_proto).collect(),
            }),
            Query::Disjunction(queries) => Kind::Disjunction(proto::DisjunctionQuery {
                queries: queries.iter().map(Query::to_proto).collect(),
            }),
        };
        proto::Query::from_kind(kind)
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Recursive decoder state
///
/// `metadata` is `Some` in metadata-aware mode and collects tokens in
/// pre-order as the tree is walked.
struct Decoder<'a> {
    limits: &'a RegexLimits,
    max_depth: usize,
    metadata: Option<Vec<String>>,
}

impl Decoder<'_> {
    fn decode(&mut self, pb: &proto::Query, depth: usize) -> Result<Query> {
        if depth > self.max_depth {
            return Err(Error::QueryTooDeep {
                depth,
                max_depth: self.max_depth,
            });
        }
        let Some(kind) = &pb.query else {
            return Err(Error::UnknownQueryVariant(
                "query variant is unset or not recognized".to_string(),
            ));
        };

        match kind {
            Kind::All(_) => Ok(Query::All),
            Kind::Field(q) => Ok(Query::field(q.field.clone())),
            Kind::Term(q) => {
                if let Some(metadata) = self.metadata.as_mut() {
                    if is_metadata_field(&q.field) {
                        metadata.push(String::from_utf8_lossy(&q.term).into_owned());
                        return Ok(Query::All);
                    }
                }
                Ok(Query::term(q.field.clone(), q.term.clone()))
            },
            Kind::Regexp(q) => {
                Query::regexp_with_limits(q.field.clone(), q.regexp.clone(), self.limits)
            },
            Kind::Negation(q) => {
                let inner = q.query.as_deref().ok_or_else(|| {
                    Error::MalformedMessage("negation query has no inner query".to_string())
                })?;
                Ok(Query::negation(self.decode(inner, depth + 1)?))
            },
            Kind::Conjunction(q) => Ok(self
                .decode_children(&q.queries, depth + 1)?
                .map_or(Query::All, Query::Conjunction)),
            Kind::Disjunction(q) => Ok(self
                .decode_children(&q.queries, depth + 1)?
                .map_or(Query::All, Query::Disjunction)),
        }
    }

    /// Decode the children of a conjunction or disjunction
    ///
    /// Returns `None` when the node should collapse to `All`, which only
    /// happens in metadata-aware mode when no child is a real predicate.
    fn decode_children(
        &mut self,
        queries: &[proto::Query],
        depth: usize,
    ) -> Result<Option<Vec<Query>>> {
        let mut children = Vec::with_capacity(queries.len());
        let mut predicates = 0usize;

        for child in queries {
            let is_metadata = child
                .term()
                .is_some_and(|term| is_metadata_field(&term.field));

            if is_metadata && self.metadata.is_none() {
                continue;
            }

            children.push(self.decode(child, depth)?);
            if !is_metadata {
                predicates += 1;
            }
        }

        if self.metadata.is_some() && predicates == 0 {
            return Ok(None);
        }
        Ok(Some(children))
    }
}
