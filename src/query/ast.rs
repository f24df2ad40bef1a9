//! Index query tree
//!
//! Boolean filter expressions over tagged series, as exchanged between the
//! coordinator and storage nodes.
//!
//! # Query Types
//!
//! - **All**: matches every series
//! - **Field**: matches series carrying a tag with the given name
//! - **Term**: exact tag name/value match
//! - **Regexp**: tag value matches an anchored regular expression
//! - **Negation**: complement of an inner query
//! - **Conjunction** / **Disjunction**: AND / OR over child queries
//!
//! # Example
//!
//! ```rust
//! use kuba_index_query::query::Query;
//!
//! let query = Query::conjunction(vec![
//!     Query::term("host", "server01"),
//!     Query::negation(Query::regexp("dc", "us-.*").unwrap()),
//! ]);
//! assert_eq!(
//!     query.to_string(),
//!     "conjunction(term(host, server01), negation(regexp(dc, us-.*)))"
//! );
//! ```

use bytes::Bytes;
use regex::bytes::{Regex, RegexBuilder};
use std::fmt;

use crate::error::{Error, Result};

/// Default maximum regexp pattern length in bytes
pub const DEFAULT_MAX_PATTERN_LEN: usize = 1000;

/// Default compiled regexp size limit in bytes
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 1024 * 1024;

// ============================================================================
// Query Tree
// ============================================================================

/// A boolean filter expression over tagged series
///
/// Nodes are immutable once built. Children of `Conjunction` and
/// `Disjunction` keep their construction order on the wire, but matching
/// treats them as a set.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Matches everything
    All,
    /// Matches any series containing the field
    Field(FieldQuery),
    /// Exact field/value match
    Term(TermQuery),
    /// Field value matches a regular expression
    Regexp(RegexpQuery),
    /// Complement of the inner query
    Negation(Box<Query>),
    /// All children must match
    Conjunction(Vec<Query>),
    /// At least one child must match
    Disjunction(Vec<Query>),
}

/// Discriminant of a [`Query`] node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// [`Query::All`]
    All,
    /// [`Query::Field`]
    Field,
    /// [`Query::Term`]
    Term,
    /// [`Query::Regexp`]
    Regexp,
    /// [`Query::Negation`]
    Negation,
    /// [`Query::Conjunction`]
    Conjunction,
    /// [`Query::Disjunction`]
    Disjunction,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryKind::All => "all",
            QueryKind::Field => "field",
            QueryKind::Term => "term",
            QueryKind::Regexp => "regexp",
            QueryKind::Negation => "negation",
            QueryKind::Conjunction => "conjunction",
            QueryKind::Disjunction => "disjunction",
        };
        f.write_str(name)
    }
}

impl Query {
    /// Query matching everything
    pub fn all() -> Self {
        Query::All
    }

    /// Query matching series that carry `field`
    pub fn field(field: impl Into<Bytes>) -> Self {
        Query::Field(FieldQuery {
            field: field.into(),
        })
    }

    /// Query matching series where `field` equals `term`
    pub fn term(field: impl Into<Bytes>, term: impl Into<Bytes>) -> Self {
        Query::Term(TermQuery {
            field: field.into(),
            term: term.into(),
        })
    }

    /// Query matching series where `field` matches `pattern`
    ///
    /// Fails with [`Error::InvalidPattern`] if the pattern does not compile
    /// under the default [`RegexLimits`].
    pub fn regexp(field: impl Into<Bytes>, pattern: impl Into<Bytes>) -> Result<Self> {
        Self::regexp_with_limits(field, pattern, &RegexLimits::default())
    }

    /// Like [`Query::regexp`], with explicit compilation limits
    pub fn regexp_with_limits(
        field: impl Into<Bytes>,
        pattern: impl Into<Bytes>,
        limits: &RegexLimits,
    ) -> Result<Self> {
        RegexpQuery::new(field, pattern, limits).map(Query::Regexp)
    }

    /// Complement of `inner`
    pub fn negation(inner: Query) -> Self {
        Query::Negation(Box::new(inner))
    }

    /// AND over `queries`
    pub fn conjunction(queries: Vec<Query>) -> Self {
        Query::Conjunction(queries)
    }

    /// OR over `queries`
    pub fn disjunction(queries: Vec<Query>) -> Self {
        Query::Disjunction(queries)
    }

    /// Discriminant of this node
    pub fn kind(&self) -> QueryKind {
        match self {
            Query::All => QueryKind::All,
            Query::Field(_) => QueryKind::Field,
            Query::Term(_) => QueryKind::Term,
            Query::Regexp(_) => QueryKind::Regexp,
            Query::Negation(_) => QueryKind::Negation,
            Query::Conjunction(_) => QueryKind::Conjunction,
            Query::Disjunction(_) => QueryKind::Disjunction,
        }
    }

    /// Nesting depth; leaves have depth 1
    pub fn depth(&self) -> usize {
        match self {
            Query::All | Query::Field(_) | Query::Term(_) | Query::Regexp(_) => 1,
            Query::Negation(inner) => 1 + inner.depth(),
            Query::Conjunction(queries) | Query::Disjunction(queries) => {
                1 + queries.iter().map(Query::depth).max().unwrap_or(0)
            },
        }
    }

    /// Direct children of this node
    pub fn children(&self) -> &[Query] {
        match self {
            Query::Negation(inner) => std::slice::from_ref(inner.as_ref()),
            Query::Conjunction(queries) | Query::Disjunction(queries) => queries,
            _ => &[],
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::All => write!(f, "all()"),
            Query::Field(q) => write!(f, "field({})", String::from_utf8_lossy(&q.field)),
            Query::Term(q) => write!(
                f,
                "term({}, {})",
                String::from_utf8_lossy(&q.field),
                String::from_utf8_lossy(&q.term)
            ),
            Query::Regexp(q) => write!(
                f,
                "regexp({}, {})",
                String::from_utf8_lossy(&q.field),
                String::from_utf8_lossy(&q.pattern)
            ),
            Query::Negation(inner) => write!(f, "negation({})", inner),
            Query::Conjunction(queries) => write_list(f, "conjunction", queries),
            Query::Disjunction(queries) => write_list(f, "disjunction", queries),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, queries: &[Query]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, q) in queries.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", q)?;
    }
    write!(f, ")")
}

// ============================================================================
// Leaf Queries
// ============================================================================

/// Field-exists query payload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldQuery {
    /// Field name
    pub field: Bytes,
}

/// Term query payload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TermQuery {
    /// Field name
    pub field: Bytes,
    /// Exact value to match
    pub term: Bytes,
}

/// Limits applied when compiling regexp queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegexLimits {
    /// Maximum pattern length in bytes
    pub max_pattern_len: usize,
    /// Maximum compiled program size in bytes
    pub size_limit: usize,
}

impl Default for RegexLimits {
    fn default() -> Self {
        Self {
            max_pattern_len: DEFAULT_MAX_PATTERN_LEN,
            size_limit: DEFAULT_REGEX_SIZE_LIMIT,
        }
    }
}

/// Regexp query payload
///
/// Holds the raw pattern as received and its anchored compilation. Two
/// regexp queries are equal when their field and raw pattern are equal.
#[derive(Debug, Clone)]
pub struct RegexpQuery {
    field: Bytes,
    pattern: Bytes,
    compiled: Regex,
}

impl RegexpQuery {
    /// Validate and compile `pattern`
    ///
    /// The pattern is checked as written first, then compiled anchored at
    /// both ends so it must match the whole value. Checking the raw form
    /// first keeps unbalanced input such as `)(` from becoming valid once
    /// wrapped.
    pub fn new(
        field: impl Into<Bytes>,
        pattern: impl Into<Bytes>,
        limits: &RegexLimits,
    ) -> Result<Self> {
        let field = field.into();
        let pattern = pattern.into();

        let source = std::str::from_utf8(&pattern).map_err(|e| {
            Error::invalid_pattern(
                &String::from_utf8_lossy(&pattern),
                format!("pattern is not valid UTF-8: {}", e),
            )
        })?;

        if source.len() > limits.max_pattern_len {
            return Err(Error::invalid_pattern(
                source,
                format!(
                    "pattern length {} exceeds maximum of {}",
                    source.len(),
                    limits.max_pattern_len
                ),
            ));
        }

        RegexBuilder::new(source)
            .size_limit(limits.size_limit)
            .build()
            .map_err(|e| Error::invalid_pattern(source, e.to_string()))?;

        let compiled = RegexBuilder::new(&format!("^(?:{})$", source))
            .size_limit(limits.size_limit)
            .build()
            .map_err(|e| Error::invalid_pattern(source, e.to_string()))?;

        Ok(Self {
            field,
            pattern,
            compiled,
        })
    }

    /// Field name
    pub fn field(&self) -> &Bytes {
        &self.field
    }

    /// Raw pattern as supplied
    pub fn pattern(&self) -> &Bytes {
        &self.pattern
    }

    /// Whether `value` matches the whole pattern
    pub fn is_match(&self, value: &[u8]) -> bool {
        self.compiled.is_match(value)
    }
}

impl PartialEq for RegexpQuery {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.pattern == other.pattern
    }
}

impl Eq for RegexpQuery {}
