//! Collaborator types consumed by the index query core
//!
//! # Key Types
//!
//! - **`NamespaceId`**: Opaque identifier for the namespace a query runs against
//! - **`HashFn`**: Sharding hash function reference, stored but never invoked here
//! - **`BlockStart`**: Unix-nanosecond start of a fixed-width index time block
//!
//! # Example
//!
//! ```rust
//! use kuba_index_query::types::{BlockStart, NamespaceId};
//! use std::time::Duration;
//!
//! let ns = NamespaceId::from("metrics");
//! assert_eq!(ns.as_bytes(), b"metrics");
//!
//! let block = BlockStart::truncate(7_200_000_000_001, Duration::from_secs(3600));
//! assert_eq!(block.as_nanos(), 7_200_000_000_000);
//! ```

use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Identifier of the namespace a query executes against
///
/// Used only as a key and a label; the core never interprets its contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(Bytes);

impl NamespaceId {
    /// Create a namespace identifier from raw bytes
    pub fn new(id: impl Into<Bytes>) -> Self {
        Self(id.into())
    }

    /// Raw identifier bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for NamespaceId {
    fn from(s: &str) -> Self {
        Self(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for NamespaceId {
    fn from(s: String) -> Self {
        Self(Bytes::from(s))
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Sharding hash function: maps a series ID to a shard
///
/// Shared as an `Arc` so result accumulators can hand it back verbatim to
/// callers without copying closures around.
pub type HashFn = Arc<dyn Fn(&[u8]) -> u32 + Send + Sync>;

/// Start of an index time block, in Unix nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockStart(i64);

impl BlockStart {
    /// Create a block start from a Unix-nanosecond timestamp
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Unix-nanosecond value of this block start
    pub const fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Block containing `timestamp_nanos` for blocks of `block_size`
    ///
    /// Truncation floors toward negative infinity so timestamps before the
    /// epoch land in the block that actually contains them. A zero block
    /// size leaves the timestamp unchanged.
    pub fn truncate(timestamp_nanos: i64, block_size: Duration) -> Self {
        let size = block_size.as_nanos().min(i64::MAX as u128) as i64;
        if size == 0 {
            return Self(timestamp_nanos);
        }
        // The floor of a timestamp near i64::MIN can fall below the range
        let start = timestamp_nanos
            .div_euclid(size)
            .checked_mul(size)
            .unwrap_or(i64::MIN);
        Self(start)
    }

    /// Start of the block following this one
    pub fn next(&self, block_size: Duration) -> Self {
        let size = block_size.as_nanos().min(i64::MAX as u128) as i64;
        Self(self.0.saturating_add(size))
    }
}

impl From<i64> for BlockStart {
    fn from(nanos: i64) -> Self {
        Self(nanos)
    }
}

impl fmt::Display for BlockStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
