//! Memory record types.
//!
//! A [`Memory`] is a stored prompt with its clarity score. Its embedding lives
//! in the `memories_vec` table under the same rowid. [`MemoryMatch`] is one
//! row of a nearest-neighbour query.

use serde::{Deserialize, Serialize};

/// A memory record, matching the `memories` table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// Auto-incrementing primary key, shared with `memories_vec.rowid`.
    pub id: i64,
    /// The stored prompt text.
    pub description: String,
    /// Best clarity score (1-10) seen while refining this prompt, if any.
    pub clarity: Option<u8>,
    /// RFC 3339 creation timestamp. `None` for rows created before schema v2.
    pub created_at: Option<String>,
}

/// One nearest-neighbour result, ordered by ascending `distance`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryMatch {
    pub id: i64,
    pub description: String,
    /// Cosine distance to the query: 0 is identical, 2 is opposite.
    pub distance: f64,
    pub clarity: Option<u8>,
}
