use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;
use crate::memory::types::{Memory, MemoryMatch};

/// Largest `k` a vec0 KNN query accepts.
pub const MAX_KNN_K: usize = 4096;

// ── Public API ────────────────────────────────────────────────────────────────

/// Vector KNN over `memories_vec`, joined back to `memories`.
///
/// Returns at most `n` matches ordered by ascending cosine distance.
/// `n` above [`MAX_KNN_K`] is clamped.
pub fn find_nearest(
    conn: &Connection,
    embedding: &[f32],
    n: usize,
) -> Result<Vec<MemoryMatch>, StoreError> {
    super::check_dimensions(embedding)?;
    if n == 0 {
        return Ok(vec![]);
    }
    if n > MAX_KNN_K {
        tracing::warn!(requested = n, max = MAX_KNN_K, "clamping nearest-neighbour count");
    }
    let n = n.min(MAX_KNN_K);

    let embedding_bytes = super::embedding_to_bytes(embedding);
    let mut stmt = conn.prepare(
        "WITH knn AS ( \
             SELECT rowid, distance FROM memories_vec \
             WHERE embedding MATCH ?1 AND k = ?2 \
         ) \
         SELECT m.id, m.description, knn.distance, m.clarity \
         FROM knn JOIN memories m ON m.id = knn.rowid \
         ORDER BY knn.distance, m.id",
    )?;

    let matches = stmt
        .query_map(params![embedding_bytes, n as i64], |row| {
            Ok(MemoryMatch {
                id: row.get(0)?,
                description: row.get(1)?,
                distance: row.get(2)?,
                clarity: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(matches)
}

/// Fetch a single memory by id.
pub fn get_memory(conn: &Connection, id: i64) -> Result<Option<Memory>, StoreError> {
    let memory = conn
        .query_row(
            "SELECT id, description, clarity, created_at FROM memories WHERE id = ?1",
            params![id],
            memory_from_row,
        )
        .optional()?;
    Ok(memory)
}

/// Most recent memories first.
pub fn list_memories(conn: &Connection, limit: usize) -> Result<Vec<Memory>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, description, clarity, created_at FROM memories ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit as i64], memory_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn memory_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Memory> {
    Ok(Memory {
        id: row.get(0)?,
        description: row.get(1)?,
        clarity: row.get(2)?,
        created_at: row.get(3)?,
    })
}
