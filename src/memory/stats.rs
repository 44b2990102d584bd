use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::StoreError;

/// Response from [`memory_stats`].
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_memories: u64,
    pub scored_memories: u64,
    pub unscored_memories: u64,
    /// Count of memories per clarity score.
    pub by_clarity: BTreeMap<u8, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_clarity: Option<f64>,
    pub db_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_memory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_memory: Option<String>,
}

/// Compute memory store statistics.
///
/// `db_path` is used for file size calculation; pass None for in-memory databases.
pub fn memory_stats(conn: &Connection, db_path: Option<&Path>) -> Result<StatsResponse, StoreError> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
    let by_clarity = count_by_clarity(conn)?;
    let scored: u64 = by_clarity.values().sum();

    let average_clarity: Option<f64> = conn.query_row(
        "SELECT AVG(clarity) FROM memories WHERE clarity IS NOT NULL",
        [],
        |row| row.get(0),
    )?;

    let (oldest, newest): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(created_at), MAX(created_at) FROM memories",
        params![],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(StatsResponse {
        total_memories: total as u64,
        scored_memories: scored,
        unscored_memories: (total as u64).saturating_sub(scored),
        by_clarity,
        average_clarity,
        db_size_bytes,
        oldest_memory: oldest,
        newest_memory: newest,
    })
}

fn count_by_clarity(conn: &Connection) -> Result<BTreeMap<u8, u64>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT clarity, COUNT(*) FROM memories WHERE clarity IS NOT NULL GROUP BY clarity",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, u8>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows.into_iter().map(|(c, n)| (c, n as u64)).collect())
}
