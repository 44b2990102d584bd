//! Write path: dimension check, row insert, vector insert.
//!
//! [`save_memory`] is the single entry point. The row and its vector go in
//! inside one transaction, so a failed save leaves nothing behind. Memories
//! are append-only; there is no update path.

use rusqlite::{params, Connection, Transaction};

use crate::error::StoreError;

/// Insert a new memory and its embedding. Returns the new memory id.
pub fn save_memory(
    conn: &mut Connection,
    description: &str,
    clarity: Option<u8>,
    embedding: &[f32],
) -> Result<i64, StoreError> {
    super::check_dimensions(embedding)?;

    let tx = conn.transaction()?;
    let id = insert_memory(&tx, description, clarity)?;
    insert_vec(&tx, id, embedding)?;
    tx.commit()?;

    Ok(id)
}

/// Insert a new memory row. Returns its rowid.
fn insert_memory(
    conn: &Transaction,
    description: &str,
    clarity: Option<u8>,
) -> Result<i64, StoreError> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO memories (description, clarity, created_at) VALUES (?1, ?2, ?3)",
        params![description, clarity, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert an embedding vector into the vec0 virtual table under the memory's rowid.
fn insert_vec(conn: &Transaction, id: i64, embedding: &[f32]) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO memories_vec (rowid, embedding) VALUES (?1, ?2)",
        params![id, super::embedding_to_bytes(embedding)],
    )?;
    Ok(())
}
