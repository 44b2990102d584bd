//! Prompt memory: persistence and nearest-neighbour recall.
//!
//! The free functions in [`store`] and [`search`] work on a borrowed
//! [`Connection`] and caller-supplied vectors. [`MemoryStore`] wraps them with
//! an embedding provider and a shared connection, acquiring the connection
//! for exactly one operation at a time.

pub mod search;
pub mod stats;
pub mod store;
pub mod types;

use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::embedding::{EmbeddingProvider, EMBEDDING_DIM};
use crate::error::StoreError;
use types::MemoryMatch;

/// Convert an f32 embedding slice to raw bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            embedding.len() * std::mem::size_of::<f32>(),
        )
    }
}

/// Reject vectors that do not match the `memories_vec` column width.
pub fn check_dimensions(embedding: &[f32]) -> Result<(), StoreError> {
    if embedding.len() != EMBEDDING_DIM {
        return Err(StoreError::DimensionMismatch {
            expected: EMBEDDING_DIM,
            actual: embedding.len(),
        });
    }
    Ok(())
}

/// Embedding-aware façade over the memory tables.
#[derive(Clone)]
pub struct MemoryStore {
    db: Arc<Mutex<Connection>>,
    embedding: Arc<dyn EmbeddingProvider>,
}

impl MemoryStore {
    pub fn new(db: Arc<Mutex<Connection>>, embedding: Arc<dyn EmbeddingProvider>) -> Self {
        Self { db, embedding }
    }

    /// Embed `prompt_text` and append it as a new memory. Returns the new id.
    pub fn save(&self, prompt_text: &str, clarity: Option<u8>) -> Result<i64, StoreError> {
        let embedding = self.embedding.embed(prompt_text)?;
        let mut conn = self.conn()?;
        let id = store::save_memory(&mut conn, prompt_text, clarity, &embedding)?;
        tracing::info!(memory_id = id, clarity = ?clarity, "memory saved");
        Ok(id)
    }

    /// Embed `query_text` and return the `n` closest memories, nearest first.
    pub fn find_top_n(&self, query_text: &str, n: usize) -> Result<Vec<MemoryMatch>, StoreError> {
        if n == 0 {
            return Ok(vec![]);
        }
        let embedding = self.embedding.embed(query_text)?;
        let conn = self.conn()?;
        let matches = search::find_nearest(&conn, &embedding, n)?;
        tracing::debug!(
            requested = n,
            returned = matches.len(),
            nearest = ?matches.first().map(|m| m.distance),
            "memory recall"
        );
        Ok(matches)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.db.lock().map_err(|_| StoreError::LockPoisoned)
    }
}
