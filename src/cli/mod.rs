pub mod decompose;
pub mod doctor;
pub mod init;
pub mod refine;
pub mod save;
pub mod search;
pub mod stats;

use anyhow::Result;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use iris::config::IrisConfig;
use iris::db;
use iris::embedding::{self, EmbeddingProvider};
use iris::llm::{self, CompletionClient};
use iris::memory::MemoryStore;

/// Open the configured database and warn if its vectors came from another model.
pub fn open_db(config: &IrisConfig) -> Result<Connection> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;

    if let Ok(Some(stored_model)) = db::migrations::get_embedding_model(&conn) {
        if stored_model != config.embedding.model {
            tracing::warn!(
                stored = %stored_model,
                configured = %config.embedding.model,
                "embedding model changed; distances to existing memories are not comparable"
            );
        }
    }

    Ok(conn)
}

pub fn embedding_provider(config: &IrisConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider = embedding::create_provider(&config.llm, &config.embedding, config.api_key()?)?;
    Ok(Arc::from(provider))
}

pub fn completion_client(config: &IrisConfig) -> Result<Arc<dyn CompletionClient>> {
    let client = llm::create_client(&config.llm, config.api_key()?)?;
    tracing::info!(model = %client.model(), "completion client ready");
    Ok(Arc::new(client))
}

/// Database + embedding provider, wired into a [`MemoryStore`].
pub fn memory_store(config: &IrisConfig) -> Result<MemoryStore> {
    let conn = open_db(config)?;
    let embedding = embedding_provider(config)?;
    Ok(MemoryStore::new(Arc::new(Mutex::new(conn)), embedding))
}
