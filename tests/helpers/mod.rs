#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use iris::db;
use iris::embedding::{EmbeddingProvider, EMBEDDING_DIM};
use iris::error::EndpointError;
use iris::llm::{ChatMessage, CompletionClient};
use iris::memory::MemoryStore;
use rusqlite::Connection;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// Deterministic embedding with a spike at position `seed`.
/// Different seeds are orthogonal (cosine distance 1).
pub fn test_embedding(seed: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    v[seed % EMBEDDING_DIM] = 1.0;
    v
}

/// Embeds text as a spike chosen by hashing the text, so identical text
/// gets identical vectors. `overrides` pins specific texts to specific vectors.
pub struct FakeEmbedder {
    dims: usize,
    overrides: Vec<(String, Vec<f32>)>,
    calls: Mutex<usize>,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::with_dims(EMBEDDING_DIM)
    }

    pub fn with_dims(dims: usize) -> Self {
        Self {
            dims,
            overrides: vec![],
            calls: Mutex::new(0),
        }
    }

    pub fn pin(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.overrides.push((text.to_string(), vector));
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl EmbeddingProvider for FakeEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EndpointError> {
        *self.calls.lock().unwrap() += 1;
        if let Some((_, v)) = self.overrides.iter().find(|(t, _)| t == text) {
            return Ok(v.clone());
        }
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut v = vec![0.0f32; self.dims];
        v[(hasher.finish() as usize) % self.dims] = 1.0;
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// Answers completion calls from a queue and records each user message.
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, u16>>>,
    user_messages: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Result<String, u16>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            user_messages: Mutex::new(vec![]),
        })
    }

    /// One critique per score, each with a rewritten prompt naming its pass.
    pub fn critiques(scores: &[u8]) -> Arc<Self> {
        Self::new(
            scores
                .iter()
                .enumerate()
                .map(|(i, s)| Ok(critique(*s, &format!("Rewritten prompt from pass {}.", i + 1))))
                .collect(),
        )
    }

    pub fn user_messages(&self) -> Vec<String> {
        self.user_messages.lock().unwrap().clone()
    }
}

impl CompletionClient for ScriptedClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, EndpointError> {
        if let Some(user) = messages.last() {
            self.user_messages.lock().unwrap().push(user.content.clone());
        }
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(status)) => Err(EndpointError::from_status(status, "scripted failure")),
            None => Err(EndpointError::MalformedResponse("no scripted reply left".into())),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// A critique in the shape the template asks for.
pub fn critique(score: u8, rewritten: &str) -> String {
    format!(
        "Clarity rating: {score}\n\
         Specific issues:\n1. a\n2. b\n3. c\n\
         Suggestions:\n1. d\n2. e\n3. f\n\
         Rewritten prompt:\n\"{rewritten}\""
    )
}

/// A memory store over a fresh in-memory database.
pub fn test_store(embedder: Arc<dyn EmbeddingProvider>) -> (MemoryStore, Arc<Mutex<Connection>>) {
    let db = Arc::new(Mutex::new(test_db()));
    (MemoryStore::new(Arc::clone(&db), embedder), db)
}
