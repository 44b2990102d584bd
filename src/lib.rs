//! Iris: iterative prompt critique and rewrite, with similarity-recalled memory.
//!
//! Iris sends a prompt to a chat-completion model, asks it to rate the
//! prompt's clarity and rewrite it, and repeats until the rating is stable
//! near the target or the pass budget runs out. The final prompt is embedded
//! and stored so later runs can recall similar, highly rated prompts.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   for cosine-distance nearest-neighbour search
//! - **Embeddings**: OpenAI-compatible `/v1/embeddings` (1536 dimensions)
//! - **Completions**: OpenAI-compatible `/v1/chat/completions`
//! - **Control flow**: single-threaded and blocking; one endpoint call per step
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite database initialization, schema, migrations, and health checks
//! - [`embedding`]: Text-to-vector embedding provider
//! - [`llm`]: Chat-completion client
//! - [`memory`]: Memory store: save, nearest-neighbour recall, stats
//! - [`refine`]: Critique step, score parsing, prompt extraction, refinement loop
//! - [`decompose`]: Optional prompt decomposition pre-stage
//! - [`pipeline`]: Recall → refine → extract → save for one prompt
//! - [`error`]: Error taxonomy

pub mod config;
pub mod db;
pub mod decompose;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod memory;
pub mod pipeline;
pub mod refine;
