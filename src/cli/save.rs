use anyhow::{ensure, Result};

use iris::config::IrisConfig;

/// Embed and store a prompt directly, bypassing refinement.
pub fn save(config: &IrisConfig, text: &str, clarity: Option<u8>) -> Result<()> {
    ensure!(!text.trim().is_empty(), "text must not be empty");
    if let Some(c) = clarity {
        ensure!((1..=10).contains(&c), "clarity must be between 1 and 10");
    }

    let store = super::memory_store(config)?;
    let id = store.save(text.trim(), clarity)?;
    println!("Memory saved with ID: {id}");
    Ok(())
}
