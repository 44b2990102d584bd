//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use iris::config::IrisConfig;
use iris::db;
use iris::embedding::vector_norm;

const PROBE_TEXT: &str = "Test string for embedding";

/// Run database diagnostics and print a health report.
///
/// With `probe_embedding`, also embeds a fixed string and reports its
/// dimension and L2 norm.
pub fn doctor(config: &IrisConfig, probe_embedding: bool) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `iris init` to create it.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = super::open_db(config).context("failed to open database (may be corrupt)")?;
    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("Iris Health Report");
    println!("==================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("sqlite-vec:        {}", report.sqlite_vec_version);
    println!();
    println!("Embedding model:");
    println!("  Stored:          {}", report.embedding_model.as_deref().unwrap_or("(not set)"));
    println!("  Configured:      {}", config.embedding.model);
    if let Some(ref stored) = report.embedding_model {
        if stored != &config.embedding.model {
            println!("  WARNING: model mismatch! Recall distances will be meaningless.");
        } else {
            println!("  Status:          OK (match)");
        }
    }
    println!();
    println!("Row counts:");
    println!("  Memories:        {}", report.memory_count);
    println!("  Vectors:         {}", report.vector_count);
    if report.memory_count != report.vector_count {
        println!("  WARNING: memory and vector counts differ");
    }
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
    }

    if probe_embedding {
        let provider = super::embedding_provider(config)?;
        let vector = provider
            .embed(PROBE_TEXT)
            .context("embedding probe failed")?;
        println!();
        println!("Embedding probe:");
        println!("  Dimensions:      {} (expected {})", vector.len(), provider.dimensions());
        println!("  L2 norm:         {:.6}", vector_norm(&vector));
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
