use anyhow::Result;

use iris::config::IrisConfig;

/// Display memory statistics in the terminal.
pub fn stats(config: &IrisConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = super::open_db(config)?;

    let response = iris::memory::stats::memory_stats(&conn, Some(&db_path))?;

    println!("Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total memories:      {}", response.total_memories);
    println!("  Scored:              {}", response.scored_memories);
    println!("  Unscored:            {}", response.unscored_memories);
    if let Some(avg) = response.average_clarity {
        println!("  Average clarity:     {avg:.2}");
    }
    println!();

    if !response.by_clarity.is_empty() {
        println!("By Clarity:");
        for (clarity, count) in response.by_clarity.iter().rev() {
            println!("  {:<12} {}", clarity, count);
        }
        println!();
    }

    println!("Database size:         {} bytes", response.db_size_bytes);

    if let Some(ref oldest) = response.oldest_memory {
        println!("Oldest memory:         {oldest}");
    }
    if let Some(ref newest) = response.newest_memory {
        println!("Newest memory:         {newest}");
    }

    Ok(())
}
