use anyhow::Result;

use iris::config::IrisConfig;

/// Print the `n` stored prompts closest to `query`.
pub fn search(config: &IrisConfig, query: &str, n: usize) -> Result<()> {
    let store = super::memory_store(config)?;
    let matches = store.find_top_n(query, n)?;

    if matches.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} result(s)\n", matches.len());

    for (i, m) in matches.iter().enumerate() {
        let preview = if m.description.chars().count() > 120 {
            format!("{}...", m.description.chars().take(120).collect::<String>())
        } else {
            m.description.clone()
        };
        let clarity = m
            .clarity
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".into());
        let marker = if m.distance <= config.recall.max_distance {
            " *"
        } else {
            ""
        };

        println!(
            "  {}. [#{}] distance: {:.4}, clarity: {}{}",
            i + 1,
            m.id,
            m.distance,
            clarity,
            marker,
        );
        println!("     {}", preview);
        println!();
    }

    println!("* within similarity threshold {}", config.recall.max_distance);
    Ok(())
}
