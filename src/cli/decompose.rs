use anyhow::Result;

use iris::config::IrisConfig;
use iris::decompose::{recompose, Decomposer};

/// Show each stage of prompt decomposition.
pub fn decompose(config: &IrisConfig, prompt: &str) -> Result<()> {
    let decomposer = Decomposer::new(super::completion_client(config)?);

    println!("Prompt:\n{}\n", prompt.trim());

    let subtasks = decomposer.decompose(prompt)?;
    println!("Subtasks:");
    for (i, sub) in subtasks.iter().enumerate() {
        println!("  {}. {}", i + 1, sub);
    }

    let refined = subtasks
        .iter()
        .map(|s| decomposer.refine_subtask(s))
        .collect::<Result<Vec<_>, _>>()?;
    println!("\nRefined subtasks:");
    for (i, sub) in refined.iter().enumerate() {
        println!("  {}. {}", i + 1, sub);
    }

    println!("\nRecomposed prompt:\n{}", recompose(&refined));
    Ok(())
}
