//! Optional pre-processing stage: split a complex prompt into subtasks, tighten
//! each one, and join them back into a single chain-of-thought prompt.
//!
//! Independent of the refinement loop. The pipeline runs it before memory
//! lookup only when decomposition is enabled.

use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::error::EndpointError;
use crate::llm::{ChatMessage, CompletionClient};

const DECOMPOSE_INSTRUCTIONS: &str = "\
You are an expert prompt engineer. Break the user's complex, multi-part prompt into 3 to 6 \
clear, standalone subtasks. Each subtask must be a complete instruction or question that can be \
understood on its own. Avoid vague wording, outlines, or nested bullets. Subtasks should be \
actionable, specific, and phrased for direct execution. Return the subtasks as a clean, \
numbered list only.";

const SUBTASK_INSTRUCTIONS: &str = "\
You are a world-class prompt engineer. Rewrite the single subtask prompt you are given so it is \
clear, concise, and directly actionable. Use precise language. Avoid ambiguity or filler.";

static LIST_NUMBERING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s*").expect("valid numbering pattern"));

pub struct Decomposer {
    client: Arc<dyn CompletionClient>,
}

impl Decomposer {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Ask the model for a numbered subtask list and return the bare subtasks.
    pub fn decompose(&self, prompt: &str) -> Result<Vec<String>, EndpointError> {
        let output = self.client.complete(&[
            ChatMessage::system(DECOMPOSE_INSTRUCTIONS),
            ChatMessage::user(prompt),
        ])?;
        Ok(parse_subtasks(&output))
    }

    /// Rewrite one subtask into a clear, actionable instruction.
    pub fn refine_subtask(&self, subtask: &str) -> Result<String, EndpointError> {
        let output = self.client.complete(&[
            ChatMessage::system(SUBTASK_INSTRUCTIONS),
            ChatMessage::user(subtask),
        ])?;
        Ok(output.trim().to_string())
    }

    /// Decompose, refine every subtask, recompose.
    ///
    /// Falls back to the original prompt when the model returns no subtasks.
    pub fn run(&self, prompt: &str) -> Result<String, EndpointError> {
        let subtasks = self.decompose(prompt)?;
        tracing::info!(subtasks = subtasks.len(), "prompt decomposed");
        if subtasks.is_empty() {
            return Ok(prompt.to_string());
        }

        let refined = subtasks
            .iter()
            .map(|s| self.refine_subtask(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recompose(&refined))
    }
}

/// Trim lines, drop blanks, strip leading `1.` / `1)` numbering.
pub fn parse_subtasks(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| LIST_NUMBERING.replace(l, "").trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Join subtasks into one prompt, separated by single spaces.
pub fn recompose(subtasks: &[String]) -> String {
    subtasks
        .iter()
        .map(|s| s.trim())
        .collect::<Vec<_>>()
        .join(" ")
}
