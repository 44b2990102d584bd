//! One input prompt, end to end: recall → gate → refine → extract → save.

use serde::Serialize;
use uuid::Uuid;

use crate::config::{RecallConfig, RefinementConfig};
use crate::decompose::Decomposer;
use crate::error::Result;
use crate::memory::types::MemoryMatch;
use crate::memory::MemoryStore;
use crate::refine::extract::{extract_final_prompt, FallbackPolicy};
use crate::refine::{Refiner, StopReason};

/// Everything a caller needs to know about one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub input: String,
    pub final_prompt: String,
    pub clarity: Option<u8>,
    pub memory_id: i64,
    pub passes: usize,
    pub stop_reason: StopReason,
    pub memory_context_used: bool,
}

/// Per-run knobs, taken from config and overridable from the CLI.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub max_passes: u32,
    pub stop_score: u8,
    pub extraction: FallbackPolicy,
    pub recall_enabled: bool,
    pub top_n: usize,
    pub max_distance: f64,
    pub required_clarity: u8,
}

impl PipelineOptions {
    pub fn from_config(refinement: &RefinementConfig, recall: &RecallConfig) -> Self {
        Self {
            max_passes: refinement.max_passes,
            stop_score: refinement.stop_score,
            extraction: refinement.extraction,
            recall_enabled: recall.enabled,
            top_n: recall.top_n,
            max_distance: recall.max_distance,
            required_clarity: recall.required_clarity,
        }
    }
}

pub struct Pipeline {
    store: MemoryStore,
    refiner: Refiner,
    decomposer: Option<Decomposer>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(store: MemoryStore, refiner: Refiner, options: PipelineOptions) -> Self {
        Self {
            store,
            refiner,
            decomposer: None,
            options,
        }
    }

    /// Run prompts through the decomposer before anything else.
    pub fn with_decomposer(mut self, decomposer: Decomposer) -> Self {
        self.decomposer = Some(decomposer);
        self
    }

    /// Process one prompt. Any failure aborts the run before the save step.
    pub fn run(&self, prompt: &str) -> Result<RunReport> {
        let run_id = Uuid::now_v7();
        let span = tracing::info_span!("run", %run_id);
        let _guard = span.enter();

        let working = match &self.decomposer {
            Some(decomposer) => decomposer.run(prompt)?,
            None => prompt.to_string(),
        };

        // 1-2. Recall and gate
        let memory_context = if self.options.recall_enabled {
            let matches = self.store.find_top_n(&working, self.options.top_n)?;
            if should_inject_memory(
                &matches,
                self.options.max_distance,
                self.options.required_clarity,
            ) {
                tracing::info!(
                    distance = matches[0].distance,
                    memories = matches.len(),
                    "injecting memory context"
                );
                build_memory_context(&matches)
            } else {
                String::new()
            }
        } else {
            String::new()
        };

        // 3. Refine
        let result = self.refiner.refine(
            &working,
            self.options.max_passes,
            self.options.stop_score,
            &memory_context,
        )?;

        // 4. Extract
        let final_prompt = extract_final_prompt(&result.final_prompt, self.options.extraction)?;

        // 5. Save
        let memory_id = self.store.save(&final_prompt, result.clarity_rating)?;

        tracing::info!(
            memory_id,
            clarity = ?result.clarity_rating,
            passes = result.history.len(),
            "run complete"
        );

        Ok(RunReport {
            run_id,
            input: prompt.to_string(),
            final_prompt,
            clarity: result.clarity_rating,
            memory_id,
            passes: result.history.len(),
            stop_reason: result.stop_reason,
            memory_context_used: !memory_context.is_empty(),
        })
    }
}

/// Inject recalled memories only when the nearest one is both close
/// (`distance < max_distance`) and top-rated (`clarity == required_clarity`).
pub fn should_inject_memory(
    matches: &[MemoryMatch],
    max_distance: f64,
    required_clarity: u8,
) -> bool {
    matches
        .first()
        .is_some_and(|m| m.distance < max_distance && m.clarity == Some(required_clarity))
}

/// Render recalled memories as a block to prepend to critique requests.
pub fn build_memory_context(matches: &[MemoryMatch]) -> String {
    if matches.is_empty() {
        return String::new();
    }
    let mut context =
        String::from("Examples of previously refined prompts that worked well:\n");
    for m in matches {
        context.push_str("- ");
        context.push_str(m.description.trim());
        context.push('\n');
    }
    context.push('\n');
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(distance: f64, clarity: Option<u8>) -> MemoryMatch {
        MemoryMatch {
            id: 1,
            description: "Summarize the water cycle for ten-year-olds.".into(),
            distance,
            clarity,
        }
    }

    #[test]
    fn gate_requires_close_and_top_rated() {
        assert!(should_inject_memory(&[hit(0.15, Some(10))], 0.2, 10));
        assert!(!should_inject_memory(&[hit(0.15, Some(7))], 0.2, 10));
        assert!(!should_inject_memory(&[hit(0.25, Some(10))], 0.2, 10));
        assert!(!should_inject_memory(&[hit(0.2, Some(10))], 0.2, 10));
        assert!(!should_inject_memory(&[hit(0.05, None)], 0.2, 10));
        assert!(!should_inject_memory(&[], 0.2, 10));
    }

    #[test]
    fn gate_only_looks_at_nearest() {
        let matches = [hit(0.3, Some(10)), hit(0.1, Some(10))];
        assert!(!should_inject_memory(&matches, 0.2, 10));
    }

    #[test]
    fn context_lists_every_match() {
        let mut second = hit(0.18, Some(9));
        second.description = "  Explain photosynthesis simply. ".into();
        let context = build_memory_context(&[hit(0.1, Some(10)), second]);

        assert!(context.starts_with("Examples of previously refined prompts"));
        assert!(context.contains("- Summarize the water cycle for ten-year-olds.\n"));
        assert!(context.contains("- Explain photosynthesis simply.\n"));
        assert!(context.ends_with("\n\n"));
        assert!(build_memory_context(&[]).is_empty());
    }
}
