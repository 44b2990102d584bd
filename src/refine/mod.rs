//! The critique-rewrite refinement loop.
//!
//! Each pass sends the current text to the [`Critic`], scores the critique with
//! a [`ScoreParser`], and feeds the critique itself into the next pass. The
//! loop stops early once two consecutive passes are at or near `stop_score`:
//! the current score must reach `stop_score` and the previous one must reach
//! `stop_score - 1`. A single high score never stops the loop.

pub mod critic;
pub mod extract;
pub mod score;

use serde::Serialize;

use crate::error::EndpointError;
pub use critic::Critic;
use score::{ClarityLineParser, ScoreParser};

/// One pass through the loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefinementPass {
    /// 1-based pass number.
    pub index: u32,
    pub output_text: String,
    pub score: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopReason {
    /// Two consecutive passes met the stability rule at this pass.
    AutoStop { pass: u32 },
    /// `max_passes` ran out.
    Exhausted,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefinementResult {
    pub final_prompt: String,
    /// Best score seen in the run, not necessarily the score of `final_prompt`.
    pub clarity_rating: Option<u8>,
    pub history: Vec<RefinementPass>,
    pub stop_reason: StopReason,
}

/// Loop state between passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Running {
        pass_index: u32,
        previous_score: Option<u8>,
        best_score: Option<u8>,
    },
    StoppedAuto,
    StoppedExhausted,
}

pub struct Refiner {
    critic: Critic,
    parser: Box<dyn ScoreParser>,
}

impl Refiner {
    /// A refiner using the default [`ClarityLineParser`].
    pub fn new(critic: Critic) -> Self {
        Self {
            critic,
            parser: Box::new(ClarityLineParser),
        }
    }

    pub fn with_parser(mut self, parser: Box<dyn ScoreParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Run up to `max_passes` critique passes starting from `initial_prompt`.
    ///
    /// `memory_context` is prepended to every pass. Endpoint errors abort the
    /// run; score parse failures only cost that pass its score.
    pub fn refine(
        &self,
        initial_prompt: &str,
        max_passes: u32,
        stop_score: u8,
        memory_context: &str,
    ) -> Result<RefinementResult, EndpointError> {
        let mut history: Vec<RefinementPass> = Vec::new();
        let mut current = initial_prompt.to_string();
        let mut best = None;
        let mut state = LoopState::Running {
            pass_index: 1,
            previous_score: None,
            best_score: None,
        };

        while let LoopState::Running {
            pass_index,
            previous_score,
            best_score,
        } = state
        {
            if pass_index > max_passes {
                best = best_score;
                state = LoopState::StoppedExhausted;
                break;
            }

            let output = self.critic.critique(&current, memory_context)?;
            let score = self.score(pass_index, &output);
            let best_score = max_score(best_score, score);

            tracing::info!(
                pass = pass_index,
                score = ?score,
                best_score = ?best_score,
                "refinement pass complete"
            );

            history.push(RefinementPass {
                index: pass_index,
                output_text: output.clone(),
                score,
            });
            current = output;
            best = best_score;

            state = if is_stable(score, previous_score, stop_score) {
                tracing::info!(pass = pass_index, stop_score, "auto-stop: clarity stable");
                LoopState::StoppedAuto
            } else {
                LoopState::Running {
                    pass_index: pass_index + 1,
                    previous_score: score.or(previous_score),
                    best_score,
                }
            };
        }

        let stop_reason = match state {
            LoopState::StoppedAuto => StopReason::AutoStop {
                pass: history.last().map(|p| p.index).unwrap_or(0),
            },
            _ => StopReason::Exhausted,
        };

        Ok(RefinementResult {
            final_prompt: current,
            clarity_rating: best,
            history,
            stop_reason,
        })
    }

    fn score(&self, pass: u32, critique: &str) -> Option<u8> {
        match self.parser.parse(critique) {
            Ok(score) => {
                if score.is_none() {
                    tracing::debug!(pass, "no clarity line in critique");
                }
                score
            }
            Err(e) => {
                tracing::warn!(pass, error = %e, "could not parse clarity score");
                None
            }
        }
    }
}

/// Both the current and the previous score are at or near the target.
fn is_stable(score: Option<u8>, previous: Option<u8>, stop_score: u8) -> bool {
    match (score, previous) {
        (Some(s), Some(p)) => s >= stop_score && p >= stop_score.saturating_sub(1),
        _ => false,
    }
}

fn max_score(a: Option<u8>, b: Option<u8>) -> Option<u8> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatMessage, CompletionClient};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replies with "Clarity rating: N" per scripted score (or no rating line for `None`).
    struct Scripted {
        scores: Mutex<VecDeque<Option<u8>>>,
        calls: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(scores: &[Option<u8>]) -> Arc<Self> {
            Arc::new(Self {
                scores: Mutex::new(scores.iter().copied().collect()),
                calls: Mutex::new(vec![]),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CompletionClient for Scripted {
        fn complete(&self, messages: &[ChatMessage]) -> Result<String, EndpointError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(messages[1].content.clone());
            let n = calls.len();
            match self.scores.lock().unwrap().pop_front() {
                Some(Some(s)) => Ok(format!("Clarity rating: {s}\nRewritten prompt:\npass {n}")),
                Some(None) => Ok(format!("Rewritten prompt:\npass {n}")),
                None => Err(EndpointError::Server {
                    status: 500,
                    body: "script exhausted".into(),
                }),
            }
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn refiner(client: Arc<Scripted>) -> Refiner {
        Refiner::new(Critic::new(client))
    }

    fn scores(result: &RefinementResult) -> Vec<Option<u8>> {
        result.history.iter().map(|p| p.score).collect()
    }

    #[test]
    fn stops_once_previous_is_near_target() {
        // Pass 3 scores 9 after an 8 (>= 9 - 1), so the second 9 is never requested.
        let client = Scripted::new(&[Some(6), Some(8), Some(9), Some(9), Some(10)]);
        let result = refiner(client.clone()).refine("X", 5, 9, "").unwrap();

        assert_eq!(scores(&result), vec![Some(6), Some(8), Some(9)]);
        assert_eq!(result.stop_reason, StopReason::AutoStop { pass: 3 });
        assert_eq!(result.clarity_rating, Some(9));
        assert_eq!(result.final_prompt, result.history[2].output_text);
        assert_eq!(client.calls().len(), 3);
    }

    #[test]
    fn stops_on_second_consecutive_high_score() {
        // 7 is below 9 - 1, so pass 3's 9 only becomes `previous` for pass 4.
        let client = Scripted::new(&[Some(6), Some(7), Some(9), Some(9), Some(10)]);
        let result = refiner(client.clone()).refine("X", 5, 9, "").unwrap();

        assert_eq!(scores(&result), vec![Some(6), Some(7), Some(9), Some(9)]);
        assert_eq!(result.stop_reason, StopReason::AutoStop { pass: 4 });
        assert_eq!(result.clarity_rating, Some(9));
        assert!(result.final_prompt.ends_with("pass 4"));
        assert_eq!(result.final_prompt, result.history[3].output_text);
        assert_eq!(client.calls().len(), 4);
    }

    #[test]
    fn previous_near_target_is_enough() {
        // 8 >= 9 - 1, then 9 >= 9.
        let client = Scripted::new(&[Some(8), Some(9), Some(3)]);
        let result = refiner(client).refine("X", 5, 9, "").unwrap();
        assert_eq!(result.stop_reason, StopReason::AutoStop { pass: 2 });
    }

    #[test]
    fn single_high_score_does_not_stop() {
        let client = Scripted::new(&[Some(10), Some(4), Some(10)]);
        let result = refiner(client).refine("X", 3, 9, "").unwrap();

        assert_eq!(result.stop_reason, StopReason::Exhausted);
        assert_eq!(result.history.len(), 3);
        assert_eq!(result.clarity_rating, Some(10));
    }

    #[test]
    fn exhausts_and_returns_last_output() {
        let client = Scripted::new(&[Some(3), Some(4), Some(5)]);
        let result = refiner(client).refine("X", 3, 9, "").unwrap();

        assert_eq!(result.stop_reason, StopReason::Exhausted);
        assert_eq!(result.history.len(), 3);
        assert_eq!(result.clarity_rating, Some(5));
        assert_eq!(result.final_prompt, result.history[2].output_text);
    }

    #[test]
    fn best_score_is_max_not_last() {
        let client = Scripted::new(&[Some(7), Some(9), Some(5)]);
        let result = refiner(client).refine("X", 3, 10, "").unwrap();
        assert_eq!(result.clarity_rating, Some(9));
        assert_eq!(result.history[2].score, Some(5));
    }

    #[test]
    fn missing_score_keeps_previous() {
        // Pass 2 has no score; pass 3's 9 pairs with pass 1's 9.
        let client = Scripted::new(&[Some(9), None, Some(9)]);
        let result = refiner(client).refine("X", 5, 9, "").unwrap();

        assert_eq!(scores(&result), vec![Some(9), None, Some(9)]);
        assert_eq!(result.stop_reason, StopReason::AutoStop { pass: 3 });
    }

    #[test]
    fn unparseable_scores_never_abort() {
        let client = Scripted::new(&[None, None]);
        let result = refiner(client).refine("X", 2, 9, "").unwrap();
        assert_eq!(result.clarity_rating, None);
        assert_eq!(result.stop_reason, StopReason::Exhausted);
    }

    #[test]
    fn critique_output_chains_into_next_pass() {
        let client = Scripted::new(&[Some(2), Some(3)]);
        refiner(client.clone()).refine("initial", 2, 9, "CTX\n\n").unwrap();

        let calls = client.calls();
        assert_eq!(calls[0], "CTX\n\ninitial");
        assert_eq!(calls[1], "CTX\n\nClarity rating: 2\nRewritten prompt:\npass 1");
    }

    #[test]
    fn zero_passes_returns_input() {
        let client = Scripted::new(&[]);
        let result = refiner(client.clone()).refine("untouched", 0, 9, "").unwrap();
        assert_eq!(result.final_prompt, "untouched");
        assert!(result.history.is_empty());
        assert_eq!(result.stop_reason, StopReason::Exhausted);
        assert!(client.calls().is_empty());
    }

    #[test]
    fn endpoint_error_aborts() {
        let client = Scripted::new(&[Some(5)]);
        let err = refiner(client).refine("X", 3, 9, "").unwrap_err();
        assert!(matches!(err, EndpointError::Server { status: 500, .. }));
    }

    #[test]
    fn stability_rule() {
        assert!(is_stable(Some(9), Some(8), 9));
        assert!(is_stable(Some(10), Some(9), 9));
        assert!(!is_stable(Some(9), Some(7), 9));
        assert!(!is_stable(Some(8), Some(9), 9));
        assert!(!is_stable(Some(9), None, 9));
        assert!(!is_stable(None, Some(9), 9));
    }
}
