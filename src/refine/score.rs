//! Clarity score parsing strategies.
//!
//! Scores come from free-form model text, so parsing is a pluggable
//! [`ScoreParser`]. `Ok(None)` means no score line was present; `Err` means a
//! line was found but could not be turned into a 1-10 score. The refinement
//! loop treats both as "no score for this pass".

use regex::Regex;

use crate::error::ScoreParseError;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

pub trait ScoreParser: Send + Sync {
    fn parse(&self, critique: &str) -> Result<Option<u8>, ScoreParseError>;
}

/// Default strategy: the first line mentioning "clarity" together with
/// "rating" or "score", stripped of markdown and punctuation, first integer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClarityLineParser;

impl ScoreParser for ClarityLineParser {
    fn parse(&self, critique: &str) -> Result<Option<u8>, ScoreParseError> {
        let Some(line) = critique.lines().find(|l| is_clarity_line(l)) else {
            return Ok(None);
        };

        let cleaned: String = line
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        let token = cleaned
            .split_whitespace()
            .find(|t| t.chars().all(|c| c.is_ascii_digit()))
            .ok_or_else(|| ScoreParseError::NoDigits(line.trim().to_string()))?;

        to_score(token).map(Some)
    }
}

fn is_clarity_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("clarity") && (lower.contains("rating") || lower.contains("score"))
}

/// Strategy driven by a caller-supplied pattern. The first capture group is the score.
#[derive(Debug, Clone)]
pub struct RegexScoreParser {
    pattern: Regex,
}

impl RegexScoreParser {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl ScoreParser for RegexScoreParser {
    fn parse(&self, critique: &str) -> Result<Option<u8>, ScoreParseError> {
        let Some(caps) = self.pattern.captures(critique) else {
            return Ok(None);
        };
        let digits = caps
            .get(1)
            .ok_or_else(|| ScoreParseError::MissingCapture(caps[0].to_string()))?;
        to_score(digits.as_str().trim()).map(Some)
    }
}

/// Tries each strategy in order; the first score found wins.
///
/// If no strategy yields a score, the first error seen is returned.
pub struct ParserChain {
    parsers: Vec<Box<dyn ScoreParser>>,
}

impl ParserChain {
    pub fn new(parsers: Vec<Box<dyn ScoreParser>>) -> Self {
        Self { parsers }
    }
}

impl ScoreParser for ParserChain {
    fn parse(&self, critique: &str) -> Result<Option<u8>, ScoreParseError> {
        let mut first_err = None;
        for parser in &self.parsers {
            match parser.parse(critique) {
                Ok(Some(score)) => return Ok(Some(score)),
                Ok(None) => {}
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

fn to_score(digits: &str) -> Result<u8, ScoreParseError> {
    let value: u64 = digits
        .parse()
        .map_err(|_| ScoreParseError::Overflow(digits.to_string()))?;
    if !(u64::from(MIN_SCORE)..=u64::from(MAX_SCORE)).contains(&value) {
        return Err(ScoreParseError::OutOfRange(value));
    }
    Ok(value as u8)
}
