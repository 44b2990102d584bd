//! Pull the rewritten prompt out of a critique.
//!
//! The critique is free-form model text, so marker detection tolerates
//! markdown headings, bold markers and list numbering around the
//! "Rewritten prompt:" label.

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// What to do when no rewritten-prompt marker and no quoted line is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Fail with [`ExtractionError::NoMarker`].
    #[default]
    Strict,
    /// Return the whole input, trimmed of quotes and whitespace.
    Permissive,
}

/// Labels that introduce the rewritten prompt. Matched after normalization.
const PROMPT_MARKERS: &[&str] = &["fully rewritten prompt", "rewritten prompt"];

/// Labels that end the rewritten prompt section.
const SECTION_MARKERS: &[&str] = &["clarity rating", "specific issues"];

/// Extract the rewritten prompt from a critique.
///
/// Collects text after the marker (same line and following lines) up to the
/// next blank line or section marker. If no marker yields text, the first line
/// wrapped entirely in quotes is used, then `policy` decides.
pub fn extract_final_prompt(
    critique_text: &str,
    policy: FallbackPolicy,
) -> Result<String, ExtractionError> {
    let lines: Vec<&str> = critique_text.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        let Some(inline) = strip_prompt_marker(line) else {
            continue;
        };

        let mut parts: Vec<&str> = Vec::new();
        if !inline.is_empty() {
            parts.push(inline);
        }
        for next in &lines[i + 1..] {
            let next = next.trim();
            if next.is_empty() || is_section_marker(next) {
                break;
            }
            parts.push(next);
        }

        let joined = parts.join(" ");
        let prompt = trim_quotes(&joined);
        if !prompt.is_empty() {
            return Ok(prompt.to_string());
        }
    }

    if let Some(quoted) = lines.iter().find_map(|l| quoted_line(l)) {
        return Ok(quoted.to_string());
    }

    match policy {
        FallbackPolicy::Strict => Err(ExtractionError::NoMarker),
        FallbackPolicy::Permissive => Ok(trim_quotes(critique_text).to_string()),
    }
}

/// If `line` is a rewritten-prompt label, return whatever follows the label.
fn strip_prompt_marker(line: &str) -> Option<&str> {
    let label = strip_decoration(line);
    let lower = label.to_lowercase();

    for marker in PROMPT_MARKERS {
        if starts_with_label(&lower, marker) {
            let Some(rest) = label.get(marker.len()..) else {
                continue;
            };
            let rest = rest.trim_start_matches(|c: char| c == '*' || c == '_');
            let rest = rest.strip_prefix(':').unwrap_or(rest);
            let rest = rest.trim_start_matches(|c: char| c == '*' || c == '_');
            return Some(rest.trim());
        }
    }
    None
}

fn is_section_marker(line: &str) -> bool {
    let lower = strip_decoration(line).to_lowercase();
    SECTION_MARKERS
        .iter()
        .chain(PROMPT_MARKERS)
        .any(|m| starts_with_label(&lower, m))
}

/// `line` begins with `label` as a whole phrase: "rewritten prompt:" matches,
/// "rewritten prompts tend to..." does not.
fn starts_with_label(line: &str, label: &str) -> bool {
    line.strip_prefix(label)
        .is_some_and(|rest| rest.chars().next().is_none_or(|c| !c.is_alphanumeric()))
}

/// Drop leading markdown (`#`, `*`, `_`, `>`, `-`) and list numbering (`4.`, `4)`).
fn strip_decoration(line: &str) -> &str {
    let s = line
        .trim()
        .trim_start_matches(|c: char| matches!(c, '#' | '*' | '_' | '>' | '-') || c.is_whitespace());
    let digits = s.len() - s.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        let after = &s[digits..];
        if let Some(rest) = after.strip_prefix('.').or_else(|| after.strip_prefix(')')) {
            return rest.trim_start_matches(|c: char| {
                matches!(c, '#' | '*' | '_') || c.is_whitespace()
            });
        }
    }
    s
}

/// Content of a line wrapped entirely in double quotes.
fn quoted_line(line: &str) -> Option<&str> {
    let t = line.trim();
    let inner = t
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| t.strip_prefix('\u{201c}').and_then(|s| s.strip_suffix('\u{201d}')))?;
    let inner = inner.trim();
    (!inner.is_empty()).then_some(inner)
}

fn trim_quotes(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\u{201c}' | '\u{201d}'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = "\
Clarity rating: 6
Specific issues:
1. Vague audience
2. No length limit
3. No format
Suggestions:
1. Name the audience
2. Cap the length
3. Ask for bullets
Rewritten prompt:
\"Summarize the phrase 'Prompt Fractal' in one sentence
for a non-technical reader.\"
";

    const MARKDOWN: &str = "\
**Clarity Rating:** 8/10

**Specific Issues:**
1. Ambiguous scope

**Fully Rewritten Prompt:** \"List three infrastructure challenges for rural AI tutoring.\"

**Clarity rating:** 9
";

    const NUMBERED: &str = "\
1. Clarity rating: 7
2. Specific issues: too broad
4. Rewritten prompt:
Explain vector databases in under 100 words.
Clarity rating: 8
";

    #[test]
    fn extracts_multiline_block() {
        assert_eq!(
            extract_final_prompt(PLAIN, FallbackPolicy::Strict).unwrap(),
            "Summarize the phrase 'Prompt Fractal' in one sentence for a non-technical reader."
        );
    }

    #[test]
    fn extracts_inline_markdown_marker() {
        assert_eq!(
            extract_final_prompt(MARKDOWN, FallbackPolicy::Strict).unwrap(),
            "List three infrastructure challenges for rural AI tutoring."
        );
    }

    #[test]
    fn stops_at_section_marker() {
        assert_eq!(
            extract_final_prompt(NUMBERED, FallbackPolicy::Strict).unwrap(),
            "Explain vector databases in under 100 words."
        );
    }

    #[test]
    fn empty_marker_falls_through_to_quoted_line() {
        let text = "Rewritten prompt:\n\n\"Describe the water cycle.\"";
        assert_eq!(
            extract_final_prompt(text, FallbackPolicy::Strict).unwrap(),
            "Describe the water cycle."
        );
    }

    #[test]
    fn strict_without_marker_fails() {
        let err = extract_final_prompt("Just some prose.", FallbackPolicy::Strict).unwrap_err();
        assert_eq!(err, ExtractionError::NoMarker);
    }

    #[test]
    fn permissive_without_marker_passes_through() {
        assert_eq!(
            extract_final_prompt("  \"Just some prose.  ", FallbackPolicy::Permissive).unwrap(),
            "Just some prose."
        );
    }

    #[test]
    fn permissive_is_idempotent_on_clean_text() {
        for text in [
            "Write a haiku about autumn.",
            "Line one\nline two",
            "\"Quoted prompt\"",
            "   padded   ",
        ] {
            let once = extract_final_prompt(text, FallbackPolicy::Permissive).unwrap();
            let twice = extract_final_prompt(&once, FallbackPolicy::Permissive).unwrap();
            assert_eq!(once, twice, "not idempotent for {text:?}");
        }
    }

    #[test]
    fn prose_starting_with_marker_words_is_not_a_marker() {
        let text = "Clarity rating: 7\n\
Rewritten prompts tend to be longer than originals.\n\
\n\
Rewritten prompt:\n\
Describe the water cycle.";
        assert_eq!(
            extract_final_prompt(text, FallbackPolicy::Strict).unwrap(),
            "Describe the water cycle."
        );
    }

    #[test]
    fn section_marker_needs_whole_label() {
        let text = "Rewritten prompt:\n\
Rate the clarity of each answer.\n\
Clarity ratings should be listed last.";
        assert_eq!(
            extract_final_prompt(text, FallbackPolicy::Strict).unwrap(),
            "Rate the clarity of each answer. Clarity ratings should be listed last."
        );
        assert!(is_section_marker("**Clarity rating:** 8"));
        assert!(!is_section_marker("Clarity ratings vary"));
    }

    #[test]
    fn decoration_is_stripped() {
        assert_eq!(strip_decoration("### Rewritten prompt"), "Rewritten prompt");
        assert_eq!(strip_decoration("4. **Rewritten**"), "Rewritten**");
        assert_eq!(strip_decoration("- item"), "item");
        assert_eq!(strip_decoration("2024 was a year"), "2024 was a year");
    }
}
