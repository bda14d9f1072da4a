//! Response extraction: turning raw model text into structured results.
//!
//! Extraction is a closed family with one dispatch point, [`Extraction::apply`].
//! Absence of a recognizable structure is never an error: `ListSplit` with no
//! matching marker and `CodeMerge` with no fences both return the raw text
//! unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::vars::Value;

/// Line-prefix list markers, in fixed priority order: numeric ordered
/// lists, single-letter alphabetic ordered lists, bullet markers.
/// Each pair is (line-anchored detector, unanchored splitter).
static LIST_PATTERNS: Lazy<[(Regex, Regex); 3]> = Lazy::new(|| {
    [
        (
            Regex::new(r"^[\s#\\]*[0-9]+\.").unwrap(),
            Regex::new(r"[\s#\\]*[0-9]+\.").unwrap(),
        ),
        (
            Regex::new(r"^[\s#\\]*[a-z]\.").unwrap(),
            Regex::new(r"[\s#\\]*[a-z]\.").unwrap(),
        ),
        (
            Regex::new(r"^[\s#\\]*[+\-*]+").unwrap(),
            Regex::new(r"[\s#\\]*[+\-*]+").unwrap(),
        ),
    ]
});

/// Triple-backtick fenced runs, non-greedy, across newlines.
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```(.*?)```").unwrap());

/// Post-processing policy applied to each raw model response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extraction {
    /// Return the raw text unchanged.
    Plain,
    /// Split an itemized response into its items.
    ListSplit,
    /// Merge all fenced code blocks into a single fence.
    CodeMerge,
    /// Split the response into sentences on Unicode boundaries.
    SentenceSplit,
}

impl Extraction {
    /// Process one raw response into a single string or an ordered list.
    ///
    /// # Example
    ///
    /// ```rust
    /// use promptgen::{Extraction, Value};
    ///
    /// let items = Extraction::ListSplit.apply("1. Apple\n2. Banana\n3. Cherry");
    /// assert_eq!(
    ///     items,
    ///     Value::List(vec!["Apple".into(), "Banana".into(), "Cherry".into()])
    /// );
    ///
    /// // No recognizable marker: the raw text comes back as a single string.
    /// let raw = Extraction::ListSplit.apply("no markers here");
    /// assert_eq!(raw, Value::Text("no markers here".into()));
    /// ```
    #[must_use]
    pub fn apply(&self, raw: &str) -> Value {
        match self {
            Extraction::Plain => Value::Text(raw.to_string()),
            Extraction::ListSplit => split_list(raw),
            Extraction::CodeMerge => merge_code(raw),
            Extraction::SentenceSplit => split_sentences(raw),
        }
    }
}

/// Split an itemized response on its list markers.
///
/// The first line matching any pattern fixes which single pattern is used
/// for the entire response; marker styles never mix within one response.
/// If no line matches, the raw text degrades to a single plain string.
fn split_list(raw: &str) -> Value {
    let selected = raw.trim().lines().find_map(|line| {
        LIST_PATTERNS
            .iter()
            .find(|(detector, _)| detector.is_match(line))
    });

    match selected {
        Some((_, splitter)) => {
            let items: Vec<String> = splitter
                .split(raw)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect();
            Value::List(items)
        }
        None => Value::Text(raw.to_string()),
    }
}

/// Merge every fenced code block into one fence.
///
/// The first block keeps its contents as-is (normally beginning with a
/// language tag); later blocks have the literal `python` stripped before
/// merging. With no fences, or nothing left after the merge, the raw
/// response comes back unchanged.
fn merge_code(raw: &str) -> Value {
    let mut blocks = Vec::new();
    for (idx, capture) in CODE_FENCE.captures_iter(raw).enumerate() {
        let block = capture[1].to_string();
        if idx == 0 {
            blocks.push(block);
        } else {
            blocks.push(block.replace("python", ""));
        }
    }

    if blocks.is_empty() {
        return Value::Text(raw.to_string());
    }

    let combined = blocks.join("\n").trim().to_string();
    if combined.is_empty() {
        Value::Text(raw.to_string())
    } else {
        Value::Text(format!("```{combined}```"))
    }
}

/// Split text into sentences on Unicode (UAX #29) boundaries.
fn split_sentences(raw: &str) -> Value {
    let sentences: Vec<String> = raw
        .unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Value::List(sentences)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(values: &[&str]) -> Value {
        Value::List(values.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn plain_is_identity() {
        let raw = "anything\nat all";
        assert_eq!(Extraction::Plain.apply(raw), Value::Text(raw.to_string()));
    }

    #[test]
    fn list_split_numbered() {
        assert_eq!(
            Extraction::ListSplit.apply("1. Apple\n2. Banana\n3. Cherry"),
            items(&["Apple", "Banana", "Cherry"])
        );
    }

    #[test]
    fn list_split_alphabetic() {
        assert_eq!(
            Extraction::ListSplit.apply("a. First\nb. Second"),
            items(&["First", "Second"])
        );
    }

    #[test]
    fn list_split_bullets() {
        assert_eq!(
            Extraction::ListSplit.apply("- one\n- two\n- three"),
            items(&["one", "two", "three"])
        );
    }

    #[test]
    fn list_split_fallback_returns_raw_text() {
        let raw = "No list here, just prose.";
        assert_eq!(
            Extraction::ListSplit.apply(raw),
            Value::Text(raw.to_string())
        );
    }

    #[test]
    fn first_matching_line_fixes_the_pattern() {
        // The bullet on the first line wins; the numbered marker on the
        // second line is never used for splitting.
        let result = Extraction::ListSplit.apply("- alpha\n1. beta");
        assert_eq!(result, items(&["alpha\n1. beta"]));
    }

    #[test]
    fn prologue_before_first_marker_becomes_an_item() {
        assert_eq!(
            Extraction::ListSplit.apply("Here are items:\n1. one\n2. two"),
            items(&["Here are items:", "one", "two"])
        );
    }

    #[test]
    fn markers_allow_heading_context() {
        assert_eq!(
            Extraction::ListSplit.apply("### 1. one\n### 2. two"),
            items(&["one", "two"])
        );
    }

    #[test]
    fn code_merge_joins_fences_and_strips_later_language_tags() {
        let raw = "intro\n```python\nprint(1)\n```\nmiddle\n```python\nprint(2)\n```\noutro";
        let merged = Extraction::CodeMerge.apply(raw);
        let Value::Text(text) = merged else {
            panic!("code merge returns text");
        };
        assert!(text.starts_with("```python"));
        assert!(text.ends_with("```"));
        assert!(text.contains("print(1)"));
        assert!(text.contains("print(2)"));
        // The second block's language tag is gone: "python" appears once.
        assert_eq!(text.matches("python").count(), 1);
    }

    #[test]
    fn code_merge_without_fences_returns_raw_text() {
        let raw = "no code at all";
        assert_eq!(
            Extraction::CodeMerge.apply(raw),
            Value::Text(raw.to_string())
        );
    }

    #[test]
    fn code_merge_with_empty_fence_returns_raw_text() {
        let raw = "``````";
        assert_eq!(
            Extraction::CodeMerge.apply(raw),
            Value::Text(raw.to_string())
        );
    }

    #[test]
    fn sentence_split_segments_sentences() {
        let result = Extraction::SentenceSplit.apply(
            "First sentence. Second sentence! Is this the third?",
        );
        assert_eq!(
            result,
            items(&["First sentence.", "Second sentence!", "Is this the third?"])
        );
    }

    #[test]
    fn sentence_split_of_empty_text_is_empty() {
        assert_eq!(Extraction::SentenceSplit.apply(""), Value::List(vec![]));
    }

    #[test]
    fn extraction_serde_uses_snake_case() {
        let json = serde_json::to_string(&Extraction::ListSplit).unwrap();
        assert_eq!(json, "\"list_split\"");
        let back: Extraction = serde_json::from_str("\"code_merge\"").unwrap();
        assert_eq!(back, Extraction::CodeMerge);
    }
}
