// Content validator - applies a rule snapshot to submitted text.
//
// Pure and synchronous: it only reads the snapshot it is handed.
// Text is normalized once (lowercased, whitespace collapsed) and every rule
// is checked in snapshot order. Every occurrence is reported, grouped by
// rule and in text order within a rule.

use super::moderation_models::{
    CompiledRule, MatchedSpan, Matcher, RuleSnapshot, ValidationVerdict, VerdictStatus, Violation,
};

/// Lowercase and collapse every whitespace run into a single space.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split text into words on non-alphanumeric boundaries.
/// Returns each word with its byte offset.
pub fn tokenize(text: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;

    for (i, c) in text.char_indices() {
        match (c.is_alphanumeric(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                tokens.push((s, &text[s..i]));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push((s, &text[s..]));
    }

    tokens
}

pub struct ContentValidator;

impl ContentValidator {
    /// Validate `text` against `snapshot`.
    ///
    /// An empty snapshot approves everything.
    pub fn validate(text: &str, snapshot: &RuleSnapshot) -> ValidationVerdict {
        let normalized = normalize(text);
        let tokens = tokenize(&normalized);

        let violations: Vec<Violation> = snapshot
            .compiled()
            .iter()
            .flat_map(|compiled| {
                Self::find_matches(compiled, &normalized, &tokens)
                    .into_iter()
                    .map(move |matched_span| Violation {
                        rule: compiled.rule.clone(),
                        matched_span,
                    })
            })
            .collect();

        ValidationVerdict {
            approved: violations.is_empty(),
            violations,
            status: VerdictStatus::Checked,
            snapshot_version: snapshot.version(),
        }
    }

    /// Every place the rule matches, in text order.
    fn find_matches(
        compiled: &CompiledRule,
        normalized: &str,
        tokens: &[(usize, &str)],
    ) -> Vec<MatchedSpan> {
        let ranges: Vec<(usize, usize)> = match &compiled.matcher {
            Matcher::Words(words) => tokens
                .windows(words.len())
                .filter(|window| {
                    window
                        .iter()
                        .zip(words.iter())
                        .all(|((_, token), word)| token == word)
                })
                .map(|window| {
                    let (first, _) = window[0];
                    let (last, last_word) = window[window.len() - 1];
                    (first, last + last_word.len())
                })
                .collect(),
            Matcher::Substring(needle) => normalized
                .match_indices(needle.as_str())
                .map(|(start, found)| (start, start + found.len()))
                .collect(),
            // Zero-width hits (e.g. a bare `\b`) carry no offending text
            Matcher::Regex(regex) => regex
                .find_iter(normalized)
                .filter(|m| !m.is_empty())
                .map(|m| (m.start(), m.end()))
                .collect(),
        };

        ranges
            .into_iter()
            .map(|(start, end)| MatchedSpan {
                start,
                end,
                text: normalized[start..end].to_string(),
            })
            .collect()
    }
}
