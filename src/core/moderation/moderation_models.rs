// Moderation domain models - rules, snapshots and verdicts.
//
// These are pure domain types with no storage dependencies.
// Storage layers convert their rows/documents into these.

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// How a rule's pattern is matched against submitted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Pattern must appear as a standalone word (or word sequence)
    ExactWord,
    /// Pattern may appear anywhere, including inside larger words
    Substring,
    /// Pattern is a regular expression
    Regex,
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleKind::ExactWord => write!(f, "exact_word"),
            RuleKind::Substring => write!(f, "substring"),
            RuleKind::Regex => write!(f, "regex"),
        }
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact_word" | "word" | "exact" => Ok(RuleKind::ExactWord),
            "substring" | "contains" => Ok(RuleKind::Substring),
            "regex" | "pattern" => Ok(RuleKind::Regex),
            other => Err(format!("unknown rule kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// A single moderation rule. Immutable once loaded into a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub pattern: String,
    pub kind: RuleKind,
    #[serde(default = "default_severity")]
    pub severity: Severity,
}

fn default_severity() -> Severity {
    Severity::Medium
}

impl Rule {
    pub fn new(pattern: impl Into<String>, kind: RuleKind, severity: Severity) -> Self {
        Self {
            pattern: pattern.into(),
            kind,
            severity,
        }
    }
}

/// A rule whose pattern could not be prepared for matching.
#[derive(Debug, Clone, Error)]
#[error("Malformed rule '{pattern}': {reason}")]
pub struct MalformedRuleError {
    pub pattern: String,
    pub reason: String,
}

/// The matcher prepared for one rule when a snapshot is built.
#[derive(Debug, Clone)]
pub(crate) enum Matcher {
    /// Normalized pattern split into words
    Words(Vec<String>),
    /// Normalized pattern
    Substring(String),
    Regex(Regex),
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub rule: Rule,
    pub matcher: Matcher,
}

impl CompiledRule {
    pub(crate) fn compile(rule: Rule) -> Result<Self, MalformedRuleError> {
        let malformed = |reason: String| MalformedRuleError {
            pattern: rule.pattern.clone(),
            reason,
        };

        let matcher = match rule.kind {
            RuleKind::ExactWord => {
                let words: Vec<String> = super::content_validator::tokenize(
                    &super::content_validator::normalize(&rule.pattern),
                )
                .into_iter()
                .map(|(_, word)| word.to_string())
                .collect();
                if words.is_empty() {
                    return Err(malformed("pattern contains no words".to_string()));
                }
                Matcher::Words(words)
            }
            RuleKind::Substring => {
                let needle = super::content_validator::normalize(&rule.pattern);
                if needle.is_empty() {
                    return Err(malformed("pattern is empty".to_string()));
                }
                Matcher::Substring(needle)
            }
            RuleKind::Regex => {
                let regex = RegexBuilder::new(&rule.pattern)
                    .case_insensitive(true)
                    .size_limit(1 << 20)
                    .build()
                    .map_err(|e| malformed(e.to_string()))?;
                if regex.is_match("") {
                    return Err(malformed("pattern matches empty text".to_string()));
                }
                Matcher::Regex(regex)
            }
        };

        Ok(Self { rule, matcher })
    }
}

/// Immutable, versioned view of the rule set at one point in time.
///
/// Built once by the rule store and shared behind an `Arc`; a refresh builds
/// a new snapshot rather than touching this one.
#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    version: u64,
    loaded_at: DateTime<Utc>,
    rules: Vec<Rule>,
    compiled: Vec<CompiledRule>,
    skipped: Vec<MalformedRuleError>,
}

impl RuleSnapshot {
    /// Version 0 with no rules. Validating against it approves everything.
    pub fn empty() -> Self {
        Self {
            version: 0,
            loaded_at: Utc::now(),
            rules: Vec::new(),
            compiled: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Build a snapshot, skipping (and logging) rules that fail to compile.
    pub fn build(version: u64, rules: Vec<Rule>) -> Self {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut skipped = Vec::new();

        for rule in &rules {
            match CompiledRule::compile(rule.clone()) {
                Ok(c) => compiled.push(c),
                Err(e) => {
                    tracing::warn!(version, kind = %rule.kind, "Skipping rule: {}", e);
                    skipped.push(e);
                }
            }
        }

        Self {
            version,
            loaded_at: Utc::now(),
            rules,
            compiled,
            skipped,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// All rules as loaded, including ones that were skipped.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules that could not be compiled.
    pub fn skipped(&self) -> &[MalformedRuleError] {
        &self.skipped
    }

    /// True for the cold-start snapshot (nothing ever loaded).
    pub fn is_empty_snapshot(&self) -> bool {
        self.version == 0
    }

    pub(crate) fn compiled(&self) -> &[CompiledRule] {
        &self.compiled
    }
}

/// Where in the normalized text a rule matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedSpan {
    /// Byte offsets into the normalized text
    pub start: usize,
    pub end: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub rule: Rule,
    pub matched_span: MatchedSpan,
}

/// Whether the verdict came from an actual rule check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    /// Checked against a loaded snapshot
    Checked,
    /// No rules were ever loaded; the failure policy decided
    Unchecked,
}

/// Result of validating one piece of text. Created per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationVerdict {
    pub approved: bool,
    /// In snapshot rule order
    pub violations: Vec<Violation>,
    pub status: VerdictStatus,
    pub snapshot_version: u64,
}

impl ValidationVerdict {
    pub fn highest_severity(&self) -> Option<Severity> {
        self.violations.iter().map(|v| v.rule.severity).max()
    }
}

/// What to do when no rules have ever been loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Accept content unchecked
    #[default]
    FailOpen,
    /// Reject content until rules are available
    FailClosed,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_open" | "open" => Ok(FailurePolicy::FailOpen),
            "fail_closed" | "closed" => Ok(FailurePolicy::FailClosed),
            other => Err(format!("unknown failure policy '{}'", other)),
        }
    }
}

/// Configuration handed to the moderation service at construction.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    pub failure_policy: FailurePolicy,
    /// How long `refresh_cache` waits for the backing store
    pub refresh_timeout: Option<Duration>,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::FailOpen,
            refresh_timeout: Some(Duration::from_secs(10)),
        }
    }
}
