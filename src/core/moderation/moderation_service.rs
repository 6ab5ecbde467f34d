// Moderation service - public facade over the rule store and validator.
//
// Validation never waits on a refresh: it uses whatever snapshot is current.
// Refreshing surfaces backing-store failures to the caller and does not
// retry; the scheduler that calls it decides when to try again.
//
// NO storage or UI dependencies here - just pure domain logic.

use super::content_validator::ContentValidator;
use super::moderation_models::{
    FailurePolicy, ModerationConfig, RuleSnapshot, ValidationVerdict, VerdictStatus,
};
use super::rule_store::{RuleSource, RuleStore};
use crate::core::cache::RefreshError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModerationError {
    #[error("Moderation refresh failed: {0}")]
    Refresh(#[from] RefreshError),
}

// ============================================================================
// SERVICE TRAIT
// ============================================================================

/// What request handlers depend on for content moderation.
#[async_trait]
pub trait ContentFilter: Send + Sync {
    /// Check text against the current rules. Never fails.
    async fn validate_content(&self, text: &str) -> ValidationVerdict;

    /// Reload rules from the backing store.
    async fn refresh_cache(&self) -> Result<(), ModerationError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ModerationService<S: RuleSource> {
    rules: RuleStore<S>,
    config: ModerationConfig,
}

impl<S: RuleSource + 'static> ModerationService<S> {
    pub fn new(source: S, config: ModerationConfig) -> Self {
        Self {
            rules: RuleStore::new(source),
            config,
        }
    }

    pub fn rule_source(&self) -> &S {
        self.rules.source()
    }

    pub fn current_snapshot(&self) -> Arc<RuleSnapshot> {
        self.rules.current_snapshot()
    }

    pub fn current_version(&self) -> u64 {
        self.rules.current_snapshot().version()
    }

    /// Whether a rule reload is in flight. Diagnostics only.
    pub async fn is_refreshing(&self) -> bool {
        self.rules.is_refreshing().await
    }

    /// Validate text against the snapshot that is current right now.
    pub fn validate(&self, text: &str) -> ValidationVerdict {
        let snapshot = self.rules.current_snapshot();

        if snapshot.is_empty_snapshot() {
            let approved = self.config.failure_policy == FailurePolicy::FailOpen;
            tracing::debug!(approved, "No rules loaded yet, applying failure policy");
            return ValidationVerdict {
                approved,
                violations: Vec::new(),
                status: VerdictStatus::Unchecked,
                snapshot_version: 0,
            };
        }

        let verdict = ContentValidator::validate(text, &snapshot);
        if !verdict.approved {
            tracing::info!(
                version = verdict.snapshot_version,
                violations = verdict.violations.len(),
                severity = ?verdict.highest_severity(),
                "Content rejected by moderation rules"
            );
        }
        verdict
    }

    /// Reload rules, waiting at most `timeout` for the backing store.
    ///
    /// A timeout only gives up on waiting; the fetch itself keeps running and
    /// publishes its snapshot when it completes.
    pub async fn refresh_cache_with_timeout(
        &self,
        timeout: Option<Duration>,
    ) -> Result<u64, ModerationError> {
        let snapshot = self.rules.reload(timeout).await?;
        Ok(snapshot.version())
    }
}

#[async_trait]
impl<S: RuleSource + 'static> ContentFilter for ModerationService<S> {
    async fn validate_content(&self, text: &str) -> ValidationVerdict {
        self.validate(text)
    }

    async fn refresh_cache(&self) -> Result<(), ModerationError> {
        self.refresh_cache_with_timeout(self.config.refresh_timeout)
            .await
            .map(|_| ())
    }
}

// ============================================================================
// TESTS
// ============================================================================
