// In-memory rule source for tests.
//
// Counts fetches, can simulate a slow or failing backing store, and rules
// can be added at runtime.

use crate::core::cache::StoreError;
use crate::core::moderation::{Rule, RuleSource};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

pub struct InMemoryRuleSource {
    rules: RwLock<Vec<Rule>>,
    fetches: AtomicUsize,
    failing: AtomicBool,
    latency: Duration,
}

impl InMemoryRuleSource {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self::with_latency(rules, Duration::ZERO)
    }

    pub fn with_latency(rules: Vec<Rule>, latency: Duration) -> Self {
        Self {
            rules: RwLock::new(rules),
            fetches: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            latency,
        }
    }

    pub async fn push_rule(&self, rule: Rule) {
        self.rules.write().await.push(rule);
    }

    /// Make subsequent fetches fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryRuleSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl RuleSource for InMemoryRuleSource {
    async fn fetch_rules(&self) -> Result<Vec<Rule>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Database(
                "in-memory source set to fail".to_string(),
            ));
        }
        Ok(self.rules.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{ContentFilter, ModerationConfig, ModerationService};
    use crate::core::moderation::{RuleKind, Severity};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fetch_counts_and_failure_switch() {
        let source = InMemoryRuleSource::new(vec![Rule::new(
            "spoiler",
            RuleKind::ExactWord,
            Severity::Low,
        )]);

        assert_eq!(source.fetch_rules().await.unwrap().len(), 1);
        source.set_failing(true);
        assert!(source.fetch_rules().await.is_err());
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_service_refreshes_hit_source_once() {
        let service = Arc::new(ModerationService::new(
            InMemoryRuleSource::with_latency(
                vec![Rule::new("bad", RuleKind::Substring, Severity::Low)],
                Duration::from_millis(80),
            ),
            ModerationConfig::default(),
        ));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.refresh_cache().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(service.rule_source().fetch_count(), 1);
        assert_eq!(service.current_version(), 1);
        assert!(!service.validate_content("badly done").await.approved);
    }

    #[tokio::test]
    async fn test_recovers_after_failure() {
        let service = ModerationService::new(InMemoryRuleSource::default(), ModerationConfig::default());
        service
            .rule_source()
            .push_rule(Rule::new("bad", RuleKind::Substring, Severity::Low))
            .await;

        service.rule_source().set_failing(true);
        assert!(service.refresh_cache().await.is_err());
        assert_eq!(service.current_version(), 0);

        service.rule_source().set_failing(false);
        service.refresh_cache().await.unwrap();
        assert_eq!(service.current_version(), 1);
        assert_eq!(service.rule_source().fetch_count(), 2);
    }
}
