// Rule store - owns the currently published rule snapshot.
//
// The snapshot lives in the same SnapshotSlot the collection cache uses, so
// reads are a single atomic load. Reloads go through a RefreshCoordinator so
// concurrent reloads share one fetch, and a failed fetch never replaces the
// snapshot that is already published.

use super::moderation_models::{Rule, RuleSnapshot};
use crate::core::cache::{RefreshCoordinator, RefreshError, SnapshotSlot, StoreError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Where moderation rules come from.
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Fetch every rule, in the order they should be evaluated.
    async fn fetch_rules(&self) -> Result<Vec<Rule>, StoreError>;
}

// ============================================================================
// STORE
// ============================================================================

pub struct RuleStore<S: RuleSource> {
    source: Arc<S>,
    current: Arc<SnapshotSlot<RuleSnapshot>>,
    coordinator: RefreshCoordinator<Arc<RuleSnapshot>>,
}

impl<S: RuleSource + 'static> RuleStore<S> {
    /// Create a store that starts with the empty (version 0) snapshot.
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            current: Arc::new(SnapshotSlot::new(RuleSnapshot::empty())),
            coordinator: RefreshCoordinator::new(),
        }
    }

    /// The latest published snapshot. Never blocks.
    pub fn current_snapshot(&self) -> Arc<RuleSnapshot> {
        self.current.load()
    }

    /// Whether a reload is running right now.
    pub async fn is_refreshing(&self) -> bool {
        self.coordinator.is_refreshing().await
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch rules and publish them as a new snapshot (previous version + 1).
    ///
    /// On failure the previously published snapshot stays current.
    pub async fn reload(&self, timeout: Option<Duration>) -> Result<Arc<RuleSnapshot>, RefreshError> {
        let source = Arc::clone(&self.source);
        let current = Arc::clone(&self.current);

        self.coordinator
            .coordinate(
                move || async move {
                    let rules = source
                        .fetch_rules()
                        .await
                        .map_err(|e| RefreshError::BackingStore(e.to_string()))?;

                    // Reserved only after a successful fetch, so failures
                    // leave no gaps in the version sequence.
                    let version = current.next_version();
                    let snapshot = Arc::new(RuleSnapshot::build(version, rules));
                    current.publish(version, Arc::clone(&snapshot));

                    tracing::info!(
                        version,
                        rule_count = snapshot.rules().len(),
                        skipped = snapshot.skipped().len(),
                        "Published moderation rule snapshot"
                    );
                    Ok(snapshot)
                },
                timeout,
            )
            .await
    }
}
