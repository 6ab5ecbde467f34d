// JSON file rule source - a plain array of rules on disk.
//
// The file is read on every fetch, so editing it and triggering a refresh
// is enough to roll out new rules.

use crate::core::cache::StoreError;
use crate::core::moderation::{Rule, RuleSource};
use async_trait::async_trait;
use std::path::PathBuf;

pub struct JsonRuleSource {
    path: PathBuf,
}

impl JsonRuleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RuleSource for JsonRuleSource {
    async fn fetch_rules(&self) -> Result<Vec<Rule>, StoreError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let rules: Vec<Rule> = serde_json::from_str(&raw)?;
        Ok(rules)
    }
}
