// Rule sources for the moderation system, one per backing technology.

#[cfg(test)]
pub mod in_memory;
pub mod json_rule_source;
pub mod sqlite_rule_store;

pub use json_rule_source::JsonRuleSource;
pub use sqlite_rule_store::SqliteRuleStore;
