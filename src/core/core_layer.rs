// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "cache/mod.rs"]
pub mod cache;

#[path = "catalog/mod.rs"]
pub mod catalog;

#[path = "moderation/mod.rs"]
pub mod moderation;
