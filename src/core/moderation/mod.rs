// Core moderation module - banned-word rules and content validation.
// Following the same pattern as the catalog module.

pub mod content_validator;
pub mod moderation_models;
pub mod moderation_service;
pub mod rule_store;

pub use content_validator::*;
pub use moderation_models::*;
pub use moderation_service::*;
pub use rule_store::*;
