// Console layer - a line-oriented stand-in for the web request handlers.
//
// Like any outer layer it only translates: parse a line, call a core
// service, format the result. No business logic lives here.

pub mod commands;
pub mod handler;

use crate::core::catalog::MovieCatalogService;
use crate::core::moderation::ModerationService;
use crate::infra::catalog::SqliteMovieStore;
use crate::infra::moderation::SqliteRuleStore;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Services shared by every handler. Built once in `main`.
pub struct Data {
    pub moderation: Arc<ModerationService<SqliteRuleStore>>,
    pub catalog: Arc<MovieCatalogService<SqliteMovieStore>>,
}
