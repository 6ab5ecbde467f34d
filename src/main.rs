// Entry point for the movie review moderation service.
//
// **Architecture Overview:**
// - `core/` = Business logic (caching, moderation, catalog)
// - `infra/` = Implementations of core traits (SQLite, JSON files, in-memory)
// - `console/` = Line-oriented front end standing in for the request handlers
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Start the scheduled rule refresh
// 4. Feed input lines to the console handlers

mod config;
#[path = "console/console_layer.rs"]
mod console;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::config::AppConfig;
use crate::console::commands::parse_line;
use crate::console::handler::{handle_command, Reply};
use crate::console::Data;
use crate::core::catalog::MovieCatalogService;
use crate::core::moderation::{ContentFilter, ModerationService, RuleSource};
use crate::infra::catalog::SqliteMovieStore;
use crate::infra::moderation::{JsonRuleSource, SqliteRuleStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    // Keep runtime databases in a dedicated folder so the repo root stays tidy.
    if config.database_url.contains("data/") {
        std::fs::create_dir_all("data").context("Failed to create data directory")?;
    }

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to connect to {}", config.database_url))?;

    let rule_store = SqliteRuleStore::new(pool.clone(), &config.rules_collection);
    rule_store
        .migrate()
        .await
        .context("Failed to migrate rules collection")?;
    if let Some(path) = &config.rules_seed_file {
        seed_rules(&rule_store, JsonRuleSource::new(path)).await?;
    }

    let movie_store = SqliteMovieStore::new(pool, &config.movies_collection);
    movie_store
        .migrate()
        .await
        .context("Failed to migrate movies collection")?;

    let moderation = Arc::new(ModerationService::new(rule_store, config.moderation()));
    let catalog = Arc::new(MovieCatalogService::new(
        movie_store,
        Some(config.refresh_timeout),
    ));

    // Warm the rule cache once; if it fails we keep serving fail-open/closed
    // verdicts and the scheduler tries again.
    if let Err(e) = moderation.refresh_cache().await {
        tracing::warn!("Initial rule load failed: {}", e);
    }

    spawn_rule_refresher(Arc::clone(&moderation), config.refresh_interval);

    let data = Data {
        moderation,
        catalog,
    };

    tracing::info!(
        policy = ?config.failure_policy,
        interval_secs = config.refresh_interval.as_secs(),
        "Moderation service ready"
    );
    println!("Type a review to check it, or :help for commands.");

    run_console(&data).await
}

/// Import rules from a JSON file, skipping the import if rules already exist.
async fn seed_rules(store: &SqliteRuleStore, seed: JsonRuleSource) -> Result<()> {
    if store.count().await? > 0 {
        tracing::debug!("Rules collection not empty, skipping seed file");
        return Ok(());
    }

    let rules = seed
        .fetch_rules()
        .await
        .context("Failed to read rules seed file")?;
    for rule in &rules {
        store.insert_rule(rule).await?;
    }
    tracing::info!(count = rules.len(), "Seeded moderation rules");
    Ok(())
}

/// Background refresh loop. A failed refresh is just logged; the next tick
/// is the retry.
fn spawn_rule_refresher<S: RuleSource + 'static>(
    moderation: Arc<ModerationService<S>>,
    interval: Duration,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately and main already loaded once.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            tracing::debug!("Starting scheduled rule refresh...");
            match moderation.refresh_cache().await {
                Ok(()) => tracing::debug!(
                    version = moderation.current_version(),
                    "Scheduled rule refresh done"
                ),
                Err(e) => tracing::warn!("Scheduled rule refresh failed: {}", e),
            }
        }
    });
}

async fn run_console(data: &Data) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match handle_command(data, command).await {
            Ok(Reply::Text(text)) => println!("{}", text),
            Ok(Reply::Quit) => break,
            Err(e) => {
                tracing::error!("Command failed: {}", e);
                println!("Error: {}", e);
            }
        }
    }

    tracing::info!("Shutting down");
    Ok(())
}
