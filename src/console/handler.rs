// Console command handling - turns parsed commands into service calls.
//
// **Notice the pattern:**
// 1. Take the parsed command
// 2. Call the core service
// 3. Format the response based on the result

use super::commands::{Command, HELP};
use super::{Data, Error};
use crate::core::catalog::{Movie, MovieCatalog};
use crate::core::moderation::{ContentFilter, ValidationVerdict, VerdictStatus};
use std::fmt::Write;

/// What the caller should do after a command ran.
#[derive(Debug, PartialEq)]
pub enum Reply {
    Text(String),
    Quit,
}

pub async fn handle_command(data: &Data, command: Command) -> Result<Reply, Error> {
    let text = match command {
        Command::Submit(review) => {
            let verdict = data.moderation.validate_content(&review).await;
            format_verdict(&verdict)?
        }
        Command::Refresh => match data.moderation.refresh_cache().await {
            Ok(()) => format!(
                "Rules refreshed (snapshot v{}).",
                data.moderation.current_version()
            ),
            // Distinct from a rejection: the content rules are just stale
            Err(e) => format!(
                "Moderation refresh failed, still using snapshot v{}: {}",
                data.moderation.current_version(),
                e
            ),
        },
        Command::Ban(rule) => {
            let id = data.moderation.rule_source().insert_rule(&rule).await?;
            format!(
                "Added rule #{} ({} / {}): {:?}. Run :refresh to apply.",
                id, rule.kind, rule.severity, rule.pattern
            )
        }
        Command::Unban(id) => {
            if data.moderation.rule_source().delete_rule(id).await? {
                format!("Removed rule #{}. Run :refresh to apply.", id)
            } else {
                format!("No rule with id {}.", id)
            }
        }
        Command::Rules => {
            let snapshot = data.moderation.current_snapshot();
            let mut out = format!(
                "Snapshot v{} loaded {} with {} rule(s), {} skipped",
                snapshot.version(),
                snapshot.loaded_at().format("%Y-%m-%d %H:%M:%S UTC"),
                snapshot.rules().len(),
                snapshot.skipped().len()
            );
            if data.moderation.is_refreshing().await {
                out.push_str(" (reload in progress)");
            }
            for rule in snapshot.rules() {
                write!(out, "\n  [{}/{}] {}", rule.kind, rule.severity, rule.pattern)?;
            }
            for skipped in snapshot.skipped() {
                write!(out, "\n  skipped: {}", skipped)?;
            }
            out
        }
        Command::Movies => {
            let movies = data.catalog.get_all_movies().await?;
            if movies.is_empty() {
                "The catalog is empty.".to_string()
            } else {
                movies
                    .iter()
                    .map(format_movie)
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Command::Movie(id) => match data.catalog.find_movie(&id).await? {
            Some(movie) => format_movie(&movie),
            None => format!("No movie with id {}.", id),
        },
        Command::ReloadMovies => match data.catalog.refresh().await {
            Ok(count) => format!("Reloaded {} movie(s).", count),
            Err(e) => format!("Movie reload failed, keeping cached listing: {}", e),
        },
        Command::ClearMovies => {
            data.catalog.clear_cache();
            "Movie cache cleared.".to_string()
        }
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(Reply::Quit),
    };

    Ok(Reply::Text(text))
}

fn format_verdict(verdict: &ValidationVerdict) -> Result<String, std::fmt::Error> {
    let text = match (verdict.status, verdict.approved) {
        (VerdictStatus::Unchecked, true) => {
            "Review accepted unchecked: moderation is temporarily unavailable.".to_string()
        }
        (VerdictStatus::Unchecked, false) => {
            "Moderation is temporarily unavailable, please retry later.".to_string()
        }
        (VerdictStatus::Checked, true) => "Review accepted.".to_string(),
        (VerdictStatus::Checked, false) => {
            let mut out = format!(
                "Review rejected ({} violation(s)):",
                verdict.violations.len()
            );
            for violation in &verdict.violations {
                write!(
                    out,
                    "\n  [{}] {:?} matched {:?} at {}..{}",
                    violation.rule.severity,
                    violation.rule.pattern,
                    violation.matched_span.text,
                    violation.matched_span.start,
                    violation.matched_span.end
                )?;
            }
            out
        }
    };
    Ok(text)
}

fn format_movie(movie: &Movie) -> String {
    let rating = movie
        .average_rating
        .map(|r| format!("{:.1}/5", r))
        .unwrap_or_else(|| "unrated".to_string());
    let genres = if movie.genres.is_empty() {
        String::new()
    } else {
        format!(" [{}]", movie.genres.join(", "))
    };
    format!(
        "{}  {} ({}) {}{}",
        movie.id, movie.title, movie.release_year, rating, genres
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::MovieCatalogService;
    use crate::core::moderation::{ModerationConfig, ModerationService, Rule, RuleKind, Severity};
    use crate::infra::catalog::SqliteMovieStore;
    use crate::infra::moderation::SqliteRuleStore;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;

    async fn data() -> Data {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let rules = SqliteRuleStore::new(pool.clone(), "banned_words");
        rules.migrate().await.unwrap();
        let movies = SqliteMovieStore::new(pool, "movies");
        movies.migrate().await.unwrap();
        movies
            .upsert_movie(&Movie {
                id: "tt0078748".to_string(),
                title: "Alien".to_string(),
                release_year: 1979,
                genres: vec!["horror".to_string()],
                average_rating: Some(4.6),
            })
            .await
            .unwrap();

        Data {
            moderation: Arc::new(ModerationService::new(rules, ModerationConfig::default())),
            catalog: Arc::new(MovieCatalogService::new(movies, None)),
        }
    }

    async fn run(data: &Data, command: Command) -> String {
        match handle_command(data, command).await.unwrap() {
            Reply::Text(text) => text,
            Reply::Quit => panic!("unexpected quit"),
        }
    }

    #[tokio::test]
    async fn test_ban_refresh_submit_flow() {
        let data = data().await;

        // Nothing loaded yet: fail-open
        let reply = run(&data, Command::Submit("no spoiler here".to_string())).await;
        assert!(reply.contains("accepted unchecked"));

        run(
            &data,
            Command::Ban(Rule::new("spoiler", RuleKind::ExactWord, Severity::High)),
        )
        .await;
        let reply = run(&data, Command::Refresh).await;
        assert!(reply.contains("v1"));

        let reply = run(&data, Command::Submit("no spoiler here".to_string())).await;
        assert!(reply.starts_with("Review rejected (1 violation(s))"));

        let reply = run(&data, Command::Submit("spoilerific".to_string())).await;
        assert_eq!(reply, "Review accepted.");
    }

    #[tokio::test]
    async fn test_rejection_lists_each_occurrence() {
        let data = data().await;
        run(
            &data,
            Command::Ban(Rule::new("spoiler", RuleKind::ExactWord, Severity::High)),
        )
        .await;
        run(&data, Command::Refresh).await;

        let reply = run(&data, Command::Submit("spoiler one, spoiler two".to_string())).await;
        assert_eq!(
            reply,
            "Review rejected (2 violation(s)):\n  \
             [high] \"spoiler\" matched \"spoiler\" at 0..7\n  \
             [high] \"spoiler\" matched \"spoiler\" at 13..20"
        );
    }

    #[tokio::test]
    async fn test_unban() {
        let data = data().await;
        run(
            &data,
            Command::Ban(Rule::new("bad", RuleKind::Substring, Severity::Low)),
        )
        .await;

        assert!(run(&data, Command::Unban(1)).await.starts_with("Removed rule #1"));
        assert_eq!(run(&data, Command::Unban(1)).await, "No rule with id 1.");
    }

    #[tokio::test]
    async fn test_rules_lists_skipped() {
        let data = data().await;
        run(
            &data,
            Command::Ban(Rule::new("(oops", RuleKind::Regex, Severity::Low)),
        )
        .await;
        run(&data, Command::Refresh).await;

        let reply = run(&data, Command::Rules).await;
        assert!(reply.contains("1 rule(s), 1 skipped"));
        assert!(reply.contains("skipped: Malformed rule '(oops'"));
    }

    #[tokio::test]
    async fn test_movie_commands() {
        let data = data().await;

        let listing = run(&data, Command::Movies).await;
        assert_eq!(listing, "tt0078748  Alien (1979) 4.6/5 [horror]");

        let one = run(&data, Command::Movie("tt0078748".to_string())).await;
        assert_eq!(one, listing);
        assert_eq!(
            run(&data, Command::Movie("nope".to_string())).await,
            "No movie with id nope."
        );

        assert_eq!(run(&data, Command::ClearMovies).await, "Movie cache cleared.");
        assert!(!data.catalog.is_cached());

        assert_eq!(run(&data, Command::ReloadMovies).await, "Reloaded 1 movie(s).");
        assert!(data.catalog.is_cached());
    }

    #[tokio::test]
    async fn test_quit() {
        let data = data().await;
        assert_eq!(handle_command(&data, Command::Quit).await.unwrap(), Reply::Quit);
    }
}
