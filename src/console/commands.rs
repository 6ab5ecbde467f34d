// Console command parsing.
//
// Lines starting with ':' are admin commands; anything else is a review
// submitted for moderation.

use crate::core::moderation::{Rule, RuleKind, Severity};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Check a review against the moderation rules
    Submit(String),
    Refresh,
    Ban(Rule),
    Unban(i64),
    Rules,
    Movies,
    Movie(String),
    ReloadMovies,
    ClearMovies,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  :refresh                            reload moderation rules
  :ban <kind> <severity> <pattern>    add a rule (kind: exact_word|substring|regex)
  :unban <id>                         remove a rule by id
  :rules                              show the active rule snapshot
  :movies                             list cached movies
  :movie <id>                         show one movie
  :reload                             reload movies from the store
  :clear                              clear the movie cache
  :help                               this text
  :quit                               exit
Anything else is submitted as a review.";

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Some(Command::Submit(line.to_string())));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "refresh" => Command::Refresh,
        "rules" => Command::Rules,
        "movies" => Command::Movies,
        "clear" => Command::ClearMovies,
        "reload" => Command::ReloadMovies,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "movie" if !args.is_empty() => Command::Movie(args.to_string()),
        "movie" => return Err("usage: :movie <id>".to_string()),
        "unban" => {
            let id = args
                .parse::<i64>()
                .map_err(|_| "usage: :unban <id>".to_string())?;
            Command::Unban(id)
        }
        "ban" => Command::Ban(parse_rule(args)?),
        other => return Err(format!("unknown command ':{}' (try :help)", other)),
    };

    Ok(Some(command))
}

fn parse_rule(args: &str) -> Result<Rule, String> {
    let mut parts = args.splitn(3, char::is_whitespace);
    let (Some(kind), Some(severity), Some(pattern)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err("usage: :ban <kind> <severity> <pattern>".to_string());
    };

    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err("pattern must not be empty".to_string());
    }

    Ok(Rule::new(
        pattern,
        kind.parse::<RuleKind>()?,
        severity.parse::<Severity>()?,
    ))
}
