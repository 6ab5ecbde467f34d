// SQLite-backed rule store for moderation rules.
//
// Table (name configurable, default `banned_words`):
// - id: insertion order, also the evaluation order
// - pattern / kind / severity: the rule itself
// - created_at: RFC 3339 timestamp

use crate::core::cache::StoreError;
use crate::core::moderation::{Rule, RuleKind, RuleSource, Severity};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteRuleStore {
    pool: Pool<Sqlite>,
    table: String,
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

impl SqliteRuleStore {
    /// `table` must already be validated as a plain identifier.
    pub fn new(pool: Pool<Sqlite>, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pattern TEXT NOT NULL,
                kind TEXT NOT NULL,
                severity TEXT NOT NULL DEFAULT 'medium',
                created_at TEXT NOT NULL
            );
            "#,
            self.table
        ))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    /// Add a rule. Returns its id.
    pub async fn insert_rule(&self, rule: &Rule) -> Result<i64, StoreError> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (pattern, kind, severity, created_at) VALUES (?, ?, ?, ?)",
            self.table
        ))
        .bind(&rule.pattern)
        .bind(rule.kind.to_string())
        .bind(rule.severity.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.last_insert_rowid())
    }

    /// Remove a rule by id. Returns whether a row was deleted.
    pub async fn delete_rule(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", self.table))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of stored rules.
    pub async fn count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {}", self.table))
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.get("n"))
    }
}

#[async_trait]
impl RuleSource for SqliteRuleStore {
    async fn fetch_rules(&self) -> Result<Vec<Rule>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT id, pattern, kind, severity FROM {} ORDER BY id",
            self.table
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut rules = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.get("id");
            let pattern: String = row.get("pattern");
            let kind: String = row.get("kind");
            let severity: String = row.get("severity");

            match (kind.parse::<RuleKind>(), severity.parse::<Severity>()) {
                (Ok(kind), Ok(severity)) => rules.push(Rule {
                    pattern,
                    kind,
                    severity,
                }),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!(id, table = %self.table, "Skipping stored rule: {}", e);
                }
            }
        }
        Ok(rules)
    }
}
