// SQLite-backed movie store - the catalog's document collection.
//
// Genres are kept as a JSON array in a TEXT column.

use crate::core::cache::{CollectionSource, StoreError};
use crate::core::catalog::Movie;
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteMovieStore {
    pool: Pool<Sqlite>,
    table: String,
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

impl SqliteMovieStore {
    /// `table` must already be validated as a plain identifier.
    pub fn new(pool: Pool<Sqlite>, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                release_year INTEGER NOT NULL,
                genres TEXT NOT NULL DEFAULT '[]',
                average_rating REAL
            );
            "#,
            self.table
        ))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    pub async fn upsert_movie(&self, movie: &Movie) -> Result<(), StoreError> {
        let genres = serde_json::to_string(&movie.genres)?;

        sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, title, release_year, genres, average_rating)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                release_year = excluded.release_year,
                genres = excluded.genres,
                average_rating = excluded.average_rating
            "#,
            self.table
        ))
        .bind(&movie.id)
        .bind(&movie.title)
        .bind(movie.release_year)
        .bind(genres)
        .bind(movie.average_rating)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl CollectionSource<Movie> for SqliteMovieStore {
    async fn fetch_all(&self) -> Result<Vec<Movie>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT id, title, release_year, genres, average_rating FROM {} ORDER BY title, id",
            self.table
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut movies = Vec::with_capacity(rows.len());
        for row in rows {
            let genres_json: String = row.get("genres");
            let genres: Vec<String> = serde_json::from_str(&genres_json).unwrap_or_else(|e| {
                tracing::warn!("Bad genres column, treating as empty: {}", e);
                Vec::new()
            });

            movies.push(Movie {
                id: row.get("id"),
                title: row.get("title"),
                release_year: row.get("release_year"),
                genres,
                average_rating: row.get("average_rating"),
            });
        }
        Ok(movies)
    }
}
