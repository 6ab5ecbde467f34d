// In-memory movie source backed by a DashMap, for tests.
//
// Listing order is by title, then id, to match the SQLite store.

use crate::core::cache::{CollectionSource, StoreError};
use crate::core::catalog::Movie;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct InMemoryMovieSource {
    /// Maps movie id -> movie
    movies: DashMap<String, Movie>,
    fetches: AtomicUsize,
}

impl InMemoryMovieSource {
    pub fn new() -> Self {
        Self {
            movies: DashMap::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn upsert(&self, movie: Movie) {
        self.movies.insert(movie.id.clone(), movie);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryMovieSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CollectionSource<Movie> for InMemoryMovieSource {
    async fn fetch_all(&self) -> Result<Vec<Movie>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let mut movies: Vec<Movie> = self
            .movies
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        movies.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(movies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{MovieCatalog, MovieCatalogService};
    use std::sync::Arc;

    fn movie(id: &str, title: &str) -> Movie {
        Movie {
            id: id.to_string(),
            title: title.to_string(),
            release_year: 1968,
            genres: Vec::new(),
            average_rating: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_all_sorted() {
        let source = InMemoryMovieSource::new();
        source.upsert(movie("2", "Playtime"));
        source.upsert(movie("1", "If...."));
        source.upsert(movie("3", "Playtime"));

        let ids: Vec<String> = source
            .fetch_all()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_catalog_serves_stale_copy_until_refresh() {
        let source = InMemoryMovieSource::new();
        source.upsert(movie("1", "Playtime"));
        let catalog = Arc::new(MovieCatalogService::new(source, None));

        assert_eq!(catalog.get_all_movies().await.unwrap().len(), 1);

        // Source changes are invisible until the cache is refreshed or cleared
        catalog.movies_source().upsert(movie("2", "Mon Oncle"));
        assert_eq!(catalog.get_all_movies().await.unwrap().len(), 1);

        catalog.clear_cache();
        assert_eq!(catalog.get_all_movies().await.unwrap().len(), 2);
        assert_eq!(catalog.movies_source().fetch_count(), 2);
    }
}
