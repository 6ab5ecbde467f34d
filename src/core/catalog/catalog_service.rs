// Movie catalog service - cached movie listings.
//
// The full listing is expensive to pull from the document store and changes
// rarely, so it lives in a CachedCollection. Admin actions can replace or
// clear the cached copy explicitly.

use super::catalog_models::Movie;
use crate::core::cache::{CachedCollection, CollectionSource, RefreshError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// What request handlers depend on for catalog listings.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn get_all_movies(&self) -> Result<Arc<Vec<Movie>>, RefreshError>;
    async fn find_movie(&self, id: &str) -> Result<Option<Movie>, RefreshError>;
    fn set_all_movies(&self, movies: Vec<Movie>);
    fn clear_cache(&self);
}

pub struct MovieCatalogService<S: CollectionSource<Movie>> {
    movies: CachedCollection<String, Movie, S>,
}

impl<S: CollectionSource<Movie> + 'static> MovieCatalogService<S> {
    pub fn new(source: S, fetch_timeout: Option<Duration>) -> Self {
        Self {
            movies: CachedCollection::new(source, Movie::key, fetch_timeout),
        }
    }

    /// Reload the listing from the store even if a copy is cached.
    pub async fn refresh(&self) -> Result<usize, RefreshError> {
        let movies = self.movies.refresh(None).await?;
        Ok(movies.len())
    }

    #[cfg(test)]
    pub fn movies_source(&self) -> &S {
        self.movies.source()
    }

    /// Whether a listing is cached right now.
    pub fn is_cached(&self) -> bool {
        self.movies.peek().is_some()
    }
}

#[async_trait]
impl<S: CollectionSource<Movie> + 'static> MovieCatalog for MovieCatalogService<S> {
    async fn get_all_movies(&self) -> Result<Arc<Vec<Movie>>, RefreshError> {
        self.movies.get_all().await
    }

    async fn find_movie(&self, id: &str) -> Result<Option<Movie>, RefreshError> {
        self.movies.get_by_key(&id.to_string()).await
    }

    fn set_all_movies(&self, movies: Vec<Movie>) {
        let count = movies.len();
        let version = self.movies.set_all(movies);
        tracing::info!(version, count, "Movie cache replaced");
    }

    fn clear_cache(&self) {
        self.movies.clear_cache();
        tracing::info!("Movie cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::StoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockMovieSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl CollectionSource<Movie> for MockMovieSource {
        async fn fetch_all(&self) -> Result<Vec<Movie>, StoreError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![movie("tt01", "Stalker"), movie("tt02", "Solaris")])
        }
    }

    fn movie(id: &str, title: &str) -> Movie {
        Movie {
            id: id.to_string(),
            title: title.to_string(),
            release_year: 1979,
            genres: vec!["sci-fi".to_string()],
            average_rating: Some(4.5),
        }
    }

    fn service() -> MovieCatalogService<MockMovieSource> {
        MovieCatalogService::new(
            MockMovieSource {
                fetches: AtomicUsize::new(0),
            },
            None,
        )
    }

    #[tokio::test]
    async fn test_get_all_movies_caches() {
        let service = service();
        assert!(!service.is_cached());

        let movies = service.get_all_movies().await.unwrap();
        assert_eq!(movies.len(), 2);
        assert!(service.is_cached());

        service.get_all_movies().await.unwrap();
        assert_eq!(service.movies_source_fetches(), 1);
    }

    #[tokio::test]
    async fn test_set_all_then_get_all_preserves_order() {
        let service = service();
        let movies = vec![movie("a", "A"), movie("b", "B"), movie("c", "C")];

        service.set_all_movies(movies.clone());

        assert_eq!(*service.get_all_movies().await.unwrap(), movies);
        assert_eq!(service.movies_source_fetches(), 0);
    }

    #[tokio::test]
    async fn test_clear_cache_empties_until_next_load() {
        let service = service();
        service.set_all_movies(vec![movie("a", "A")]);

        service.clear_cache();
        assert!(!service.is_cached());

        // Next read goes back to the store
        let movies = service.get_all_movies().await.unwrap();
        assert_eq!(movies[0].title, "Stalker");
    }

    #[tokio::test]
    async fn test_find_movie() {
        let service = service();

        let found = service.find_movie("tt02").await.unwrap();
        assert_eq!(found.map(|m| m.title), Some("Solaris".to_string()));
        assert!(service.find_movie("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_replaces_cached_listing() {
        let service = service();
        service.set_all_movies(vec![movie("x", "X")]);

        assert_eq!(service.refresh().await.unwrap(), 2);
        assert_eq!(service.get_all_movies().await.unwrap().len(), 2);
    }

    impl MovieCatalogService<MockMovieSource> {
        fn movies_source_fetches(&self) -> usize {
            self.movies_source().fetches.load(Ordering::SeqCst)
        }
    }
}
