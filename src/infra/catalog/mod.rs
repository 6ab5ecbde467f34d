// Movie sources for the catalog cache.

#[cfg(test)]
pub mod in_memory;
pub mod sqlite_movie_store;

pub use sqlite_movie_store::SqliteMovieStore;
