use serde::{Deserialize, Serialize};

/// A movie listing as shown in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub release_year: i32,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Mean review score, if the movie has any reviews
    pub average_rating: Option<f32>,
}

impl Movie {
    /// Cache key for catalog lookups.
    pub fn key(movie: &Movie) -> String {
        movie.id.clone()
    }
}
