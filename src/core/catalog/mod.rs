pub mod catalog_models;
pub mod catalog_service;

pub use catalog_models::Movie;
pub use catalog_service::{MovieCatalog, MovieCatalogService};
