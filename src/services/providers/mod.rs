use crate::{error::AppResult, models::TmdbPopularPage};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Source of movie metadata for ingestion
///
/// Details come back as raw JSON so the caller decides what a malformed
/// payload means (the ingestor skips it rather than failing the batch).
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// One page of the provider's popular-movies listing, starting at page 1
    async fn popular_movies(&self, page: u32) -> AppResult<TmdbPopularPage>;

    /// Full details for one movie, with credits and keywords appended
    async fn movie_details(&self, movie_id: i64) -> AppResult<serde_json::Value>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
