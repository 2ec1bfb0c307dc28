/// TMDB API provider
///
/// Authenticates with a v4 read access token sent as a bearer token.
///
/// API Flow:
/// 1. Listing: /movie/popular?page=N → movie ids
/// 2. Details: /movie/{id}?append_to_response=credits,keywords → one payload
///    carrying the movie, its genres, keywords, cast and crew
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::TmdbPopularPage,
    services::providers::CatalogProvider,
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

const POPULAR_CACHE_TTL: u64 = 3600; // 1 hour
const DETAILS_CACHE_TTL: u64 = 604800; // 1 week

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    access_token: String,
    api_url: String,
    cache: Cache,
}

impl TmdbProvider {
    pub fn new(cache: Cache, access_token: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            access_token,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    fn popular_url(&self) -> String {
        format!("{}/movie/popular", self.api_url)
    }

    fn details_url(&self, movie_id: i64) -> String {
        format!("{}/movie/{}", self.api_url, movie_id)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> AppResult<T> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn popular_movies(&self, page: u32) -> AppResult<TmdbPopularPage> {
        if page == 0 {
            return Err(AppError::InvalidInput(
                "TMDB pages are numbered from 1".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::PopularPage(page),
            POPULAR_CACHE_TTL,
            async move {
                let listing: TmdbPopularPage = self
                    .get_json(
                        &self.popular_url(),
                        &[
                            ("language", "en-US".to_string()),
                            ("page", page.to_string()),
                        ],
                    )
                    .await?;

                tracing::info!(
                    page,
                    movies = listing.results.len(),
                    "Fetched popular movies page from TMDB"
                );

                Ok::<_, AppError>(listing)
            }
        )
    }

    async fn movie_details(&self, movie_id: i64) -> AppResult<serde_json::Value> {
        cached!(
            self.cache,
            CacheKey::MovieDetails(movie_id),
            DETAILS_CACHE_TTL,
            async move {
                let details: serde_json::Value = self
                    .get_json(
                        &self.details_url(movie_id),
                        &[("append_to_response", "credits,keywords".to_string())],
                    )
                    .await?;

                tracing::debug!(movie_id, "Fetched movie details from TMDB");
                Ok::<_, AppError>(details)
            }
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
