use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::ScoredCandidate,
    routes::AppState,
    services::recommendations::DEFAULT_LIMIT,
};

pub const MAX_LIMIT: usize = 100;

/// Identify the source movie by exact `title` or by `movie_id`, not both
#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: Option<String>,
    pub movie_id: Option<i64>,
    pub limit: Option<usize>,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<Vec<ScoredCandidate>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::InvalidInput(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let recommendations = match (query.movie_id, query.title.as_deref()) {
        (Some(_), Some(_)) => {
            return Err(AppError::InvalidInput(
                "Pass either title or movie_id, not both".to_string(),
            ))
        }
        (Some(movie_id), None) => state.engine.recommend_by_id(movie_id, limit).await?,
        (None, Some(title)) if !title.trim().is_empty() => {
            state.engine.recommend(title, limit).await?
        }
        _ => {
            return Err(AppError::InvalidInput(
                "A title or movie_id is required".to_string(),
            ))
        }
    };

    Ok(Json(recommendations))
}
