use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{MovieCard, MovieSearch, TitleEntry},
    routes::AppState,
};

/// Handler for movie search
pub async fn search(
    State(state): State<AppState>,
    Query(search): Query<MovieSearch>,
) -> AppResult<Json<Vec<MovieCard>>> {
    let movies = state.catalog.search_movies(&search).await?;
    Ok(Json(movies))
}

pub async fn titles(State(state): State<AppState>) -> AppResult<Json<Vec<TitleEntry>>> {
    Ok(Json(state.catalog.list_titles().await?))
}
