use axum::{
    extract::{Path, State},
    Json,
};

use crate::{error::AppResult, models::FilmographyEntry, routes::AppState};

/// Handler for a person's filmography; an unknown person has an empty one
pub async fn filmography(
    State(state): State<AppState>,
    Path(person_id): Path<i64>,
) -> AppResult<Json<Vec<FilmographyEntry>>> {
    let movies = state.engine.filmography(person_id).await?;
    Ok(Json(movies))
}
