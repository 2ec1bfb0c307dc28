use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::{ActorStats, PopularMovie, TopRatedMovie},
    routes::AppState,
};

pub async fn top_rated(State(state): State<AppState>) -> AppResult<Json<Vec<TopRatedMovie>>> {
    Ok(Json(state.catalog.top_rated().await?))
}

pub async fn most_popular(State(state): State<AppState>) -> AppResult<Json<Vec<PopularMovie>>> {
    Ok(Json(state.catalog.most_popular().await?))
}

pub async fn prolific_actors(State(state): State<AppState>) -> AppResult<Json<Vec<ActorStats>>> {
    Ok(Json(state.catalog.prolific_actors().await?))
}
