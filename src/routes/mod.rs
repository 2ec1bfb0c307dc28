use std::sync::Arc;

use axum::{http::StatusCode, middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::GraphStore,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{CatalogService, RecommendationEngine},
};

pub mod analytics;
pub mod movies;
pub mod people;
pub mod recommendations;

/// Shared handler state; both services are cheap clones over one store
#[derive(Clone)]
pub struct AppState {
    pub engine: RecommendationEngine,
    pub catalog: CatalogService,
}

impl AppState {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            engine: RecommendationEngine::new(store.clone()),
            catalog: CatalogService::new(store),
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        // Wraps the trace layer so the span already sees the request id.
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/recommendations", get(recommendations::recommend))
        .route("/people/:person_id/filmography", get(people::filmography))
        .route("/movies", get(movies::search))
        .route("/movies/titles", get(movies::titles))
        .route("/analytics/top-rated", get(analytics::top_rated))
        .route("/analytics/most-popular", get(analytics::most_popular))
        .route("/analytics/prolific-actors", get(analytics::prolific_actors))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
