use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use cinegraph_api::{
    db::{GraphQuery, GraphStore, Params, Record},
    error::{AppError, AppResult},
    routes::{create_router, AppState},
};

/// Answers each query by name with canned rows
#[derive(Default)]
struct StubStore {
    answers: HashMap<&'static str, Vec<Value>>,
    fail: bool,
}

impl StubStore {
    fn answer(mut self, query: &'static str, rows: Vec<Value>) -> Self {
        self.answers.insert(query, rows);
        self
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl GraphStore for StubStore {
    async fn fetch_all(&self, query: &GraphQuery, _params: &Params) -> AppResult<Vec<Record>> {
        if self.fail {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }

        Ok(self
            .answers
            .get(query.name())
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|row| row.as_object().cloned())
            .collect())
    }

    async fn execute(&self, _query: &GraphQuery, _params: &Params) -> AppResult<u64> {
        Ok(0)
    }
}

fn app(store: StubStore) -> Router {
    create_router(AppState::new(Arc::new(store)))
}

fn heat_graph() -> StubStore {
    StubStore::default()
        .answer("resolve_title", vec![json!({ "tmdb_id": 949 })])
        .answer(
            "common_actors",
            vec![json!({
                "candidate_id": 50,
                "id": 380,
                "name": "Robert De Niro",
                "profile_path": null
            })],
        )
        .answer(
            "common_genres",
            vec![
                json!({ "candidate_id": 50, "id": 80, "name": "Crime" }),
                json!({ "candidate_id": 30, "id": 80, "name": "Crime" }),
            ],
        )
        .answer(
            "candidate_movies",
            vec![
                json!({
                    "movie_id": 30,
                    "title": "Collateral",
                    "overview": "",
                    "release_date": "2004-08-04",
                    "vote_average": 7.3,
                    "vote_count": 6000,
                    "popularity": 30.0,
                    "poster_path": null
                }),
                json!({
                    "movie_id": 50,
                    "title": "The Irishman",
                    "overview": "",
                    "release_date": "2019-11-01",
                    "vote_average": 7.6,
                    "vote_count": 7000,
                    "popularity": 40.0,
                    "poster_path": "/irishman.jpg"
                }),
            ],
        )
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health_check() {
    let (status, body) = get(app(StubStore::default()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_recommendations_by_title() {
    let (status, body) = get(app(heat_graph()), "/api/v1/recommendations?title=Heat").await;

    assert_eq!(status, StatusCode::OK);
    let movies = body.as_array().unwrap();
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0]["movie_id"], 50);
    assert_eq!(movies[0]["actor_count"], 1);
    assert_eq!(movies[0]["common_genres"], json!(["Crime"]));
    assert_eq!(movies[1]["movie_id"], 30);
}

#[tokio::test]
async fn test_recommendations_respect_limit() {
    let (status, body) = get(
        app(heat_graph()),
        "/api/v1/recommendations?title=Heat&limit=1",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_recommendations_by_movie_id_skip_title_lookup() {
    let store = heat_graph().answer("resolve_title", vec![]);
    let (status, body) = get(app(store), "/api/v1/recommendations?movie_id=949").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_title_is_an_empty_list() {
    let store = heat_graph().answer("resolve_title", vec![]);
    let (status, body) = get(app(store), "/api/v1/recommendations?title=Nope").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_recommendations_reject_bad_requests() {
    for uri in [
        "/api/v1/recommendations",
        "/api/v1/recommendations?title=",
        "/api/v1/recommendations?title=Heat&limit=0",
        "/api/v1/recommendations?title=Heat&limit=101",
        "/api/v1/recommendations?title=Heat&movie_id=949",
    ] {
        let (status, body) = get(app(heat_graph()), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string(), "{}", uri);
    }
}

#[tokio::test]
async fn test_ambiguous_title_is_a_conflict() {
    let store = StubStore::default().answer(
        "resolve_title",
        vec![json!({ "tmdb_id": 841 }), json!({ "tmdb_id": 438631 })],
    );
    let (status, body) = get(app(store), "/api/v1/recommendations?title=Dune").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("438631"));
}

#[tokio::test]
async fn test_store_failure_is_a_server_error() {
    let (status, body) = get(app(StubStore::failing()), "/api/v1/recommendations?title=Heat").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_filmography() {
    let store = StubStore::default().answer(
        "filmography",
        vec![
            json!({ "movie_id": 50, "title": "The Irishman", "release_date": "2019-11-01", "rating": 7.6 }),
            json!({ "movie_id": 949, "title": "Heat", "release_date": "1995-12-15", "rating": 7.9 }),
        ],
    );
    let (status, body) = get(app(store), "/api/v1/people/380/filmography").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["title"], "The Irishman");
    assert_eq!(body[1]["movie_id"], 949);
}

#[tokio::test]
async fn test_movie_search_validates_year_range() {
    let (status, _) = get(
        app(StubStore::default()),
        "/api/v1/movies?start_year=2020&end_year=2000",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_movie_search_and_titles() {
    let store = StubStore::default()
        .answer(
            "search_movies",
            vec![json!({
                "movie_id": 949,
                "title": "Heat",
                "release_date": "1995-12-15",
                "rating": 7.9,
                "overview": "",
                "poster": null,
                "vote_count": 7000
            })],
        )
        .answer(
            "all_titles",
            vec![json!({ "movie_id": 949, "title": "Heat" })],
        );
    let app = app(store);

    let (status, body) = get(
        app.clone(),
        "/api/v1/movies?q=He&min_rating=7&start_year=1990&sort=release_date_newest",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["title"], "Heat");

    let (status, body) = get(app, "/api/v1/movies/titles").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "movie_id": 949, "title": "Heat" }]));
}

#[tokio::test]
async fn test_analytics_endpoints() {
    let store = StubStore::default()
        .answer(
            "top_rated",
            vec![json!({ "title": "Heat", "rating": 7.9, "votes": 7000 })],
        )
        .answer(
            "most_popular",
            vec![json!({ "title": "Heat", "popularity": 45.2, "votes": 7000 })],
        )
        .answer(
            "prolific_actors",
            vec![json!({ "actor": "Robert De Niro", "movie_count": 3, "avg_rating": 7.6 })],
        );
    let app = app(store);

    let (status, body) = get(app.clone(), "/api/v1/analytics/top-rated").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["votes"], 7000);

    let (status, body) = get(app.clone(), "/api/v1/analytics/most-popular").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["popularity"], 45.2);

    let (status, body) = get(app, "/api/v1/analytics/prolific-actors").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["movie_count"], 3);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let request_id = "6f1c2a4e-7d1b-4c55-9a0e-3b2f8c9d1e00";
    let response = app(StubStore::default())
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", request_id)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], request_id);
}
