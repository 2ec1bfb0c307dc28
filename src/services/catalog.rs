use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::{
    db::{decode_record, GraphQuery, GraphStore, Params},
    error::{AppError, AppResult},
    models::{ActorStats, MovieCard, MovieSearch, PopularMovie, TitleEntry, TopRatedMovie},
};

pub const SEARCH_LIMIT: i64 = 15;

static ALL_TITLES: GraphQuery = GraphQuery::new(
    "all_titles",
    r#"
    SELECT tmdb_id AS movie_id, title
    FROM movies
    ORDER BY title, tmdb_id
    "#,
);

static TOP_RATED: GraphQuery = GraphQuery::new(
    "top_rated",
    r#"
    SELECT title, vote_average AS rating, vote_count AS votes
    FROM movies
    WHERE vote_count > 100
    ORDER BY vote_average DESC, tmdb_id
    LIMIT 10
    "#,
);

static MOST_POPULAR: GraphQuery = GraphQuery::new(
    "most_popular",
    r#"
    SELECT title, popularity, vote_count AS votes
    FROM movies
    ORDER BY popularity DESC, tmdb_id
    LIMIT 10
    "#,
);

static PROLIFIC_ACTORS: GraphQuery = GraphQuery::new(
    "prolific_actors",
    r#"
    SELECT p.name AS actor,
           count(m.tmdb_id) AS movie_count,
           avg(m.vote_average) AS avg_rating
    FROM people p
    JOIN acted_in a ON a.person_id = p.tmdb_id
    JOIN movies m ON m.tmdb_id = a.movie_id
    GROUP BY p.tmdb_id, p.name
    ORDER BY movie_count DESC, p.name
    LIMIT 10
    "#,
);

/// Builds the search query for a sort order. Movies whose release date has no
/// leading four-digit year never match a year range.
fn search_query(search: &MovieSearch) -> GraphQuery {
    GraphQuery::dynamic(
        "search_movies",
        format!(
            r#"
            SELECT m.tmdb_id AS movie_id,
                   m.title AS title,
                   m.release_date AS release_date,
                   m.vote_average AS rating,
                   m.overview AS overview,
                   m.poster_path AS poster,
                   m.vote_count AS vote_count
            FROM movies m
            WHERE strpos(m.title, $search_term) > 0
              AND m.vote_average >= $min_rating
              AND CASE WHEN m.release_date ~ '^[0-9]{{4}}'
                       THEN substring(m.release_date FROM 1 FOR 4)::int
                  END BETWEEN $start_year AND $end_year
            {}
            LIMIT $limit
            "#,
            search.sort.order_by()
        ),
    )
}

/// Read-only listings and dashboard aggregates over the movie graph
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn GraphStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    async fn fetch<T: DeserializeOwned>(&self, query: &GraphQuery, params: &Params) -> AppResult<Vec<T>> {
        self.store
            .fetch_all(query, params)
            .await?
            .into_iter()
            .map(|record| decode_record(query, record))
            .collect()
    }

    /// Filtered, sorted movie search, capped at [`SEARCH_LIMIT`] results
    #[instrument(skip(self))]
    pub async fn search_movies(&self, search: &MovieSearch) -> AppResult<Vec<MovieCard>> {
        if search.start_year > search.end_year {
            return Err(AppError::InvalidInput(format!(
                "start_year {} is after end_year {}",
                search.start_year, search.end_year
            )));
        }
        if !(0.0..=10.0).contains(&search.min_rating) {
            return Err(AppError::InvalidInput(
                "min_rating must be between 0 and 10".to_string(),
            ));
        }

        let params = Params::new()
            .with("search_term", search.q.clone().unwrap_or_default())
            .with("min_rating", search.min_rating)
            .with("start_year", search.start_year)
            .with("end_year", search.end_year)
            .with("limit", SEARCH_LIMIT);

        let movies: Vec<MovieCard> = self.fetch(&search_query(search), &params).await?;
        tracing::debug!(results = movies.len(), "Movie search completed");
        Ok(movies)
    }

    /// Every movie's id and title, alphabetically
    pub async fn list_titles(&self) -> AppResult<Vec<TitleEntry>> {
        self.fetch(&ALL_TITLES, &Params::new()).await
    }

    pub async fn top_rated(&self) -> AppResult<Vec<TopRatedMovie>> {
        self.fetch(&TOP_RATED, &Params::new()).await
    }

    pub async fn most_popular(&self) -> AppResult<Vec<PopularMovie>> {
        self.fetch(&MOST_POPULAR, &Params::new()).await
    }

    pub async fn prolific_actors(&self) -> AppResult<Vec<ActorStats>> {
        self.fetch(&PROLIFIC_ACTORS, &Params::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::graph::MockGraphStore;
    use crate::db::ParamValue;
    use crate::models::SortOrder;
    use serde_json::json;

    #[test]
    fn test_search_query_uses_requested_sort() {
        let search = MovieSearch {
            sort: SortOrder::ReleaseDateOldest,
            ..MovieSearch::default()
        };
        let query = search_query(&search);

        assert_eq!(query.name(), "search_movies");
        assert!(query.template().contains("ORDER BY m.release_date ASC"));
        assert!(query.template().contains("'^[0-9]{4}'"));
    }

    #[tokio::test]
    async fn test_search_passes_filters_as_parameters() {
        let mut store = MockGraphStore::new();
        store
            .expect_fetch_all()
            .withf(|query, params| {
                query.name() == "search_movies"
                    && params.get("search_term") == Some(&ParamValue::Text("Bat".to_string()))
                    && params.get("min_rating") == Some(&ParamValue::Float(6.5))
                    && params.get("start_year") == Some(&ParamValue::Int(1989))
                    && params.get("limit") == Some(&ParamValue::Int(SEARCH_LIMIT))
            })
            .times(1)
            .returning(|_, _| {
                let row = json!({
                    "movie_id": 268,
                    "title": "Batman",
                    "release_date": "1989-06-21",
                    "rating": 7.2,
                    "overview": "The Dark Knight of Gotham City begins his war on crime.",
                    "poster": "/cij4dd21v2Rk2YtUQbV5kW69WB2.jpg",
                    "vote_count": 8000
                });
                Ok(vec![row.as_object().cloned().unwrap()])
            });

        let catalog = CatalogService::new(Arc::new(store));
        let search = MovieSearch {
            q: Some("Bat".to_string()),
            min_rating: 6.5,
            start_year: 1989,
            end_year: 2024,
            sort: SortOrder::RatingHighest,
        };

        let results = catalog.search_movies(&search).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].movie_id, 268);
    }

    #[tokio::test]
    async fn test_search_rejects_inverted_year_range() {
        let catalog = CatalogService::new(Arc::new(MockGraphStore::new()));
        let search = MovieSearch {
            start_year: 2020,
            end_year: 2010,
            ..MovieSearch::default()
        };

        assert!(matches!(
            catalog.search_movies(&search).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_prolific_actors_decode_aggregates() {
        let mut store = MockGraphStore::new();
        store.expect_fetch_all().returning(|_, _| {
            Ok(vec![json!({ "actor": "Samuel L. Jackson", "movie_count": 7, "avg_rating": 6.9 })
                .as_object()
                .cloned()
                .unwrap()])
        });

        let catalog = CatalogService::new(Arc::new(store));
        let actors = catalog.prolific_actors().await.unwrap();

        assert_eq!(actors[0].movie_count, 7);
        assert_eq!(actors[0].avg_rating, Some(6.9));
    }
}
