//! Catalog ingestion
//!
//! Pulls popular movies from a [`CatalogProvider`] and merges them into the
//! graph. Every node and edge write is a single upsert keyed by TMDB id, so
//! re-running an ingestion updates properties in place and never duplicates
//! nodes or edges.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    db::{decode_record, GraphQuery, GraphStore, Params},
    error::AppResult,
    models::{Credit, CreditRole, Genre, Keyword, Movie, TmdbMovieDetails},
    services::providers::CatalogProvider,
};

static UPSERT_MOVIE: GraphQuery = GraphQuery::new(
    "upsert_movie",
    r#"
    INSERT INTO movies (tmdb_id, title, overview, release_date, vote_average,
                        vote_count, popularity, poster_path, last_updated)
    VALUES ($tmdb_id, $title, $overview, $release_date, $vote_average,
            $vote_count, $popularity, $poster_path, $last_updated)
    ON CONFLICT (tmdb_id) DO UPDATE SET
        title = EXCLUDED.title,
        overview = EXCLUDED.overview,
        release_date = EXCLUDED.release_date,
        vote_average = EXCLUDED.vote_average,
        vote_count = EXCLUDED.vote_count,
        popularity = EXCLUDED.popularity,
        poster_path = EXCLUDED.poster_path,
        last_updated = EXCLUDED.last_updated
    "#,
);

static UPSERT_ACTED_IN: GraphQuery = GraphQuery::new(
    "upsert_acted_in",
    r#"
    WITH person AS (
        INSERT INTO people (tmdb_id, name, profile_path, last_updated)
        VALUES ($person_id, $name, $profile_path, $last_updated)
        ON CONFLICT (tmdb_id) DO UPDATE SET
            name = EXCLUDED.name,
            profile_path = EXCLUDED.profile_path,
            last_updated = EXCLUDED.last_updated
        RETURNING tmdb_id
    )
    INSERT INTO acted_in (person_id, movie_id, character)
    SELECT tmdb_id, $movie_id, $character FROM person
    ON CONFLICT (person_id, movie_id) DO UPDATE SET character = EXCLUDED.character
    "#,
);

static UPSERT_DIRECTED: GraphQuery = GraphQuery::new(
    "upsert_directed",
    r#"
    WITH person AS (
        INSERT INTO people (tmdb_id, name, profile_path, last_updated)
        VALUES ($person_id, $name, $profile_path, $last_updated)
        ON CONFLICT (tmdb_id) DO UPDATE SET
            name = EXCLUDED.name,
            profile_path = EXCLUDED.profile_path,
            last_updated = EXCLUDED.last_updated
        RETURNING tmdb_id
    )
    INSERT INTO directed (person_id, movie_id)
    SELECT tmdb_id, $movie_id FROM person
    ON CONFLICT (person_id, movie_id) DO NOTHING
    "#,
);

static UPSERT_GENRE: GraphQuery = GraphQuery::new(
    "upsert_genre",
    r#"
    WITH genre AS (
        INSERT INTO genres (tmdb_id, name)
        VALUES ($genre_id, $name)
        ON CONFLICT (tmdb_id) DO UPDATE SET name = EXCLUDED.name
        RETURNING tmdb_id
    )
    INSERT INTO in_genre (movie_id, genre_id)
    SELECT $movie_id, tmdb_id FROM genre
    ON CONFLICT (movie_id, genre_id) DO NOTHING
    "#,
);

static UPSERT_KEYWORD: GraphQuery = GraphQuery::new(
    "upsert_keyword",
    r#"
    WITH keyword AS (
        INSERT INTO keywords (tmdb_id, name)
        VALUES ($keyword_id, $name)
        ON CONFLICT (tmdb_id) DO UPDATE SET name = EXCLUDED.name
        RETURNING tmdb_id
    )
    INSERT INTO has_keyword (movie_id, keyword_id)
    SELECT $movie_id, tmdb_id FROM keyword
    ON CONFLICT (movie_id, keyword_id) DO NOTHING
    "#,
);

static COUNT_NODES: GraphQuery = GraphQuery::new(
    "count_nodes",
    r#"
    SELECT (SELECT count(*) FROM movies)
         + (SELECT count(*) FROM people)
         + (SELECT count(*) FROM genres)
         + (SELECT count(*) FROM keywords) AS count
    "#,
);

static DELETE_ALL: GraphQuery = GraphQuery::new(
    "delete_all",
    "TRUNCATE acted_in, directed, in_genre, has_keyword, movies, people, genres, keywords",
);

#[derive(Deserialize)]
struct NodeCount {
    count: i64,
}

/// Idempotent writes of nodes and edges
#[derive(Clone)]
pub struct GraphWriter {
    store: Arc<dyn GraphStore>,
}

impl GraphWriter {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Creates the movie or overwrites its properties
    pub async fn upsert_movie(&self, movie: &Movie) -> AppResult<()> {
        let params = Params::new()
            .with("tmdb_id", movie.tmdb_id)
            .with("title", movie.title.as_str())
            .with("overview", movie.overview.as_str())
            .with("release_date", movie.release_date.as_str())
            .with("vote_average", movie.vote_average)
            .with("vote_count", movie.vote_count)
            .with("popularity", movie.popularity)
            .with("poster_path", movie.poster_path.clone())
            .with("last_updated", movie.last_updated);

        self.store.execute(&UPSERT_MOVIE, &params).await?;
        Ok(())
    }

    /// Merges the person and their edge to the (already written) movie
    pub async fn upsert_credit(&self, credit: &Credit) -> AppResult<()> {
        let params = Params::new()
            .with("person_id", credit.person.tmdb_id)
            .with("name", credit.person.name.as_str())
            .with("profile_path", credit.person.profile_path.clone())
            .with("last_updated", credit.person.last_updated)
            .with("movie_id", credit.movie_id);

        match &credit.role {
            CreditRole::ActedIn { character } => {
                let params = params.with("character", character.as_str());
                self.store.execute(&UPSERT_ACTED_IN, &params).await?;
            }
            CreditRole::Directed => {
                self.store.execute(&UPSERT_DIRECTED, &params).await?;
            }
        }
        Ok(())
    }

    pub async fn upsert_genre(&self, movie_id: i64, genre: &Genre) -> AppResult<()> {
        let params = Params::new()
            .with("genre_id", genre.tmdb_id)
            .with("name", genre.name.as_str())
            .with("movie_id", movie_id);

        self.store.execute(&UPSERT_GENRE, &params).await?;
        Ok(())
    }

    pub async fn upsert_keyword(&self, movie_id: i64, keyword: &Keyword) -> AppResult<()> {
        let params = Params::new()
            .with("keyword_id", keyword.tmdb_id)
            .with("name", keyword.name.as_str())
            .with("movie_id", movie_id);

        self.store.execute(&UPSERT_KEYWORD, &params).await?;
        Ok(())
    }

    /// Deletes every node and edge, returning how many nodes there were
    #[instrument(skip(self))]
    pub async fn clear_database(&self) -> AppResult<i64> {
        let node_count = match self
            .store
            .fetch_all(&COUNT_NODES, &Params::new())
            .await?
            .into_iter()
            .next()
        {
            Some(record) => decode_record::<NodeCount>(&COUNT_NODES, record)?.count,
            None => 0,
        };

        tracing::info!(node_count, "Deleting all nodes and relationships");
        self.store.execute(&DELETE_ALL, &Params::new()).await?;
        tracing::info!("Graph cleared");

        Ok(node_count)
    }
}

/// Counters for one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub pages_fetched: u32,
    pub pages_failed: u32,
    pub movies_ingested: usize,
    pub movies_skipped: usize,
    pub credits_written: usize,
    pub genres_written: usize,
    pub keywords_written: usize,
    pub writes_failed: usize,
}

/// Batch loader from a catalog provider into the graph
pub struct Ingestor {
    provider: Arc<dyn CatalogProvider>,
    writer: GraphWriter,
    delay: Duration,
}

impl Ingestor {
    /// `delay` is slept after every provider call
    pub fn new(provider: Arc<dyn CatalogProvider>, writer: GraphWriter, delay: Duration) -> Self {
        Self {
            provider,
            writer,
            delay,
        }
    }

    /// Ingests the first `pages` pages of popular movies
    ///
    /// Never fails as a whole: a page, movie or write that errors is logged,
    /// counted and skipped.
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn run(&self, pages: u32) -> IngestReport {
        let mut report = IngestReport::default();
        let mut seen = HashSet::new();
        let mut movie_ids = Vec::new();

        for page in 1..=pages {
            match self.provider.popular_movies(page).await {
                Ok(listing) => {
                    report.pages_fetched += 1;
                    tracing::info!(page, movies = listing.results.len(), "Fetched popular movies");
                    for summary in listing.results {
                        if seen.insert(summary.id) {
                            movie_ids.push(summary.id);
                        }
                    }
                }
                Err(e) => {
                    report.pages_failed += 1;
                    tracing::error!(page, error = %e, "Failed to fetch popular movies page");
                }
            }
            self.pause().await;
        }

        tracing::info!(movies = movie_ids.len(), "Ingesting movie details");

        for movie_id in movie_ids {
            self.ingest_movie(movie_id, &mut report).await;
            self.pause().await;
        }

        tracing::info!(
            ingested = report.movies_ingested,
            skipped = report.movies_skipped,
            writes_failed = report.writes_failed,
            "Ingestion finished"
        );

        report
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    async fn ingest_movie(&self, movie_id: i64, report: &mut IngestReport) {
        let payload = match self.provider.movie_details(movie_id).await {
            Ok(payload) => payload,
            Err(e) => {
                report.movies_skipped += 1;
                tracing::error!(movie_id, error = %e, "Failed to fetch movie details");
                return;
            }
        };

        let details: TmdbMovieDetails = match serde_json::from_value(payload) {
            Ok(details) => details,
            Err(e) => {
                report.movies_skipped += 1;
                tracing::warn!(movie_id, error = %e, "Skipping malformed movie payload");
                return;
            }
        };

        let now = Utc::now();
        if let Err(e) = self.writer.upsert_movie(&details.movie(now)).await {
            report.movies_skipped += 1;
            report.writes_failed += 1;
            tracing::error!(movie_id, error = %e, "Failed to write movie");
            return;
        }

        for genre in details.genres() {
            match self.writer.upsert_genre(details.id, &genre).await {
                Ok(()) => report.genres_written += 1,
                Err(e) => {
                    report.writes_failed += 1;
                    tracing::error!(movie_id, genre = %genre.name, error = %e, "Failed to write genre");
                }
            }
        }

        for keyword in details.keywords() {
            match self.writer.upsert_keyword(details.id, &keyword).await {
                Ok(()) => report.keywords_written += 1,
                Err(e) => {
                    report.writes_failed += 1;
                    tracing::error!(movie_id, keyword = %keyword.name, error = %e, "Failed to write keyword");
                }
            }
        }

        for credit in details.credits(now) {
            match self.writer.upsert_credit(&credit).await {
                Ok(()) => report.credits_written += 1,
                Err(e) => {
                    report.writes_failed += 1;
                    tracing::error!(
                        movie_id,
                        person = %credit.person.name,
                        error = %e,
                        "Failed to write credit"
                    );
                }
            }
        }

        report.movies_ingested += 1;
        tracing::info!(movie_id, title = %details.title, "Ingested movie");
    }
}
