//! Graph-overlap movie recommendations
//!
//! For a source movie, candidates are the movies that share at least one
//! actor, director, genre or keyword with it. Each candidate is scored as
//!
//! ```text
//! 3·actors + 5·directors + 2·genres + 1·keywords + 4·rating + 2·popularity
//! ```
//!
//! where `rating` is the vote average scaled to [0, 1] and shrunk toward zero
//! for movies with few votes, and `popularity` is the catalog popularity
//! divided by 1000.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use crate::{
    db::{decode_record as decode, GraphQuery, GraphStore, Params},
    error::{AppError, AppResult},
    models::{FilmographyEntry, PersonEvidence, ScoredCandidate},
};

pub const DEFAULT_LIMIT: usize = 10;

pub const ACTOR_WEIGHT: f64 = 3.0;
pub const DIRECTOR_WEIGHT: f64 = 5.0;
pub const GENRE_WEIGHT: f64 = 2.0;
pub const KEYWORD_WEIGHT: f64 = 1.0;
pub const RATING_WEIGHT: f64 = 4.0;
pub const POPULARITY_WEIGHT: f64 = 2.0;

/// Above this many votes a rating is taken at face value
pub const VOTE_CONFIDENCE_THRESHOLD: i64 = 1000;
pub const POPULARITY_SCALE: f64 = 1000.0;

static RESOLVE_TITLE: GraphQuery = GraphQuery::new(
    "resolve_title",
    r#"
    SELECT tmdb_id
    FROM movies
    WHERE title = $title
    ORDER BY tmdb_id
    "#,
);

static COMMON_ACTORS: GraphQuery = GraphQuery::new(
    "common_actors",
    r#"
    SELECT DISTINCT cand.movie_id AS candidate_id,
           p.tmdb_id AS id,
           p.name AS name,
           p.profile_path AS profile_path
    FROM acted_in src
    JOIN acted_in cand
      ON cand.person_id = src.person_id
     AND cand.movie_id <> src.movie_id
    JOIN people p ON p.tmdb_id = src.person_id
    WHERE src.movie_id = $source_id
    ORDER BY candidate_id, id
    "#,
);

static COMMON_DIRECTORS: GraphQuery = GraphQuery::new(
    "common_directors",
    r#"
    SELECT DISTINCT cand.movie_id AS candidate_id,
           p.tmdb_id AS id,
           p.name AS name,
           p.profile_path AS profile_path
    FROM directed src
    JOIN directed cand
      ON cand.person_id = src.person_id
     AND cand.movie_id <> src.movie_id
    JOIN people p ON p.tmdb_id = src.person_id
    WHERE src.movie_id = $source_id
    ORDER BY candidate_id, id
    "#,
);

static COMMON_GENRES: GraphQuery = GraphQuery::new(
    "common_genres",
    r#"
    SELECT DISTINCT cand.movie_id AS candidate_id,
           g.tmdb_id AS id,
           g.name AS name
    FROM in_genre src
    JOIN in_genre cand
      ON cand.genre_id = src.genre_id
     AND cand.movie_id <> src.movie_id
    JOIN genres g ON g.tmdb_id = src.genre_id
    WHERE src.movie_id = $source_id
    ORDER BY candidate_id, id
    "#,
);

static COMMON_KEYWORDS: GraphQuery = GraphQuery::new(
    "common_keywords",
    r#"
    SELECT DISTINCT cand.movie_id AS candidate_id,
           k.tmdb_id AS id,
           k.name AS name
    FROM has_keyword src
    JOIN has_keyword cand
      ON cand.keyword_id = src.keyword_id
     AND cand.movie_id <> src.movie_id
    JOIN keywords k ON k.tmdb_id = src.keyword_id
    WHERE src.movie_id = $source_id
    ORDER BY candidate_id, id
    "#,
);

static CANDIDATE_MOVIES: GraphQuery = GraphQuery::new(
    "candidate_movies",
    r#"
    SELECT tmdb_id AS movie_id,
           title,
           overview,
           release_date,
           vote_average,
           vote_count,
           popularity,
           poster_path
    FROM movies
    WHERE tmdb_id = ANY($candidate_ids)
      AND tmdb_id <> $source_id
    ORDER BY tmdb_id
    "#,
);

static FILMOGRAPHY: GraphQuery = GraphQuery::new(
    "filmography",
    r#"
    SELECT m.tmdb_id AS movie_id,
           m.title AS title,
           m.release_date AS release_date,
           m.vote_average AS rating
    FROM movies m
    WHERE m.tmdb_id IN (
        SELECT movie_id FROM acted_in WHERE person_id = $person_id
        UNION
        SELECT movie_id FROM directed WHERE person_id = $person_id
    )
    ORDER BY m.release_date DESC, m.tmdb_id
    "#,
);

/// Vote average mapped to [0, 1], damped by `sqrt(vote_count / 1000)` when
/// the vote count does not exceed the confidence threshold.
pub fn rating_signal(vote_average: f64, vote_count: i64) -> f64 {
    if vote_count > VOTE_CONFIDENCE_THRESHOLD {
        vote_average / 10.0
    } else {
        let confidence = (vote_count.max(0) as f64 / VOTE_CONFIDENCE_THRESHOLD as f64).sqrt();
        (vote_average * confidence) / 10.0
    }
}

/// Popularity on roughly the same scale as the rating signal; not bounded above
pub fn popularity_signal(popularity: f64) -> f64 {
    popularity / POPULARITY_SCALE
}

/// Number of distinct shared entities per relationship type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlapCounts {
    pub actors: usize,
    pub directors: usize,
    pub genres: usize,
    pub keywords: usize,
}

impl OverlapCounts {
    pub fn is_empty(&self) -> bool {
        self.actors == 0 && self.directors == 0 && self.genres == 0 && self.keywords == 0
    }
}

pub fn composite_score(counts: OverlapCounts, rating_signal: f64, popularity_signal: f64) -> f64 {
    counts.actors as f64 * ACTOR_WEIGHT
        + counts.directors as f64 * DIRECTOR_WEIGHT
        + counts.genres as f64 * GENRE_WEIGHT
        + counts.keywords as f64 * KEYWORD_WEIGHT
        + rating_signal * RATING_WEIGHT
        + popularity_signal * POPULARITY_WEIGHT
}

#[derive(Debug, Deserialize)]
struct PersonOverlapRow {
    candidate_id: Option<i64>,
    id: Option<i64>,
    name: Option<String>,
    profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedOverlapRow {
    candidate_id: Option<i64>,
    id: Option<i64>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateRow {
    movie_id: i64,
    title: String,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    vote_average: Option<f64>,
    #[serde(default)]
    vote_count: Option<i64>,
    #[serde(default)]
    popularity: Option<f64>,
    #[serde(default)]
    poster_path: Option<String>,
}

/// Shared entities for one candidate, keyed (and so deduplicated) by identity
#[derive(Debug, Default)]
struct Overlap {
    actors: BTreeMap<i64, PersonEvidence>,
    directors: BTreeMap<i64, PersonEvidence>,
    genres: BTreeMap<i64, String>,
    keywords: BTreeMap<i64, String>,
}

impl Overlap {
    fn counts(&self) -> OverlapCounts {
        OverlapCounts {
            actors: self.actors.len(),
            directors: self.directors.len(),
            genres: self.genres.len(),
            keywords: self.keywords.len(),
        }
    }
}

/// Candidate id and evidence for a person row, or `None` when either identity
/// is unresolved or the row points back at the source.
fn person_evidence(row: PersonOverlapRow, source_id: i64) -> Option<(i64, PersonEvidence)> {
    let candidate_id = row.candidate_id.filter(|id| *id != source_id)?;
    let id = row.id?;
    Some((
        candidate_id,
        PersonEvidence {
            id,
            name: row.name.unwrap_or_default(),
            profile_path: row.profile_path,
        },
    ))
}

fn named_evidence(row: NamedOverlapRow, source_id: i64) -> Option<(i64, i64, String)> {
    let candidate_id = row.candidate_id.filter(|id| *id != source_id)?;
    let id = row.id?;
    Some((candidate_id, id, row.name.unwrap_or_default()))
}

fn score_candidate(row: CandidateRow, overlap: Overlap) -> ScoredCandidate {
    let counts = overlap.counts();
    let rating = row.vote_average.unwrap_or_default();
    let vote_count = row.vote_count.unwrap_or_default();
    let score = composite_score(
        counts,
        rating_signal(rating, vote_count),
        popularity_signal(row.popularity.unwrap_or_default()),
    );

    ScoredCandidate {
        movie_id: row.movie_id,
        title: row.title,
        rating,
        vote_count,
        overview: row.overview.unwrap_or_default(),
        poster: row.poster_path,
        release_date: row.release_date.unwrap_or_default(),
        recommendation_score: score,
        common_actors: overlap.actors.into_values().collect(),
        common_directors: overlap.directors.into_values().collect(),
        common_genres: overlap.genres.into_values().collect(),
        common_keywords: overlap.keywords.into_values().collect(),
        actor_count: counts.actors,
        director_count: counts.directors,
        genre_count: counts.genres,
        keyword_count: counts.keywords,
    }
}

/// Highest score first; equal scores fall back to ascending movie id
fn rank(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| {
        b.recommendation_score
            .total_cmp(&a.recommendation_score)
            .then_with(|| a.movie_id.cmp(&b.movie_id))
    });
}

/// Read-only recommendation and filmography queries over the movie graph
#[derive(Clone)]
pub struct RecommendationEngine {
    store: Arc<dyn GraphStore>,
}

impl RecommendationEngine {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Recommends movies similar to the movie titled exactly `source_title`.
    ///
    /// An unknown title yields an empty list. A title shared by several movies
    /// is rejected with [`AppError::AmbiguousTitle`]; use
    /// [`recommend_by_id`](Self::recommend_by_id) for those.
    #[instrument(skip(self))]
    pub async fn recommend(
        &self,
        source_title: &str,
        limit: usize,
    ) -> AppResult<Vec<ScoredCandidate>> {
        match self.resolve_title(source_title).await?.as_slice() {
            [] => {
                tracing::debug!("No movie with this title");
                Ok(Vec::new())
            }
            [source_id] => self.recommend_by_id(*source_id, limit).await,
            ids => Err(AppError::AmbiguousTitle {
                title: source_title.to_string(),
                candidates: ids.to_vec(),
            }),
        }
    }

    /// Recommends movies similar to the movie with TMDB id `source_id`
    #[instrument(skip(self))]
    pub async fn recommend_by_id(
        &self,
        source_id: i64,
        limit: usize,
    ) -> AppResult<Vec<ScoredCandidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let params = Params::new().with("source_id", source_id);
        let (actors, directors, genres, keywords) = tokio::try_join!(
            self.store.fetch_all(&COMMON_ACTORS, &params),
            self.store.fetch_all(&COMMON_DIRECTORS, &params),
            self.store.fetch_all(&COMMON_GENRES, &params),
            self.store.fetch_all(&COMMON_KEYWORDS, &params),
        )?;

        let mut overlaps: BTreeMap<i64, Overlap> = BTreeMap::new();

        for record in actors {
            let row: PersonOverlapRow = decode(&COMMON_ACTORS, record)?;
            if let Some((candidate_id, evidence)) = person_evidence(row, source_id) {
                let entry = overlaps.entry(candidate_id).or_default();
                entry.actors.insert(evidence.id, evidence);
            }
        }

        for record in directors {
            let row: PersonOverlapRow = decode(&COMMON_DIRECTORS, record)?;
            if let Some((candidate_id, evidence)) = person_evidence(row, source_id) {
                let entry = overlaps.entry(candidate_id).or_default();
                entry.directors.insert(evidence.id, evidence);
            }
        }

        for record in genres {
            let row: NamedOverlapRow = decode(&COMMON_GENRES, record)?;
            if let Some((candidate_id, id, name)) = named_evidence(row, source_id) {
                overlaps.entry(candidate_id).or_default().genres.insert(id, name);
            }
        }

        for record in keywords {
            let row: NamedOverlapRow = decode(&COMMON_KEYWORDS, record)?;
            if let Some((candidate_id, id, name)) = named_evidence(row, source_id) {
                overlaps.entry(candidate_id).or_default().keywords.insert(id, name);
            }
        }

        overlaps.retain(|_, overlap| !overlap.counts().is_empty());
        if overlaps.is_empty() {
            tracing::debug!("No movie shares a relationship with the source");
            return Ok(Vec::new());
        }

        let candidate_ids: Vec<i64> = overlaps.keys().copied().collect();
        let records = self
            .store
            .fetch_all(
                &CANDIDATE_MOVIES,
                &Params::new()
                    .with("candidate_ids", candidate_ids)
                    .with("source_id", source_id),
            )
            .await?;

        let mut ranked = Vec::with_capacity(records.len());
        for record in records {
            let row: CandidateRow = decode(&CANDIDATE_MOVIES, record)?;
            if row.movie_id == source_id {
                continue;
            }
            // Movies the traversals never reached have no overlap and are not candidates.
            if let Some(overlap) = overlaps.remove(&row.movie_id) {
                ranked.push(score_candidate(row, overlap));
            }
        }

        rank(&mut ranked);
        ranked.truncate(limit);

        tracing::info!(
            source_id,
            returned = ranked.len(),
            "Recommendations computed"
        );

        Ok(ranked)
    }

    /// Every movie the person acted in or directed, newest release first
    #[instrument(skip(self))]
    pub async fn filmography(&self, person_id: i64) -> AppResult<Vec<FilmographyEntry>> {
        let records = self
            .store
            .fetch_all(&FILMOGRAPHY, &Params::new().with("person_id", person_id))
            .await?;

        records
            .into_iter()
            .map(|record| decode(&FILMOGRAPHY, record))
            .collect()
    }

    async fn resolve_title(&self, title: &str) -> AppResult<Vec<i64>> {
        #[derive(Deserialize)]
        struct TitleMatch {
            tmdb_id: i64,
        }

        let records = self
            .store
            .fetch_all(&RESOLVE_TITLE, &Params::new().with("title", title))
            .await?;

        records
            .into_iter()
            .map(|record| decode::<TitleMatch>(&RESOLVE_TITLE, record).map(|m| m.tmdb_id))
            .collect()
    }
}
