use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A movie node, keyed by its TMDB identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub tmdb_id: i64,
    pub title: String,
    pub overview: String,
    /// `YYYY-MM-DD`, or empty when the catalog has no date
    pub release_date: String,
    pub vote_average: f64,
    pub vote_count: i64,
    pub popularity: f64,
    pub poster_path: Option<String>,
    pub last_updated: DateTime<Utc>,
}

/// A person node (actor or director)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    pub tmdb_id: i64,
    pub name: String,
    pub profile_path: Option<String>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub tmdb_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Keyword {
    pub tmdb_id: i64,
    pub name: String,
}

/// How a person is credited on a movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditRole {
    /// `ACTED_IN`, with the (possibly empty) character name
    ActedIn { character: String },
    /// `DIRECTED`
    Directed,
}

/// A person together with their role on one movie
#[derive(Debug, Clone, PartialEq)]
pub struct Credit {
    pub person: Person,
    pub movie_id: i64,
    pub role: CreditRole,
}
