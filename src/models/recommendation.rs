use serde::{Deserialize, Serialize};

/// A shared actor or director backing a recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonEvidence {
    /// TMDB person identifier; usable with the filmography lookup
    pub id: i64,
    pub name: String,
    pub profile_path: Option<String>,
}

/// A ranked recommendation with the evidence that produced its score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredCandidate {
    pub movie_id: i64,
    pub title: String,
    pub rating: f64,
    pub vote_count: i64,
    pub overview: String,
    pub poster: Option<String>,
    pub release_date: String,
    pub recommendation_score: f64,
    pub common_actors: Vec<PersonEvidence>,
    pub common_directors: Vec<PersonEvidence>,
    pub common_genres: Vec<String>,
    pub common_keywords: Vec<String>,
    pub actor_count: usize,
    pub director_count: usize,
    pub genre_count: usize,
    pub keyword_count: usize,
}

impl ScoredCandidate {
    /// True when at least one actor, director, genre or keyword is shared
    pub fn has_overlap(&self) -> bool {
        self.actor_count > 0 || self.director_count > 0 || self.genre_count > 0 || self.keyword_count > 0
    }
}
