use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::graph::{Credit, CreditRole, Genre, Keyword, Movie, Person};

// ============================================================================
// TMDB API Types
// ============================================================================

/// One page of `/movie/popular`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbPopularPage {
    pub page: u32,
    #[serde(default)]
    pub results: Vec<TmdbMovieSummary>,
    #[serde(default)]
    pub total_pages: u32,
}

/// Listing entry; only the id is needed to fetch details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbMovieSummary {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

/// `/movie/{id}?append_to_response=credits,keywords`
///
/// `id` and `title` are required; a payload without them is malformed.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i64>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<TmdbNamed>,
    #[serde(default)]
    pub keywords: TmdbKeywords,
    #[serde(default)]
    pub credits: TmdbCredits,
}

/// Genre or keyword reference
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TmdbNamed {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbKeywords {
    #[serde(default)]
    pub keywords: Vec<TmdbNamed>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
    #[serde(default)]
    pub crew: Vec<TmdbCrewMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCastMember {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub character: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCrewMember {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub job: Option<String>,
}

impl TmdbMovieDetails {
    /// The movie node this payload describes
    pub fn movie(&self, last_updated: DateTime<Utc>) -> Movie {
        Movie {
            tmdb_id: self.id,
            title: self.title.clone(),
            overview: self.overview.clone().unwrap_or_default(),
            release_date: self.release_date.clone().unwrap_or_default(),
            vote_average: self.vote_average.unwrap_or_default(),
            vote_count: self.vote_count.unwrap_or_default().max(0),
            popularity: self.popularity.unwrap_or_default().max(0.0),
            poster_path: self.poster_path.clone(),
            last_updated,
        }
    }

    pub fn genres(&self) -> Vec<Genre> {
        self.genres
            .iter()
            .map(|g| Genre {
                tmdb_id: g.id,
                name: g.name.clone(),
            })
            .collect()
    }

    pub fn keywords(&self) -> Vec<Keyword> {
        self.keywords
            .keywords
            .iter()
            .map(|k| Keyword {
                tmdb_id: k.id,
                name: k.name.clone(),
            })
            .collect()
    }

    /// Cast as `ACTED_IN` credits followed by crew with job `Director` as `DIRECTED`
    pub fn credits(&self, last_updated: DateTime<Utc>) -> Vec<Credit> {
        let cast = self.credits.cast.iter().map(|member| Credit {
            person: Person {
                tmdb_id: member.id,
                name: member.name.clone(),
                profile_path: member.profile_path.clone(),
                last_updated,
            },
            movie_id: self.id,
            role: CreditRole::ActedIn {
                character: member.character.clone().unwrap_or_default(),
            },
        });

        let directors = self
            .credits
            .crew
            .iter()
            .filter(|member| member.job.as_deref() == Some("Director"))
            .map(|member| Credit {
                person: Person {
                    tmdb_id: member.id,
                    name: member.name.clone(),
                    profile_path: member.profile_path.clone(),
                    last_updated,
                },
                movie_id: self.id,
                role: CreditRole::Directed,
            });

        cast.chain(directors).collect()
    }
}
