use serde::{Deserialize, Serialize};

/// A movie as listed by catalog searches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieCard {
    pub movie_id: i64,
    pub title: String,
    pub release_date: String,
    pub rating: f64,
    pub overview: String,
    pub poster: Option<String>,
    pub vote_count: i64,
}

/// Identifier and title, for pickers that feed recommendations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TitleEntry {
    pub movie_id: i64,
    pub title: String,
}

/// One movie a person acted in or directed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilmographyEntry {
    pub movie_id: i64,
    pub title: String,
    pub release_date: String,
    pub rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopRatedMovie {
    pub title: String,
    pub rating: f64,
    pub votes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopularMovie {
    pub title: String,
    pub popularity: f64,
    pub votes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActorStats {
    pub actor: String,
    pub movie_count: i64,
    pub avg_rating: Option<f64>,
}

/// Sort orders offered by the movie search
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    ReleaseDateNewest,
    ReleaseDateOldest,
    #[default]
    RatingHighest,
    RatingLowest,
}

impl SortOrder {
    pub fn order_by(self) -> &'static str {
        match self {
            SortOrder::ReleaseDateNewest => "ORDER BY m.release_date DESC, m.tmdb_id",
            SortOrder::ReleaseDateOldest => "ORDER BY m.release_date ASC, m.tmdb_id",
            SortOrder::RatingHighest => "ORDER BY m.vote_average DESC, m.tmdb_id",
            SortOrder::RatingLowest => "ORDER BY m.vote_average ASC, m.tmdb_id",
        }
    }
}

/// Filters for the movie search
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MovieSearch {
    /// Case-sensitive title substring; empty or absent matches every title
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub min_rating: f64,
    #[serde(default = "default_start_year")]
    pub start_year: i32,
    #[serde(default = "default_end_year")]
    pub end_year: i32,
    #[serde(default)]
    pub sort: SortOrder,
}

fn default_start_year() -> i32 {
    2000
}

fn default_end_year() -> i32 {
    2024
}

impl Default for MovieSearch {
    fn default() -> Self {
        Self {
            q: None,
            min_rating: 0.0,
            start_year: default_start_year(),
            end_year: default_end_year(),
            sort: SortOrder::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_deserialization() {
        let sort: SortOrder = serde_json::from_str("\"release_date_newest\"").unwrap();
        assert_eq!(sort, SortOrder::ReleaseDateNewest);
        assert_eq!(sort.order_by(), "ORDER BY m.release_date DESC, m.tmdb_id");
    }

    #[test]
    fn test_movie_search_defaults() {
        let search: MovieSearch = serde_json::from_str("{}").unwrap();
        assert_eq!(search, MovieSearch::default());
        assert_eq!(search.sort, SortOrder::RatingHighest);
        assert_eq!((search.start_year, search.end_year), (2000, 2024));
    }
}
