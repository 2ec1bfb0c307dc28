pub mod catalog;
pub mod graph;
pub mod recommendation;
pub mod tmdb;

pub use catalog::{
    ActorStats, FilmographyEntry, MovieCard, MovieSearch, PopularMovie, SortOrder, TitleEntry,
    TopRatedMovie,
};
pub use graph::{Credit, CreditRole, Genre, Keyword, Movie, Person};
pub use recommendation::{PersonEvidence, ScoredCandidate};
pub use tmdb::{
    TmdbCastMember, TmdbCrewMember, TmdbMovieDetails, TmdbMovieSummary, TmdbNamed, TmdbPopularPage,
};
