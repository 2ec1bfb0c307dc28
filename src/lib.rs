//! Movie recommendations over a graph of movies, people, genres and keywords.
//!
//! The [`services::RecommendationEngine`] scores every movie that shares cast,
//! directors, genres or keywords with a source movie, blended with rating and
//! popularity signals. The graph is filled by [`services::Ingestor`] from TMDB
//! and served over HTTP by [`routes::create_router`].

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
