pub mod catalog;
pub mod ingestion;
pub mod providers;
pub mod recommendations;

pub use catalog::CatalogService;
pub use ingestion::{GraphWriter, IngestReport, Ingestor};
pub use providers::{CatalogProvider, TmdbProvider};
pub use recommendations::RecommendationEngine;
