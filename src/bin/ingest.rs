//! Loads popular movies from TMDB into the movie graph.
//!
//! ```text
//! ingest                 # pages and delay from INGEST_PAGES / INGEST_DELAY_MS
//! ingest --pages 2
//! ingest --clear --yes   # wipe the graph first
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use cinegraph_api::{
    config::Config,
    db::{create_pool, create_redis_client, run_migrations, Cache, GraphStore, PgGraphStore},
    services::{GraphWriter, Ingestor, TmdbProvider},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ingest")]
#[command(author, version, about = "Load popular TMDB movies into the movie graph", long_about = None)]
struct Cli {
    /// Popular-movie pages to fetch
    #[arg(short, long, env = "INGEST_PAGES")]
    pages: Option<u32>,

    /// Delay between TMDB requests in milliseconds
    #[arg(short, long, env = "INGEST_DELAY_MS")]
    delay_ms: Option<u64>,

    /// Delete every node and relationship before ingesting
    #[arg(long)]
    clear: bool,

    /// Confirm --clear
    #[arg(long, requires = "clear")]
    yes: bool,

    /// Stop after --clear without ingesting
    #[arg(long, requires = "clear")]
    clear_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cinegraph_api=info,ingest=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    if cli.clear && !cli.yes {
        anyhow::bail!("--clear deletes the whole graph; pass --yes to confirm");
    }

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    let store: Arc<dyn GraphStore> = Arc::new(PgGraphStore::new(pool));
    let writer = GraphWriter::new(store);

    if cli.clear {
        let deleted = writer.clear_database().await?;
        tracing::info!(deleted, "Deleted existing graph");
        if cli.clear_only {
            return Ok(());
        }
    }

    let access_token = config
        .tmdb_access_token
        .clone()
        .context("TMDB_ACCESS_TOKEN must be set to ingest")?;

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client).await;
    let provider = TmdbProvider::new(cache, access_token, config.tmdb_api_url.clone());

    let pages = cli.pages.unwrap_or(config.ingest_pages);
    let delay = Duration::from_millis(cli.delay_ms.unwrap_or(config.ingest_delay_ms));

    let ingestor = Ingestor::new(Arc::new(provider), writer, delay);
    let report = ingestor.run(pages).await;

    cache_writer.shutdown().await;

    tracing::info!(
        pages_fetched = report.pages_fetched,
        pages_failed = report.pages_failed,
        movies_ingested = report.movies_ingested,
        movies_skipped = report.movies_skipped,
        credits = report.credits_written,
        genres = report.genres_written,
        keywords = report.keywords_written,
        writes_failed = report.writes_failed,
        "Database update completed"
    );

    Ok(())
}
