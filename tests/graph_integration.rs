//! Runs against a real PostgreSQL database:
//!
//! ```text
//! DATABASE_URL=postgres://... cargo test --test graph_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use cinegraph_api::{
    db::{create_pool, run_migrations, GraphQuery, GraphStore, Params, PgGraphStore},
    models::{Credit, CreditRole, Genre, Keyword, Movie, Person},
    services::{GraphWriter, RecommendationEngine},
};

async fn store() -> Arc<dyn GraphStore> {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_pool(&url).await.unwrap();
    run_migrations(&pool).await.unwrap();
    Arc::new(PgGraphStore::new(pool))
}

fn movie(tmdb_id: i64, title: &str, vote_average: f64, vote_count: i64) -> Movie {
    Movie {
        tmdb_id,
        title: title.to_string(),
        overview: String::new(),
        release_date: "1995-12-15".to_string(),
        vote_average,
        vote_count,
        popularity: 10.0,
        poster_path: None,
        last_updated: Utc::now(),
    }
}

fn person(tmdb_id: i64, name: &str) -> Person {
    Person {
        tmdb_id,
        name: name.to_string(),
        profile_path: None,
        last_updated: Utc::now(),
    }
}

async fn count(store: &Arc<dyn GraphStore>, sql: &'static str) -> i64 {
    let rows = store
        .fetch_all(&GraphQuery::new("count", sql), &Params::new())
        .await
        .unwrap();
    rows[0]["count"].as_i64().unwrap()
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_ingesting_twice_keeps_one_node_with_latest_values() {
    let store = store().await;
    let writer = GraphWriter::new(store.clone());
    writer.clear_database().await.unwrap();

    let credit = |character: &str| Credit {
        person: person(380, "Robert De Niro"),
        movie_id: 949,
        role: CreditRole::ActedIn {
            character: character.to_string(),
        },
    };
    let crime = Genre {
        tmdb_id: 80,
        name: "Crime".to_string(),
    };

    writer.upsert_movie(&movie(949, "Heat", 7.8, 6000)).await.unwrap();
    writer.upsert_genre(949, &crime).await.unwrap();
    writer.upsert_credit(&credit("Neil")).await.unwrap();

    writer.upsert_movie(&movie(949, "Heat", 7.9, 7000)).await.unwrap();
    writer.upsert_genre(949, &crime).await.unwrap();
    writer.upsert_credit(&credit("Neil McCauley")).await.unwrap();

    assert_eq!(count(&store, "SELECT count(*) AS count FROM movies").await, 1);
    assert_eq!(count(&store, "SELECT count(*) AS count FROM people").await, 1);
    assert_eq!(count(&store, "SELECT count(*) AS count FROM acted_in").await, 1);
    assert_eq!(count(&store, "SELECT count(*) AS count FROM in_genre").await, 1);

    let rows = store
        .fetch_all(
            &GraphQuery::new(
                "heat",
                "SELECT m.vote_count, a.character FROM movies m JOIN acted_in a ON a.movie_id = m.tmdb_id",
            ),
            &Params::new(),
        )
        .await
        .unwrap();
    assert_eq!(rows[0]["vote_count"], 7000);
    assert_eq!(rows[0]["character"], Value::from("Neil McCauley"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_recommendations_end_to_end() {
    let store = store().await;
    let writer = GraphWriter::new(store.clone());
    writer.clear_database().await.unwrap();

    let heist = Keyword {
        tmdb_id: 10051,
        name: "heist".to_string(),
    };

    for m in [
        movie(949, "Heat", 7.9, 7000),
        movie(1422, "The Departed", 8.2, 15000),
        movie(8489, "Ali", 6.7, 1500),
        movie(62, "2001: A Space Odyssey", 8.1, 11000),
    ] {
        writer.upsert_movie(&m).await.unwrap();
    }

    // Heat shares a keyword with The Departed and its director with Ali.
    // 2001 shares nothing and must not appear.
    writer.upsert_keyword(949, &heist).await.unwrap();
    writer.upsert_keyword(1422, &heist).await.unwrap();
    for movie_id in [949, 8489] {
        writer
            .upsert_credit(&Credit {
                person: person(638, "Michael Mann"),
                movie_id,
                role: CreditRole::Directed,
            })
            .await
            .unwrap();
    }

    let engine = RecommendationEngine::new(store.clone());
    let results = engine.recommend("Heat", 10).await.unwrap();

    let ids: Vec<i64> = results.iter().map(|r| r.movie_id).collect();
    assert_eq!(ids, vec![8489, 1422]);
    assert_eq!(results[0].director_count, 1);
    assert_eq!(results[0].common_directors[0].name, "Michael Mann");
    assert_eq!(results[1].common_keywords, vec!["heist".to_string()]);

    let filmography = engine.filmography(638).await.unwrap();
    assert_eq!(filmography.len(), 2);

    assert!(engine.recommend("Missing", 10).await.unwrap().is_empty());
}
