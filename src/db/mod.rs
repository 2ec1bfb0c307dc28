pub mod graph;
pub mod postgres;
pub mod redis;

pub use graph::{decode_record, GraphQuery, GraphStore, ParamValue, Params, PgGraphStore, Record};
pub use postgres::{create_pool, run_migrations};
pub use self::redis::create_redis_client;
pub use self::redis::Cache;
pub use self::redis::CacheKey;
