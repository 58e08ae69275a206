pub mod postgres;
pub mod redis;

pub use self::postgres::{create_pool, run_migrations, PgCatalogRepository};
pub use self::redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
