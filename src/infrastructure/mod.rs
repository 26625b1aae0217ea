pub mod cache;
pub mod observability;

pub use cache::{CACHE_TTL, InMemoryBackend, RedisBackend, ResultCache};
pub use observability::Metrics;
