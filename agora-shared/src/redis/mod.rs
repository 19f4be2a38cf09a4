/// Redis integration
///
/// Used by the API for per-user rate limiting (token buckets updated by a Lua
/// script). Everything else lives in PostgreSQL.

pub mod client;

pub use client::{RedisClient, RedisClientError, RedisConfig};
