//! # Agora Shared Library
//!
//! Shared types, queries and service clients used by the Agora API server
//! and the outbox worker.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries
//! - `db`: Connection pool and migrations
//! - `auth`: Session validation, request auth context and authorization checks
//! - `redis`: Redis client used for rate limiting
//! - `integrations`: Clients for the media hosting and mail APIs
//! - `notifications`: Email templates queued in the outbox
//! - `slug`: URL slug generation

pub mod auth;
pub mod db;
pub mod integrations;
pub mod models;
pub mod notifications;
pub mod redis;
pub mod slug;

/// Current version of the Agora shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
