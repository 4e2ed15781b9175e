//! SQLite-backed storage for cache generations.
//!
//! This module provides a persistent replacement for the browser's cache
//! storage using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named buckets (one per cache generation) listed in creation order
//! - Responses keyed by a SHA-256 of method and URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod buckets;
pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedResponse;
