//! Core types and shared functionality for nai-site.
//!
//! This crate provides:
//! - Cache generation storage with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CachedResponse};
pub use config::{AppConfig, ConfigError, OfflineConfig, PrerenderConfig};
pub use error::Error;
