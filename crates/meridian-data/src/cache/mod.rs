//! Caching layer for computed results.

pub mod sqlite;

pub use sqlite::{CacheStats, ResultCache};
