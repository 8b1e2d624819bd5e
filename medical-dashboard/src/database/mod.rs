//! Database abstraction layer
//!
//! This module provides a database-agnostic interface for browsing,
//! searching and inserting records.

pub mod traits;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the main trait
pub use traits::{DatabaseError, DatabaseProvider};
