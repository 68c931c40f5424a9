//! Query execution against the external engine.
//!
//! This module provides:
//! - The submit-and-poll [`QueryRunner`]
//! - The database-context suppression rule

mod context;
mod runner;

pub use context::{database_context, manipulates_database, DATABASE_KEYWORDS};
pub use runner::QueryRunner;
