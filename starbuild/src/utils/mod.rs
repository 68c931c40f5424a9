//! Utility functions for run ids and timestamps.

pub mod timestamps;

pub use timestamps::{format_timestamp, iso_timestamp, now_utc, Timestamp};

use uuid::Uuid;

/// Generates a new random run id.
#[must_use]
pub fn generate_run_id() -> Uuid {
    Uuid::new_v4()
}
