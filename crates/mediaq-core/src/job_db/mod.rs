//! Persistent job record store (SQLite via sqlx).
//!
//! One row per download request: URL, media type, lifecycle status, progress,
//! sizes, final path, failure message and the user-supplied engine flags.
//! Every write is its own short statement so readers always see a whole row.

pub mod db;
mod jobs;
pub mod types;

pub use db::*;
pub use types::*;
