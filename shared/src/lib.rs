//! Shared types for the review engine
//!
//! Common types used across crates: domain models for ratings, reviews and
//! tour completions, the unified error system, and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
