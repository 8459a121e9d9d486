//! Data models
//!
//! Shared between review-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! Timestamps are UTC milliseconds (`i64`); external identifiers
//! (`target_id`, `booking_id`, `rater_id`, `guide_id`) are opaque strings
//! supplied by the booking/content systems.

pub mod completion;
pub mod rating;
pub mod review;

// Re-exports
pub use completion::*;
pub use rating::*;
pub use review::*;
