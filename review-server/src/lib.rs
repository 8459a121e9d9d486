//! Review Engine Server
//!
//! Backend service maintaining rating aggregates and the guide-review
//! lifecycle for the travel app:
//!
//! - **Rating store** (`services::RatingService`): per-target running
//!   aggregates over user star ratings, mutated only through atomic
//!   version-checked transactions
//! - **Review aggregator** (`services::ReviewService`): multi-category
//!   guide reviews with read-time statistics
//! - **Completion lifecycle** (`services::CompletionService`): the state
//!   machine gating when a traveler may review a booking
//! - **HTTP API** (`api`): the operation surface consumed by UI clients
//!
//! # Module structure
//!
//! ```text
//! review-server/src/
//! ├── core/          # config, state, server
//! ├── auth/          # JWT authentication
//! ├── db/            # pool setup, transaction retry, repositories
//! ├── services/      # the engine itself
//! └── api/           # HTTP routes and handlers
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod services;

// Re-export public types
pub use crate::auth::{CurrentUser, JwtService};
pub use crate::core::{Config, Server, ServerState};
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// Install the tracing subscriber and load `.env` overrides.
///
/// `RUST_LOG` controls verbosity; defaults to `info`.
pub fn setup_environment() {
    dotenv::dotenv().ok();

    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
