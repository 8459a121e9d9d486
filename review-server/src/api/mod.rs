//! HTTP API
//!
//! One module per resource, each exposing a `router()`. Reads are
//! public; writes authenticate the caller through the [`CurrentUser`]
//! extractor.
//!
//! [`CurrentUser`]: crate::auth::CurrentUser

pub mod bookings;
pub mod health;
pub mod ratings;
pub mod reviews;

use crate::core::ServerState;
use axum::Router;

pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(ratings::router())
        .merge(bookings::router())
        .merge(reviews::router())
}
