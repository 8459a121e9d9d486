//! Review API module
//!
//! Review reads/edits plus the moderation hook. Creation lives under the
//! booking routes, since a review is born from a booking's lifecycle.

mod handler;

use axum::{Router, routing::get, routing::put};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/tours/{tour_id}/reviews",
            get(handler::list_for_tour),
        )
        .route(
            "/api/tours/{tour_id}/reviews/{review_id}",
            put(handler::update).delete(handler::delete),
        )
        .route("/api/guides/{guide_id}/review-stats", get(handler::guide_stats))
        .route("/api/reviews/{review_id}/visibility", put(handler::set_visibility))
}
