//! Booking completion API module

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/bookings", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::record_completion))
        .route("/{id}/confirm", post(handler::confirm_delivery))
        .route("/{id}/review-sent", post(handler::mark_review_sent))
        .route("/{id}/can-review", get(handler::can_review))
        .route("/{id}/review", post(handler::create_review))
}
