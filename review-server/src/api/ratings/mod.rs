//! Rating API module

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/targets", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route(
            "/{kind}/{id}/rating",
            post(handler::submit)
                .get(handler::get_own)
                .delete(handler::remove),
        )
        .route("/{kind}/{id}/stats", get(handler::stats))
}
