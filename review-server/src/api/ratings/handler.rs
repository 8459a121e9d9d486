//! Rating API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use shared::error::{AppError, AppResult};
use shared::models::{RatingAggregate, TargetKind};

fn parse_kind(kind: &str) -> AppResult<TargetKind> {
    kind.parse::<TargetKind>().map_err(AppError::validation)
}

#[derive(Debug, Deserialize)]
pub struct SubmitRatingRequest {
    pub score: i64,
}

#[derive(Debug, Serialize)]
pub struct UserRatingResponse {
    pub score: i64,
}

/// POST /api/targets/:kind/:id/rating - create or replace the caller's rating
pub async fn submit(
    State(state): State<ServerState>,
    Path((kind, id)): Path<(String, String)>,
    user: CurrentUser,
    Json(payload): Json<SubmitRatingRequest>,
) -> AppResult<Json<RatingAggregate>> {
    let kind = parse_kind(&kind)?;
    let stats = state
        .ratings
        .submit_rating(kind, &id, &user.id, payload.score)
        .await?;
    Ok(Json(stats))
}

/// DELETE /api/targets/:kind/:id/rating - remove the caller's rating
pub async fn remove(
    State(state): State<ServerState>,
    Path((kind, id)): Path<(String, String)>,
    user: CurrentUser,
) -> AppResult<Json<RatingAggregate>> {
    let kind = parse_kind(&kind)?;
    let stats = state.ratings.remove_rating(kind, &id, &user.id).await?;
    Ok(Json(stats))
}

/// GET /api/targets/:kind/:id/stats - aggregate stats (public)
pub async fn stats(
    State(state): State<ServerState>,
    Path((kind, id)): Path<(String, String)>,
) -> AppResult<Json<RatingAggregate>> {
    let kind = parse_kind(&kind)?;
    let stats = state.queries.target_stats(kind, &id).await?;
    Ok(Json(stats))
}

/// GET /api/targets/:kind/:id/rating - the caller's own score (0 if none)
pub async fn get_own(
    State(state): State<ServerState>,
    Path((kind, id)): Path<(String, String)>,
    user: CurrentUser,
) -> AppResult<Json<UserRatingResponse>> {
    let kind = parse_kind(&kind)?;
    let score = state.queries.user_rating(kind, &id, &user.id).await?;
    Ok(Json(UserRatingResponse { score }))
}
