//! Review API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use shared::error::{ApiResponse, AppResult};
use shared::models::{Review, ReviewStats, ReviewVisibility};

#[derive(Debug, Deserialize)]
pub struct ReviewListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub score: Option<i64>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub visibility: ReviewVisibility,
    #[serde(default)]
    pub verified: bool,
}

/// GET /api/tours/:tour_id/reviews?limit= - approved reviews, newest first
pub async fn list_for_tour(
    State(state): State<ServerState>,
    Path(tour_id): Path<String>,
    Query(query): Query<ReviewListQuery>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = state.queries.tour_reviews(&tour_id, query.limit).await?;
    Ok(Json(reviews))
}

/// GET /api/guides/:guide_id/review-stats - read-time guide statistics
pub async fn guide_stats(
    State(state): State<ServerState>,
    Path(guide_id): Path<String>,
) -> AppResult<Json<ReviewStats>> {
    let stats = state.queries.guide_review_stats(&guide_id).await?;
    Ok(Json(stats))
}

/// PUT /api/tours/:tour_id/reviews/:review_id - edit own review
pub async fn update(
    State(state): State<ServerState>,
    Path((tour_id, review_id)): Path<(String, String)>,
    user: CurrentUser,
    Json(payload): Json<UpdateReviewRequest>,
) -> AppResult<Json<Review>> {
    let review = state
        .reviews
        .update_review(&tour_id, &review_id, &user.id, payload.score, payload.comment)
        .await?;
    Ok(Json(review))
}

/// DELETE /api/tours/:tour_id/reviews/:review_id - delete own review
pub async fn delete(
    State(state): State<ServerState>,
    Path((tour_id, review_id)): Path<(String, String)>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .reviews
        .delete_review(&tour_id, &review_id, &user.id)
        .await?;
    Ok(Json(ApiResponse::ok()))
}

/// PUT /api/reviews/:review_id/visibility - moderation collaborator hook
pub async fn set_visibility(
    State(state): State<ServerState>,
    Path(review_id): Path<String>,
    user: CurrentUser,
    Json(payload): Json<VisibilityRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    user.require_role(&["admin", "system"])?;
    state
        .reviews
        .set_visibility(&review_id, payload.visibility, payload.verified)
        .await?;
    Ok(Json(ApiResponse::ok()))
}
