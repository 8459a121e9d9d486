//! Booking completion API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::services::CreateReviewRequest;
use shared::error::{ApiResponse, AppResult};
use shared::models::{CompletionCreate, TourCompletion};

#[derive(Debug, Deserialize)]
pub struct ConfirmDeliveryRequest {
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CanReviewResponse {
    pub can_review: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateReviewResponse {
    pub review_id: String,
}

/// POST /api/bookings - ingest a completion from the booking system
pub async fn record_completion(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CompletionCreate>,
) -> AppResult<Json<TourCompletion>> {
    user.require_role(&["system", "admin"])?;
    let completion = state.completions.record_completion(payload).await?;
    Ok(Json(completion))
}

/// POST /api/bookings/:id/confirm - guide attests delivery
pub async fn confirm_delivery(
    State(state): State<ServerState>,
    Path(booking_id): Path<String>,
    user: CurrentUser,
    Json(payload): Json<ConfirmDeliveryRequest>,
) -> AppResult<Json<TourCompletion>> {
    let completion = state
        .completions
        .confirm_delivery(&booking_id, &user.id, payload.note)
        .await?;
    Ok(Json(completion))
}

/// POST /api/bookings/:id/review-sent - notification system reports the
/// invitation was dispatched
pub async fn mark_review_sent(
    State(state): State<ServerState>,
    Path(booking_id): Path<String>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<()>>> {
    user.require_role(&["system", "admin"])?;
    state.completions.mark_review_sent(&booking_id).await?;
    Ok(Json(ApiResponse::ok()))
}

/// GET /api/bookings/:id/can-review - review eligibility for the caller
pub async fn can_review(
    State(state): State<ServerState>,
    Path(booking_id): Path<String>,
    user: CurrentUser,
) -> AppResult<Json<CanReviewResponse>> {
    let can_review = state.queries.can_review(&booking_id, &user.id).await?;
    Ok(Json(CanReviewResponse { can_review }))
}

/// POST /api/bookings/:id/review - traveler submits the review
pub async fn create_review(
    State(state): State<ServerState>,
    Path(booking_id): Path<String>,
    user: CurrentUser,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<Json<CreateReviewResponse>> {
    let review = state
        .reviews
        .create_review(&booking_id, &user.id, payload)
        .await?;
    Ok(Json(CreateReviewResponse {
        review_id: review.id,
    }))
}
