//! Review Service - multi-category guide reviews
//!
//! Creation is gated by the completion lifecycle: the traveler on the
//! booking may review once the guide has confirmed delivery, and each
//! booking carries at most one review. Guide statistics are recomputed
//! from the approved review set at read time, so they only need to be
//! consistent with the current set, not maintained incrementally.

use crate::core::Config;
use crate::db::repository::{RepoError, review};
use crate::services::completion_service::CompletionService;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    CategoryScores, CategoryScoresInput, CompletionStatus, Review, ReviewStats, ReviewVisibility,
    TourCompletion, score_in_range,
};
use shared::util::{now_millis, review_id};
use sqlx::SqlitePool;
use validator::Validate;

/// Create-review payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub overall_score: i64,
    #[validate(length(min = 5, message = "title must be at least 5 characters"))]
    pub title: String,
    #[validate(length(min = 20, message = "body must be at least 20 characters"))]
    pub body: String,
    pub category_scores: CategoryScoresInput,
    #[serde(default)]
    pub would_recommend: bool,
}

#[derive(Clone)]
pub struct ReviewService {
    pool: SqlitePool,
    completions: CompletionService,
    list_max: i64,
}

impl ReviewService {
    pub fn new(pool: SqlitePool, completions: CompletionService, config: &Config) -> Self {
        Self {
            pool,
            completions,
            list_max: config.review_list_max,
        }
    }

    /// Create the review for a booking and close out its lifecycle.
    ///
    /// Validation order mirrors the failure surface: input shape first
    /// (nothing is written for malformed input), then eligibility against
    /// the live completion record. The review insert and the
    /// `review_completed` transition commit in one transaction.
    pub async fn create_review(
        &self,
        booking_id: &str,
        rater_id: &str,
        request: CreateReviewRequest,
    ) -> AppResult<Review> {
        if rater_id.trim().is_empty() {
            return Err(AppError::not_authenticated());
        }
        request
            .validate()
            .map_err(|e| AppError::validation(e.to_string()))?;
        if !score_in_range(request.overall_score) {
            return Err(
                AppError::new(ErrorCode::RatingOutOfRange).with_detail("score", request.overall_score)
            );
        }
        let scores = CategoryScores::try_from(request.category_scores)?;

        let completion = self
            .completions
            .get(booking_id)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::BookingNotFound,
                    format!("Completion for booking {booking_id} not found"),
                )
            })?;
        check_eligibility(&completion, rater_id)?;

        let now = now_millis();
        let review = Review {
            id: review_id(),
            booking_id: booking_id.to_string(),
            guide_id: completion.guide_id.clone(),
            rater_id: rater_id.to_string(),
            tour_id: completion.tour_id.clone(),
            overall_score: request.overall_score,
            title: request.title,
            body: request.body,
            scores,
            would_recommend: request.would_recommend,
            // Moderation owns both flags from here on
            verified: false,
            visibility: ReviewVisibility::Pending,
            created_at: now,
            updated_at: now,
        };

        let committed = review::create_with_transition(&self.pool, &review).await?;
        if !committed {
            // Lost the race; re-read to report the precise reason
            let current = self.completions.get(booking_id).await?.ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::BookingNotFound,
                    format!("Completion for booking {booking_id} not found"),
                )
            })?;
            check_eligibility(&current, rater_id)?;
            return Err(AppError::not_eligible(format!(
                "Booking {booking_id} is not eligible for review"
            )));
        }

        tracing::info!(
            booking_id,
            review_id = %review.id,
            guide_id = %review.guide_id,
            "Review created"
        );
        Ok(review)
    }

    /// Update score and/or body; original rater only, no lifecycle effect.
    pub async fn update_review(
        &self,
        tour_id: &str,
        review_id: &str,
        rater_id: &str,
        new_score: Option<i64>,
        new_comment: Option<String>,
    ) -> AppResult<Review> {
        let existing = self.owned_review(tour_id, review_id, rater_id).await?;

        if let Some(score) = new_score {
            if !score_in_range(score) {
                return Err(AppError::new(ErrorCode::RatingOutOfRange).with_detail("score", score));
            }
        }

        review::update(&self.pool, &existing.id, new_score, new_comment.as_deref(), now_millis())
            .await
            .map_err(|e| map_review_not_found(&existing.id, e))?;
        tracing::info!(review_id = %existing.id, "Review updated");

        review::find_by_id(&self.pool, &existing.id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::ReviewNotFound))
    }

    /// Delete a review; original rater only. The booking's completion
    /// record is deliberately untouched, so the slot stays consumed.
    pub async fn delete_review(
        &self,
        tour_id: &str,
        review_id: &str,
        rater_id: &str,
    ) -> AppResult<()> {
        let existing = self.owned_review(tour_id, review_id, rater_id).await?;
        review::delete(&self.pool, &existing.id)
            .await
            .map_err(|e| map_review_not_found(&existing.id, e))?;
        tracing::info!(review_id = %existing.id, "Review deleted");
        Ok(())
    }

    /// Moderation hook: flip visibility and the verified flag.
    ///
    /// The transition policy itself lives with the external moderation
    /// collaborator; the engine just persists its decision.
    pub async fn set_visibility(
        &self,
        review_id: &str,
        visibility: ReviewVisibility,
        verified: bool,
    ) -> AppResult<()> {
        review::set_visibility(&self.pool, review_id, visibility, verified, now_millis())
            .await
            .map_err(|e| map_review_not_found(review_id, e))?;
        tracing::info!(review_id, visibility = ?visibility, verified, "Review moderated");
        Ok(())
    }

    /// Read-time statistics over a guide's approved reviews.
    ///
    /// An unreviewed guide yields all zeros, never an error.
    pub async fn guide_review_stats(&self, guide_id: &str) -> AppResult<ReviewStats> {
        let reviews = review::find_approved_by_guide(&self.pool, guide_id).await?;
        Ok(ReviewStats::from_reviews(&reviews, now_millis()))
    }

    /// Approved reviews for a tour, newest first, bounded by `limit`.
    pub async fn tour_reviews(&self, tour_id: &str, limit: Option<i64>) -> AppResult<Vec<Review>> {
        let limit = limit.unwrap_or(20).clamp(1, self.list_max);
        Ok(review::find_approved_by_tour(&self.pool, tour_id, limit).await?)
    }

    async fn owned_review(
        &self,
        tour_id: &str,
        review_id: &str,
        rater_id: &str,
    ) -> AppResult<Review> {
        let existing = review::find_by_id(&self.pool, review_id)
            .await
            .map_err(|e: RepoError| AppError::from(e))?
            .filter(|r| r.tour_id == tour_id)
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ReviewNotFound,
                    format!("Review {review_id} not found"),
                )
            })?;
        if existing.rater_id != rater_id {
            return Err(AppError::new(ErrorCode::ReviewNotOwned));
        }
        Ok(existing)
    }
}

/// Repo-level lookup misses become the review-specific error code.
fn map_review_not_found(review_id: &str, err: RepoError) -> AppError {
    match err {
        RepoError::NotFound(_) => AppError::with_message(
            ErrorCode::ReviewNotFound,
            format!("Review {review_id} not found"),
        ),
        other => other.into(),
    }
}

/// Classify why a booking cannot be reviewed: a consumed review slot
/// beats every other reason.
fn check_eligibility(completion: &TourCompletion, rater_id: &str) -> AppResult<()> {
    if completion.review_id.is_some() || completion.status == CompletionStatus::ReviewCompleted {
        return Err(AppError::already_reviewed(&completion.booking_id));
    }
    if !completion.can_review(rater_id) {
        return Err(AppError::not_eligible(format!(
            "Booking {} is not eligible for review by {rater_id}",
            completion.booking_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::services::notify::LogNotifier;
    use shared::models::CompletionCreate;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn test_services() -> (TempDir, CompletionService, ReviewService) {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("reviews.db");
        let db = DbService::new(db_path.to_str().unwrap()).await.unwrap();
        let completions = CompletionService::new(db.pool.clone(), Arc::new(LogNotifier));
        let config = Config::with_overrides(dir.path().to_string_lossy().to_string(), 0);
        let reviews = ReviewService::new(db.pool, completions.clone(), &config);
        (dir, completions, reviews)
    }

    fn full_scores(score: i64) -> CategoryScoresInput {
        CategoryScoresInput {
            communication: Some(score),
            knowledge: Some(score),
            punctuality: Some(score),
            friendliness: Some(score),
            overall: Some(score),
        }
    }

    fn request(score: i64) -> CreateReviewRequest {
        CreateReviewRequest {
            overall_score: score,
            title: "Fantastic walking tour".into(),
            body: "Knowledgeable guide, great pacing, plenty of hidden corners.".into(),
            category_scores: full_scores(score),
            would_recommend: true,
        }
    }

    async fn confirmed_booking(completions: &CompletionService, id: &str) {
        completions
            .record_completion(CompletionCreate {
                booking_id: id.into(),
                guide_id: "guide_1".into(),
                traveler_id: "traveler_1".into(),
                tour_id: "tour_1".into(),
            })
            .await
            .unwrap();
        completions
            .confirm_delivery(id, "guide_1", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_review_requires_confirmation() {
        let (_dir, completions, reviews) = test_services().await;
        completions
            .record_completion(CompletionCreate {
                booking_id: "bk_1".into(),
                guide_id: "guide_1".into(),
                traveler_id: "traveler_1".into(),
                tour_id: "tour_1".into(),
            })
            .await
            .unwrap();

        let err = reviews
            .create_review("bk_1", "traveler_1", request(5))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotEligible);
    }

    #[tokio::test]
    async fn test_create_review_full_flow() {
        let (_dir, completions, reviews) = test_services().await;
        confirmed_booking(&completions, "bk_1").await;

        assert!(completions.can_review("bk_1", "traveler_1").await.unwrap());

        let review = reviews
            .create_review("bk_1", "traveler_1", request(5))
            .await
            .unwrap();
        assert_eq!(review.visibility, ReviewVisibility::Pending);
        assert!(!review.verified);
        assert_eq!(review.guide_id, "guide_1");

        // Gating closes after success
        assert!(!completions.can_review("bk_1", "traveler_1").await.unwrap());
        let c = completions.get("bk_1").await.unwrap().unwrap();
        assert_eq!(c.status, CompletionStatus::ReviewCompleted);
        assert_eq!(c.review_id.as_deref(), Some(review.id.as_str()));
    }

    #[tokio::test]
    async fn test_second_review_is_already_reviewed() {
        let (_dir, completions, reviews) = test_services().await;
        confirmed_booking(&completions, "bk_1").await;
        reviews
            .create_review("bk_1", "traveler_1", request(4))
            .await
            .unwrap();

        let err = reviews
            .create_review("bk_1", "traveler_1", request(2))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyReviewed);
    }

    #[tokio::test]
    async fn test_wrong_traveler_not_eligible() {
        let (_dir, completions, reviews) = test_services().await;
        confirmed_booking(&completions, "bk_1").await;

        let err = reviews
            .create_review("bk_1", "someone_else", request(4))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotEligible);
    }

    #[tokio::test]
    async fn test_short_title_and_body_rejected() {
        let (_dir, completions, reviews) = test_services().await;
        confirmed_booking(&completions, "bk_1").await;

        let mut bad = request(4);
        bad.title = "Meh".into();
        let err = reviews
            .create_review("bk_1", "traveler_1", bad)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let mut bad = request(4);
        bad.body = "Too short".into();
        let err = reviews
            .create_review("bk_1", "traveler_1", bad)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        // Nothing was written, the booking is still reviewable
        assert!(completions.can_review("bk_1", "traveler_1").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_category_rejected() {
        let (_dir, completions, reviews) = test_services().await;
        confirmed_booking(&completions, "bk_1").await;

        let mut bad = request(4);
        bad.category_scores.punctuality = None;
        let err = reviews
            .create_review("bk_1", "traveler_1", bad)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::IncompleteCategoryRating);
    }

    #[tokio::test]
    async fn test_update_and_delete_restricted_to_rater() {
        let (_dir, completions, reviews) = test_services().await;
        confirmed_booking(&completions, "bk_1").await;
        let review = reviews
            .create_review("bk_1", "traveler_1", request(4))
            .await
            .unwrap();

        let err = reviews
            .update_review("tour_1", &review.id, "intruder", Some(1), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ReviewNotOwned);

        let updated = reviews
            .update_review("tour_1", &review.id, "traveler_1", Some(3), Some("Second thoughts after the rain started.".into()))
            .await
            .unwrap();
        assert_eq!(updated.overall_score, 3);

        reviews
            .delete_review("tour_1", &review.id, "traveler_1")
            .await
            .unwrap();
        // Deletion does not reopen the booking
        let c = completions.get("bk_1").await.unwrap().unwrap();
        assert_eq!(c.status, CompletionStatus::ReviewCompleted);
    }

    #[tokio::test]
    async fn test_moderating_unknown_review_is_not_found() {
        let (_dir, _completions, reviews) = test_services().await;
        let err = reviews
            .set_visibility("review_missing", ReviewVisibility::Approved, true)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ReviewNotFound);
    }

    #[tokio::test]
    async fn test_stats_count_only_approved() {
        let (_dir, completions, reviews) = test_services().await;
        confirmed_booking(&completions, "bk_1").await;
        let review = reviews
            .create_review("bk_1", "traveler_1", request(5))
            .await
            .unwrap();

        // Pending reviews are invisible
        let stats = reviews.guide_review_stats("guide_1").await.unwrap();
        assert_eq!(stats.total_reviews, 0);
        assert!(reviews.tour_reviews("tour_1", None).await.unwrap().is_empty());

        reviews
            .set_visibility(&review.id, ReviewVisibility::Approved, true)
            .await
            .unwrap();

        let stats = reviews.guide_review_stats("guide_1").await.unwrap();
        assert_eq!(stats.total_reviews, 1);
        assert_eq!(stats.average_rating, 5.0);
        assert_eq!(stats.rating_breakdown[4], 1);
        assert_eq!(stats.category_averages.punctuality, 5.0);

        let listed = reviews.tour_reviews("tour_1", Some(10)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].verified);
    }
}
