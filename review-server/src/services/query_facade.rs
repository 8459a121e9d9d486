//! Query Facade - the read-only surface for UI collaborators
//!
//! Bundles the read accessors of the three services behind one handle.
//! Nothing here mutates state; write paths go straight to the owning
//! service.

use crate::services::{CompletionService, RatingService, ReviewService};
use shared::error::AppResult;
use shared::models::{RatingAggregate, Review, ReviewStats, TargetKind, TourCompletion};
use std::sync::Arc;

#[derive(Clone)]
pub struct QueryFacade {
    ratings: Arc<RatingService>,
    reviews: Arc<ReviewService>,
    completions: Arc<CompletionService>,
}

impl QueryFacade {
    pub fn new(
        ratings: Arc<RatingService>,
        reviews: Arc<ReviewService>,
        completions: Arc<CompletionService>,
    ) -> Self {
        Self {
            ratings,
            reviews,
            completions,
        }
    }

    /// Aggregate stats for a target; zeros when unrated
    pub async fn target_stats(&self, kind: TargetKind, target_id: &str) -> AppResult<RatingAggregate> {
        self.ratings.get_stats(kind, target_id).await
    }

    /// The caller's own score for a target; 0 when absent
    pub async fn user_rating(
        &self,
        kind: TargetKind,
        target_id: &str,
        rater_id: &str,
    ) -> AppResult<i64> {
        self.ratings.get_user_rating(kind, target_id, rater_id).await
    }

    /// Read-time statistics over a guide's approved reviews
    pub async fn guide_review_stats(&self, guide_id: &str) -> AppResult<ReviewStats> {
        self.reviews.guide_review_stats(guide_id).await
    }

    /// Approved reviews for a tour, newest first
    pub async fn tour_reviews(&self, tour_id: &str, limit: Option<i64>) -> AppResult<Vec<Review>> {
        self.reviews.tour_reviews(tour_id, limit).await
    }

    /// Whether the caller may review this booking right now
    pub async fn can_review(&self, booking_id: &str, rater_id: &str) -> AppResult<bool> {
        self.completions.can_review(booking_id, rater_id).await
    }

    /// A booking's completion record, if present
    pub async fn completion(&self, booking_id: &str) -> AppResult<Option<TourCompletion>> {
        self.completions.get(booking_id).await
    }
}
