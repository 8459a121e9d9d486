//! Completion Service - the review-eligibility state machine
//!
//! Owns every `TourCompletion.status` transition:
//!
//! ```text
//! completed -> guide_confirmed -> review_sent -> review_completed
//! ```
//!
//! Transitions are committed with status-guarded updates so a concurrent
//! caller loses the write instead of regressing the machine. The review
//! aggregator only reads completions here; the final transition
//! (`record_review`) runs inside the review-creation transaction.

use crate::db::repository::completion;
use crate::services::notify::ReviewInviteNotifier;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{CompletionCreate, CompletionStatus, TourCompletion};
use shared::util::now_millis;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct CompletionService {
    pool: SqlitePool,
    notifier: Arc<dyn ReviewInviteNotifier>,
}

impl CompletionService {
    pub fn new(pool: SqlitePool, notifier: Arc<dyn ReviewInviteNotifier>) -> Self {
        Self { pool, notifier }
    }

    /// Ingest a completion from the booking system; the record starts in
    /// `completed`.
    pub async fn record_completion(&self, data: CompletionCreate) -> AppResult<TourCompletion> {
        if data.booking_id.trim().is_empty()
            || data.guide_id.trim().is_empty()
            || data.traveler_id.trim().is_empty()
            || data.tour_id.trim().is_empty()
        {
            return Err(AppError::new(ErrorCode::RequiredField));
        }

        let now = now_millis();
        completion::create(&self.pool, &data, now)
            .await
            .map_err(|e| match e {
                crate::db::repository::RepoError::Duplicate(_) => AppError::with_message(
                    ErrorCode::BookingExists,
                    format!("Completion for booking {} already recorded", data.booking_id),
                ),
                other => other.into(),
            })?;

        tracing::info!(booking_id = %data.booking_id, tour_id = %data.tour_id, "Completion recorded");
        self.must_get(&data.booking_id).await
    }

    /// Guide attests the service was delivered.
    ///
    /// Legal only from `completed`; only the booking's guide may call it.
    /// Sets `guide_confirmed_at` and hands the review invitation to the
    /// injected notifier. Delivery itself belongs to the external
    /// notification collaborator: the record rests at `guide_confirmed`
    /// until that collaborator reports dispatch through
    /// `mark_review_sent`. Notifier failure is logged, never surfaced to
    /// the guide.
    pub async fn confirm_delivery(
        &self,
        booking_id: &str,
        confirmer_id: &str,
        note: Option<String>,
    ) -> AppResult<TourCompletion> {
        let current = self.must_get(booking_id).await?;

        if current.guide_id != confirmer_id {
            return Err(AppError::new(ErrorCode::NotBookingGuide)
                .with_detail("booking_id", booking_id));
        }
        if current.status != CompletionStatus::Completed {
            return Err(AppError::invalid_transition(format!(
                "Cannot confirm delivery for booking {booking_id} in status {}",
                current.status
            )));
        }

        let now = now_millis();
        let confirmed =
            completion::confirm_delivery(&self.pool, booking_id, note.as_deref(), now).await?;
        if !confirmed {
            // Raced with another transition since the read above
            return Err(AppError::invalid_transition(format!(
                "Booking {booking_id} left the completed state concurrently"
            )));
        }
        tracing::info!(booking_id, confirmer_id, "Delivery confirmed by guide");

        let current = self.must_get(booking_id).await?;
        if let Err(e) = self.notifier.send_review_invitation(&current).await {
            tracing::warn!(booking_id, error = %e, "Review invitation dispatch failed");
        }

        Ok(current)
    }

    /// System transition `guide_confirmed -> review_sent`, invoked by the
    /// notification collaborator once the invitation actually went out.
    ///
    /// Idempotent: calling it again once the record is at `review_sent`
    /// or later is a no-op. Calling it before the guide confirmed is a
    /// rejected transition.
    pub async fn mark_review_sent(&self, booking_id: &str) -> AppResult<()> {
        let current = self.must_get(booking_id).await?;
        match current.status {
            CompletionStatus::GuideConfirmed => {
                completion::mark_review_sent(&self.pool, booking_id, now_millis()).await?;
                tracing::info!(booking_id, "Review invitation marked sent");
                Ok(())
            }
            CompletionStatus::ReviewSent | CompletionStatus::ReviewCompleted => Ok(()),
            CompletionStatus::Completed => Err(AppError::invalid_transition(format!(
                "Booking {booking_id} has no guide confirmation yet"
            ))),
        }
    }

    /// Whether `rater_id` may review this booking right now.
    ///
    /// Pure read; unknown bookings are simply not eligible.
    pub async fn can_review(&self, booking_id: &str, rater_id: &str) -> AppResult<bool> {
        let current = completion::find_by_booking(&self.pool, booking_id).await?;
        Ok(current.map(|c| c.can_review(rater_id)).unwrap_or(false))
    }

    /// Fetch a completion record, if present
    pub async fn get(&self, booking_id: &str) -> AppResult<Option<TourCompletion>> {
        Ok(completion::find_by_booking(&self.pool, booking_id).await?)
    }

    async fn must_get(&self, booking_id: &str) -> AppResult<TourCompletion> {
        completion::find_by_booking(&self.pool, booking_id)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::BookingNotFound,
                    format!("Completion for booking {booking_id} not found"),
                )
            })
    }
}
