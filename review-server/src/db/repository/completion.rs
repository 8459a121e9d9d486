//! Tour Completion Repository
//!
//! Lifecycle transitions are committed with status-guarded updates
//! (`WHERE status = ...`), so a racing transition loses the write instead
//! of silently regressing the state machine.

use super::RepoResult;
use shared::models::{CompletionCreate, CompletionStatus, TourCompletion};
use sqlx::SqlitePool;

const COMPLETION_SELECT: &str = "SELECT booking_id, guide_id, traveler_id, tour_id, completed_at, \
     guide_confirmed_at, confirmation_note, status, review_id, updated_at FROM tour_completion";

pub async fn find_by_booking(
    pool: &SqlitePool,
    booking_id: &str,
) -> RepoResult<Option<TourCompletion>> {
    let sql = format!("{COMPLETION_SELECT} WHERE booking_id = ?");
    let row = sqlx::query_as::<_, TourCompletion>(&sql)
        .bind(booking_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Insert a fresh completion record in state `completed`.
///
/// A duplicate booking surfaces as `RepoError::Duplicate`.
pub async fn create(pool: &SqlitePool, data: &CompletionCreate, now: i64) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO tour_completion
         (booking_id, guide_id, traveler_id, tour_id, completed_at, status, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&data.booking_id)
    .bind(&data.guide_id)
    .bind(&data.traveler_id)
    .bind(&data.tour_id)
    .bind(now)
    .bind(CompletionStatus::Completed)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// `completed -> guide_confirmed`, guarded on the source state.
///
/// Returns false when the booking was not in `completed` at write time.
pub async fn confirm_delivery(
    pool: &SqlitePool,
    booking_id: &str,
    note: Option<&str>,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE tour_completion
         SET status = ?, guide_confirmed_at = ?, confirmation_note = ?, updated_at = ?
         WHERE booking_id = ? AND status = ?",
    )
    .bind(CompletionStatus::GuideConfirmed)
    .bind(now)
    .bind(note)
    .bind(now)
    .bind(booking_id)
    .bind(CompletionStatus::Completed)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// `guide_confirmed -> review_sent`, guarded on the source state.
pub async fn mark_review_sent(pool: &SqlitePool, booking_id: &str, now: i64) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE tour_completion SET status = ?, updated_at = ?
         WHERE booking_id = ? AND status = ?",
    )
    .bind(CompletionStatus::ReviewSent)
    .bind(now)
    .bind(booking_id)
    .bind(CompletionStatus::GuideConfirmed)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// `{guide_confirmed, review_sent} -> review_completed`, inside an open
/// transaction so it commits together with the review insert.
///
/// Returns false when the precondition (eligible state, no review yet)
/// no longer holds.
pub async fn record_review_in(
    tx: &mut sqlx::SqliteConnection,
    booking_id: &str,
    review_id: &str,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE tour_completion SET status = ?, review_id = ?, updated_at = ?
         WHERE booking_id = ? AND status IN (?, ?) AND review_id IS NULL",
    )
    .bind(CompletionStatus::ReviewCompleted)
    .bind(review_id)
    .bind(now)
    .bind(booking_id)
    .bind(CompletionStatus::GuideConfirmed)
    .bind(CompletionStatus::ReviewSent)
    .execute(&mut *tx)
    .await?;
    Ok(result.rows_affected() > 0)
}
