//! Review Repository

use super::{RepoError, RepoResult, completion};
use shared::models::{Review, ReviewVisibility};
use sqlx::SqlitePool;

const REVIEW_SELECT: &str = "SELECT id, booking_id, guide_id, rater_id, tour_id, overall_score, \
     title, body, communication, knowledge, punctuality, friendliness, overall, \
     would_recommend, verified, visibility, created_at, updated_at FROM review";

pub async fn find_by_id(pool: &SqlitePool, review_id: &str) -> RepoResult<Option<Review>> {
    let sql = format!("{REVIEW_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Review>(&sql)
        .bind(review_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Persist a review and advance its booking to `review_completed` in one
/// transaction; neither write lands without the other.
///
/// Returns false when the lifecycle precondition was lost to a concurrent
/// writer (the caller re-reads the completion to classify the loss).
pub async fn create_with_transition(pool: &SqlitePool, review: &Review) -> RepoResult<bool> {
    let mut tx = pool.begin().await?;

    if !completion::record_review_in(&mut *tx, &review.booking_id, &review.id, review.created_at)
        .await?
    {
        return Ok(false); // dropped tx rolls back
    }

    let insert = sqlx::query(
        "INSERT INTO review
         (id, booking_id, guide_id, rater_id, tour_id, overall_score, title, body,
          communication, knowledge, punctuality, friendliness, overall,
          would_recommend, verified, visibility, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&review.id)
    .bind(&review.booking_id)
    .bind(&review.guide_id)
    .bind(&review.rater_id)
    .bind(&review.tour_id)
    .bind(review.overall_score)
    .bind(&review.title)
    .bind(&review.body)
    .bind(review.scores.communication)
    .bind(review.scores.knowledge)
    .bind(review.scores.punctuality)
    .bind(review.scores.friendliness)
    .bind(review.scores.overall)
    .bind(review.would_recommend)
    .bind(review.verified)
    .bind(review.visibility)
    .bind(review.created_at)
    .bind(review.updated_at)
    .execute(&mut *tx)
    .await;

    match insert {
        Ok(_) => {}
        // UNIQUE(booking_id): a parallel create got there first
        Err(e) => match RepoError::from(e) {
            RepoError::Duplicate(_) => return Ok(false),
            other => return Err(other),
        },
    }

    tx.commit().await?;
    Ok(true)
}

/// Update score/body; restricted to the owning rater by the service layer.
pub async fn update(
    pool: &SqlitePool,
    review_id: &str,
    new_score: Option<i64>,
    new_comment: Option<&str>,
    now: i64,
) -> RepoResult<()> {
    let result = sqlx::query(
        "UPDATE review SET overall_score = COALESCE(?1, overall_score),
         body = COALESCE(?2, body), updated_at = ?3 WHERE id = ?4",
    )
    .bind(new_score)
    .bind(new_comment)
    .bind(now)
    .bind(review_id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Review {review_id} not found")));
    }
    Ok(())
}

pub async fn delete(pool: &SqlitePool, review_id: &str) -> RepoResult<()> {
    let result = sqlx::query("DELETE FROM review WHERE id = ?")
        .bind(review_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Review {review_id} not found")));
    }
    Ok(())
}

/// Moderation hook: set visibility and the verified flag
pub async fn set_visibility(
    pool: &SqlitePool,
    review_id: &str,
    visibility: ReviewVisibility,
    verified: bool,
    now: i64,
) -> RepoResult<()> {
    let result = sqlx::query(
        "UPDATE review SET visibility = ?, verified = ?, updated_at = ? WHERE id = ?",
    )
    .bind(visibility)
    .bind(verified)
    .bind(now)
    .bind(review_id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Review {review_id} not found")));
    }
    Ok(())
}

/// All approved reviews for a guide (stats are read-recomputed from this)
pub async fn find_approved_by_guide(
    pool: &SqlitePool,
    guide_id: &str,
) -> RepoResult<Vec<Review>> {
    let sql = format!("{REVIEW_SELECT} WHERE guide_id = ? AND visibility = ? ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, Review>(&sql)
        .bind(guide_id)
        .bind(ReviewVisibility::Approved)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Approved reviews for a tour, newest first, bounded by `limit`
pub async fn find_approved_by_tour(
    pool: &SqlitePool,
    tour_id: &str,
    limit: i64,
) -> RepoResult<Vec<Review>> {
    let sql = format!(
        "{REVIEW_SELECT} WHERE tour_id = ? AND visibility = ? ORDER BY created_at DESC LIMIT ?"
    );
    let rows = sqlx::query_as::<_, Review>(&sql)
        .bind(tour_id)
        .bind(ReviewVisibility::Approved)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
