//! Rating Repository
//!
//! The rating aggregate is the only shared mutable resource per target.
//! Reads capture the aggregate `version` first; commits re-assert it with
//! a conditional write, so any interleaved writer forces the caller to
//! re-read and recompute. The record and the aggregate are only ever
//! written together inside one transaction.

use super::{RepoError, RepoResult};
use shared::models::{RatingAggregate, RatingRecord, TargetKind};
use sqlx::SqlitePool;

/// Aggregate row including its optimistic-concurrency version
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AggregateRow {
    pub average_rating: f64,
    pub rating_count: i64,
    pub last_updated: i64,
    pub version: i64,
}

impl AggregateRow {
    pub fn aggregate(&self) -> RatingAggregate {
        RatingAggregate {
            average_rating: self.average_rating,
            rating_count: self.rating_count,
            last_updated: self.last_updated,
        }
    }
}

/// Read a target's aggregate row, if anyone has rated it yet.
///
/// Must be called before [`find_record`] within a read-compute-commit
/// cycle: the captured `version` is what makes a stale record read
/// harmless, since any concurrent commit bumps it.
pub async fn find_aggregate(
    pool: &SqlitePool,
    kind: TargetKind,
    target_id: &str,
) -> RepoResult<Option<AggregateRow>> {
    let row = sqlx::query_as::<_, AggregateRow>(
        "SELECT average_rating, rating_count, last_updated, version
         FROM rating_aggregate WHERE target_kind = ? AND target_id = ?",
    )
    .bind(kind)
    .bind(target_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Read one rater's live record for a target
pub async fn find_record(
    pool: &SqlitePool,
    kind: TargetKind,
    target_id: &str,
    rater_id: &str,
) -> RepoResult<Option<RatingRecord>> {
    let row = sqlx::query_as::<_, RatingRecord>(
        "SELECT target_kind, target_id, rater_id, score, created_at, updated_at
         FROM rating WHERE target_kind = ? AND target_id = ? AND rater_id = ?",
    )
    .bind(kind)
    .bind(target_id)
    .bind(rater_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Write the aggregate behind its version check inside `tx`.
///
/// Returns false when the conditional write matched no row, i.e. a
/// concurrent writer committed since the aggregate was read.
async fn write_aggregate(
    tx: &mut sqlx::SqliteConnection,
    kind: TargetKind,
    target_id: &str,
    expected_version: Option<i64>,
    next: &RatingAggregate,
) -> RepoResult<bool> {
    match expected_version {
        Some(version) => {
            let result = sqlx::query(
                "UPDATE rating_aggregate
                 SET average_rating = ?, rating_count = ?, last_updated = ?, version = version + 1
                 WHERE target_kind = ? AND target_id = ? AND version = ?",
            )
            .bind(next.average_rating)
            .bind(next.rating_count)
            .bind(next.last_updated)
            .bind(kind)
            .bind(target_id)
            .bind(version)
            .execute(&mut *tx)
            .await?;
            Ok(result.rows_affected() > 0)
        }
        None => {
            // First rating for this target; losing the insert race to
            // another writer is a conflict, not an error
            let result = sqlx::query(
                "INSERT INTO rating_aggregate
                 (target_kind, target_id, average_rating, rating_count, last_updated, version)
                 VALUES (?, ?, ?, ?, ?, 1)",
            )
            .bind(kind)
            .bind(target_id)
            .bind(next.average_rating)
            .bind(next.rating_count)
            .bind(next.last_updated)
            .execute(&mut *tx)
            .await;
            match result {
                Ok(_) => Ok(true),
                Err(e) => match RepoError::from(e) {
                    RepoError::Duplicate(_) => Ok(false),
                    other => Err(other),
                },
            }
        }
    }
}

/// Atomically upsert a rating record and replace the aggregate.
///
/// Returns false on a lost version check; the caller re-reads and
/// recomputes. Both writes commit together or not at all.
pub async fn commit_submit(
    pool: &SqlitePool,
    kind: TargetKind,
    target_id: &str,
    rater_id: &str,
    score: i64,
    expected_version: Option<i64>,
    next: &RatingAggregate,
    now: i64,
) -> RepoResult<bool> {
    let mut tx = pool.begin().await?;

    if !write_aggregate(&mut *tx, kind, target_id, expected_version, next).await? {
        return Ok(false); // dropped tx rolls back
    }

    sqlx::query(
        "INSERT INTO rating (target_kind, target_id, rater_id, score, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT (target_kind, target_id, rater_id)
         DO UPDATE SET score = excluded.score, updated_at = excluded.updated_at",
    )
    .bind(kind)
    .bind(target_id)
    .bind(rater_id)
    .bind(score)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}

/// Atomically delete a rating record and replace the aggregate.
///
/// Same contract as [`commit_submit`].
pub async fn commit_remove(
    pool: &SqlitePool,
    kind: TargetKind,
    target_id: &str,
    rater_id: &str,
    expected_version: i64,
    next: &RatingAggregate,
) -> RepoResult<bool> {
    let mut tx = pool.begin().await?;

    if !write_aggregate(&mut *tx, kind, target_id, Some(expected_version), next).await? {
        return Ok(false);
    }

    sqlx::query("DELETE FROM rating WHERE target_kind = ? AND target_id = ? AND rater_id = ?")
        .bind(kind)
        .bind(target_id)
        .bind(rater_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

/// Sum of all live record scores for a target (invariant checks)
pub async fn sum_scores(
    pool: &SqlitePool,
    kind: TargetKind,
    target_id: &str,
) -> RepoResult<i64> {
    let sum: Option<i64> = sqlx::query_scalar(
        "SELECT SUM(score) FROM rating WHERE target_kind = ? AND target_id = ?",
    )
    .bind(kind)
    .bind(target_id)
    .fetch_one(pool)
    .await?;
    Ok(sum.unwrap_or(0))
}
