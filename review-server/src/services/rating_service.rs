//! Rating Service - per-target aggregate maintenance
//!
//! Maintains one running aggregate (average, count) per rated target and
//! at most one live record per (target, rater) pair. Every mutation is a
//! single read-compute-commit cycle over exactly that pair of rows,
//! committed behind the aggregate's version and re-run on conflict, so
//! two submissions against the same target can never compute their new
//! average from a stale read. Operations on different targets never
//! contend.

use crate::db::repository::rating;
use crate::db::txn::TxnRetry;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{RatingAggregate, TargetKind, score_in_range};
use shared::util::now_millis;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct RatingService {
    pool: SqlitePool,
    txn: TxnRetry,
}

impl RatingService {
    pub fn new(pool: SqlitePool, max_retries: u32) -> Self {
        Self {
            pool,
            txn: TxnRetry::new(max_retries),
        }
    }

    /// Create or replace the caller's rating for a target.
    ///
    /// A prior score is replaced in place (count unchanged, total adjusted
    /// by the delta); a first-time rating grows the count. Returns the
    /// committed aggregate.
    pub async fn submit_rating(
        &self,
        kind: TargetKind,
        target_id: &str,
        rater_id: &str,
        score: i64,
    ) -> AppResult<RatingAggregate> {
        if !score_in_range(score) {
            return Err(AppError::new(ErrorCode::RatingOutOfRange).with_detail("score", score));
        }
        require_rater(rater_id)?;

        let committed = self
            .txn
            .run("submit_rating", move |_| async move {
                // Version first: any commit after this read bumps it and
                // fails our conditional write, so the record read below
                // can never feed a stale delta into a commit.
                let agg_row = rating::find_aggregate(&self.pool, kind, target_id).await?;
                let prior = rating::find_record(&self.pool, kind, target_id, rater_id).await?;

                let now = now_millis();
                let current = agg_row
                    .as_ref()
                    .map(|row| row.aggregate())
                    .unwrap_or_else(|| RatingAggregate::empty(now));
                let next = current.with_submitted(prior.as_ref().map(|r| r.score), score, now);

                let committed = rating::commit_submit(
                    &self.pool,
                    kind,
                    target_id,
                    rater_id,
                    score,
                    agg_row.as_ref().map(|row| row.version),
                    &next,
                    now,
                )
                .await;
                Ok(retryable(committed)?.then_some(next))
            })
            .await?;

        tracing::info!(
            kind = %kind,
            target_id,
            rater_id,
            score,
            average = committed.average_rating,
            count = committed.rating_count,
            "Rating submitted"
        );
        Ok(committed)
    }

    /// Delete the caller's rating and shrink the aggregate.
    pub async fn remove_rating(
        &self,
        kind: TargetKind,
        target_id: &str,
        rater_id: &str,
    ) -> AppResult<RatingAggregate> {
        require_rater(rater_id)?;

        let committed = self
            .txn
            .run("remove_rating", move |_| async move {
                let agg_row = rating::find_aggregate(&self.pool, kind, target_id).await?;
                let prior = rating::find_record(&self.pool, kind, target_id, rater_id).await?;

                let Some(record) = prior else {
                    return Err(AppError::with_message(
                        ErrorCode::RatingNotFound,
                        format!("No rating by {rater_id} for {kind} {target_id}"),
                    ));
                };
                // A live record implies the aggregate row exists
                let Some(agg_row) = agg_row else {
                    return Ok(None);
                };

                let now = now_millis();
                let next = agg_row.aggregate().with_removed(record.score, now);

                let committed = rating::commit_remove(
                    &self.pool,
                    kind,
                    target_id,
                    rater_id,
                    agg_row.version,
                    &next,
                )
                .await;
                Ok(retryable(committed)?.then_some(next))
            })
            .await?;

        tracing::info!(kind = %kind, target_id, rater_id, "Rating removed");
        Ok(committed)
    }

    /// Aggregate stats for a target; `{0, 0, now}` when nobody has rated it.
    pub async fn get_stats(&self, kind: TargetKind, target_id: &str) -> AppResult<RatingAggregate> {
        let row = rating::find_aggregate(&self.pool, kind, target_id).await?;
        Ok(row
            .map(|r| r.aggregate())
            .unwrap_or_else(|| RatingAggregate::empty(now_millis())))
    }

    /// The caller's own score for a target; 0 when absent.
    pub async fn get_user_rating(
        &self,
        kind: TargetKind,
        target_id: &str,
        rater_id: &str,
    ) -> AppResult<i64> {
        let record = rating::find_record(&self.pool, kind, target_id, rater_id).await?;
        Ok(record.map(|r| r.score).unwrap_or(0))
    }
}

/// A busy/locked database at commit time is a lost race, not a failure:
/// fold it into the "re-read and recompute" path.
fn retryable(committed: Result<bool, crate::db::repository::RepoError>) -> AppResult<bool> {
    use crate::db::repository::RepoError;
    match committed {
        Ok(ok) => Ok(ok),
        Err(RepoError::Conflict(msg)) => {
            tracing::debug!(error = %msg, "Commit lost to a concurrent writer");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// The API layer authenticates callers; a blank rater id this deep means
/// a caller bypassed it.
fn require_rater(rater_id: &str) -> AppResult<()> {
    if rater_id.trim().is_empty() {
        return Err(AppError::not_authenticated());
    }
    Ok(())
}
