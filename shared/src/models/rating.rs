//! Rating Models
//!
//! A rating is a single 1-5 star score a user attaches to a target entity
//! (a tour or a piece of content). Each target carries one running
//! aggregate; each (target, rater) pair carries at most one live record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest accepted star score
pub const MIN_SCORE: i64 = 1;
/// Highest accepted star score
pub const MAX_SCORE: i64 = 5;

/// Check a score against the accepted 1-5 range
#[inline]
pub const fn score_in_range(score: i64) -> bool {
    score >= MIN_SCORE && score <= MAX_SCORE
}

/// Kind of entity a rating attaches to
///
/// Replaces collection-name string dispatch: the two rateable entity
/// kinds are a closed set, and each kind maps to its own storage rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A bookable tour
    Tour,
    /// A standalone piece of travel content
    Content,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tour => "tour",
            Self::Content => "content",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tour" => Ok(Self::Tour),
            "content" => Ok(Self::Content),
            other => Err(format!("unknown target kind: {other}")),
        }
    }
}

/// One user's rating of one target
///
/// Identity key is (target_kind, target_id, rater_id); re-submitting
/// replaces the score in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RatingRecord {
    pub target_kind: TargetKind,
    pub target_id: String,
    pub rater_id: String,
    pub score: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Running aggregate statistics for one target
///
/// Invariant: `average_rating * rating_count` equals the sum of all live
/// record scores for the target (floating-point tolerance), and
/// `rating_count == 0` implies `average_rating == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RatingAggregate {
    pub average_rating: f64,
    pub rating_count: i64,
    pub last_updated: i64,
}

impl RatingAggregate {
    /// Aggregate for a target nobody has rated yet
    pub fn empty(now: i64) -> Self {
        Self {
            average_rating: 0.0,
            rating_count: 0,
            last_updated: now,
        }
    }

    /// Sum of all live scores implied by this aggregate
    pub fn total(&self) -> f64 {
        self.average_rating * self.rating_count as f64
    }

    /// Aggregate after a submit: a prior score is replaced in place
    /// (count unchanged), a first-time rating grows the count.
    pub fn with_submitted(&self, prior_score: Option<i64>, score: i64, now: i64) -> Self {
        let (total, count) = match prior_score {
            Some(old) => (self.total() - old as f64 + score as f64, self.rating_count),
            None => (self.total() + score as f64, self.rating_count + 1),
        };
        Self::from_total(total, count, now)
    }

    /// Aggregate after removing a score, clamped so neither the count nor
    /// the total can go negative.
    pub fn with_removed(&self, score: i64, now: i64) -> Self {
        let count = (self.rating_count - 1).max(0);
        let total = (self.total() - score as f64).max(0.0);
        Self::from_total(total, count, now)
    }

    fn from_total(total: f64, count: i64, now: i64) -> Self {
        let average_rating = if count > 0 { total / count as f64 } else { 0.0 };
        Self {
            average_rating,
            rating_count: count,
            last_updated: now,
        }
    }
}
