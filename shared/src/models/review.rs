//! Guide Review Models
//!
//! A review is a written appraisal of a guide for one completed booking:
//! an overall score, a title/body, and one score per fixed category.
//! Guide-level statistics are recomputed from the approved review set at
//! read time rather than maintained incrementally.

use crate::error::{AppError, ErrorCode};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::rating::score_in_range;

/// Fixed set of review categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewCategory {
    Communication,
    Knowledge,
    Punctuality,
    Friendliness,
    Overall,
}

impl ReviewCategory {
    /// All categories, in storage order
    pub const ALL: [ReviewCategory; 5] = [
        ReviewCategory::Communication,
        ReviewCategory::Knowledge,
        ReviewCategory::Punctuality,
        ReviewCategory::Friendliness,
        ReviewCategory::Overall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Communication => "communication",
            Self::Knowledge => "knowledge",
            Self::Punctuality => "punctuality",
            Self::Friendliness => "friendliness",
            Self::Overall => "overall",
        }
    }
}

impl fmt::Display for ReviewCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete per-category scores for one review
///
/// One field per category, so a missing category is unrepresentable once
/// the input has been converted. Built from [`CategoryScoresInput`] at the
/// wire boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CategoryScores {
    pub communication: i64,
    pub knowledge: i64,
    pub punctuality: i64,
    pub friendliness: i64,
    pub overall: i64,
}

impl CategoryScores {
    /// Score for one category
    pub fn get(&self, category: ReviewCategory) -> i64 {
        match category {
            ReviewCategory::Communication => self.communication,
            ReviewCategory::Knowledge => self.knowledge,
            ReviewCategory::Punctuality => self.punctuality,
            ReviewCategory::Friendliness => self.friendliness,
            ReviewCategory::Overall => self.overall,
        }
    }

    /// Iterate (category, score) pairs in storage order
    pub fn iter(&self) -> impl Iterator<Item = (ReviewCategory, i64)> + '_ {
        ReviewCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

/// Wire-side category scores: every field optional so the converter can
/// distinguish "missing" from "out of range"
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CategoryScoresInput {
    pub communication: Option<i64>,
    pub knowledge: Option<i64>,
    pub punctuality: Option<i64>,
    pub friendliness: Option<i64>,
    pub overall: Option<i64>,
}

impl CategoryScoresInput {
    fn get(&self, category: ReviewCategory) -> Option<i64> {
        match category {
            ReviewCategory::Communication => self.communication,
            ReviewCategory::Knowledge => self.knowledge,
            ReviewCategory::Punctuality => self.punctuality,
            ReviewCategory::Friendliness => self.friendliness,
            ReviewCategory::Overall => self.overall,
        }
    }
}

impl TryFrom<CategoryScoresInput> for CategoryScores {
    type Error = AppError;

    fn try_from(input: CategoryScoresInput) -> Result<Self, Self::Error> {
        for category in ReviewCategory::ALL {
            match input.get(category) {
                None => {
                    return Err(AppError::new(ErrorCode::IncompleteCategoryRating)
                        .with_detail("category", category.as_str()));
                }
                Some(score) if !score_in_range(score) => {
                    return Err(AppError::new(ErrorCode::ValueOutOfRange)
                        .with_detail("category", category.as_str())
                        .with_detail("score", score));
                }
                Some(_) => {}
            }
        }
        Ok(Self {
            communication: input.communication.unwrap_or_default(),
            knowledge: input.knowledge.unwrap_or_default(),
            punctuality: input.punctuality.unwrap_or_default(),
            friendliness: input.friendliness.unwrap_or_default(),
            overall: input.overall.unwrap_or_default(),
        })
    }
}

/// Moderation visibility of a review
///
/// Owned by the external moderation collaborator; the engine only writes
/// `Pending` on create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ReviewVisibility {
    Pending,
    Approved,
    Rejected,
}

impl Default for ReviewVisibility {
    fn default() -> Self {
        Self::Pending
    }
}

/// One traveler's review of a guide for one booking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Review {
    pub id: String,
    pub booking_id: String,
    pub guide_id: String,
    pub rater_id: String,
    pub tour_id: String,
    pub overall_score: i64,
    pub title: String,
    pub body: String,
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub scores: CategoryScores,
    pub would_recommend: bool,
    pub verified: bool,
    pub visibility: ReviewVisibility,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Per-category mean scores across a guide's approved reviews
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryAverages {
    pub communication: f64,
    pub knowledge: f64,
    pub punctuality: f64,
    pub friendliness: f64,
    pub overall: f64,
}

/// Derived statistics over a guide's approved reviews
///
/// Recomputed from the current review set at read time; an empty set
/// yields all zeros rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewStats {
    pub total_reviews: i64,
    pub average_rating: f64,
    /// Count of reviews per star; index 0 holds one-star reviews
    pub rating_breakdown: [i64; 5],
    pub category_averages: CategoryAverages,
    pub last_updated: i64,
}

impl ReviewStats {
    /// Stats for a guide with no approved reviews
    pub fn empty(now: i64) -> Self {
        Self {
            total_reviews: 0,
            average_rating: 0.0,
            rating_breakdown: [0; 5],
            category_averages: CategoryAverages::default(),
            last_updated: now,
        }
    }

    /// Compute stats from a set of reviews
    pub fn from_reviews(reviews: &[Review], now: i64) -> Self {
        if reviews.is_empty() {
            return Self::empty(now);
        }
        let n = reviews.len() as f64;

        let mut breakdown = [0i64; 5];
        let mut score_sum = 0i64;
        let mut category_sums = [0i64; 5];
        for review in reviews {
            score_sum += review.overall_score;
            if score_in_range(review.overall_score) {
                breakdown[(review.overall_score - 1) as usize] += 1;
            }
            for (i, (_, score)) in review.scores.iter().enumerate() {
                category_sums[i] += score;
            }
        }

        Self {
            total_reviews: reviews.len() as i64,
            average_rating: score_sum as f64 / n,
            rating_breakdown: breakdown,
            category_averages: CategoryAverages {
                communication: category_sums[0] as f64 / n,
                knowledge: category_sums[1] as f64 / n,
                punctuality: category_sums[2] as f64 / n,
                friendliness: category_sums[3] as f64 / n,
                overall: category_sums[4] as f64 / n,
            },
            last_updated: now,
        }
    }
}
