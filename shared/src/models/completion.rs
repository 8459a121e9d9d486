//! Tour Completion Lifecycle Model
//!
//! Each booking carries one completion record tracking how far it has
//! moved through the review pipeline:
//!
//! ```text
//! completed --(guide confirms)--> guide_confirmed
//!           --(invitation sent)--> review_sent
//!           --(review submitted)--> review_completed
//! ```
//!
//! Transitions are linear and never regress.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a booking's completion record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    /// Service period ended (recorded by the booking system)
    Completed,
    /// Guide attested the service was delivered
    GuideConfirmed,
    /// Review invitation dispatched to the traveler
    ReviewSent,
    /// Traveler submitted the review
    ReviewCompleted,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::GuideConfirmed => "guide_confirmed",
            Self::ReviewSent => "review_sent",
            Self::ReviewCompleted => "review_completed",
        }
    }

    /// Position in the linear lifecycle; later states have higher ranks
    pub fn rank(&self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::GuideConfirmed => 1,
            Self::ReviewSent => 2,
            Self::ReviewCompleted => 3,
        }
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One booking's completion record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TourCompletion {
    pub booking_id: String,
    pub guide_id: String,
    pub traveler_id: String,
    pub tour_id: String,
    pub completed_at: i64,
    pub guide_confirmed_at: Option<i64>,
    /// Free-text note left by the guide at confirmation time
    pub confirmation_note: Option<String>,
    pub status: CompletionStatus,
    pub review_id: Option<String>,
    pub updated_at: i64,
}

impl TourCompletion {
    /// Whether `rater_id` may create a review for this booking right now.
    ///
    /// True iff the rater is the traveler on the booking, the guide has
    /// confirmed delivery (invitation sent or not), and no review exists
    /// yet. Side-effect-free; safe to call repeatedly.
    pub fn can_review(&self, rater_id: &str) -> bool {
        self.traveler_id == rater_id
            && matches!(
                self.status,
                CompletionStatus::GuideConfirmed | CompletionStatus::ReviewSent
            )
            && self.review_id.is_none()
    }
}

/// Ingest payload from the external booking system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionCreate {
    pub booking_id: String,
    pub guide_id: String,
    pub traveler_id: String,
    pub tour_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(status: CompletionStatus, review_id: Option<&str>) -> TourCompletion {
        TourCompletion {
            booking_id: "bk_1".into(),
            guide_id: "guide_1".into(),
            traveler_id: "traveler_1".into(),
            tour_id: "tour_1".into(),
            completed_at: 0,
            guide_confirmed_at: None,
            confirmation_note: None,
            status,
            review_id: review_id.map(String::from),
            updated_at: 0,
        }
    }

    #[test]
    fn test_rank_is_monotonic() {
        let order = [
            CompletionStatus::Completed,
            CompletionStatus::GuideConfirmed,
            CompletionStatus::ReviewSent,
            CompletionStatus::ReviewCompleted,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn test_can_review_requires_confirmation() {
        assert!(!completion(CompletionStatus::Completed, None).can_review("traveler_1"));
        assert!(completion(CompletionStatus::GuideConfirmed, None).can_review("traveler_1"));
        assert!(completion(CompletionStatus::ReviewSent, None).can_review("traveler_1"));
        assert!(!completion(CompletionStatus::ReviewCompleted, None).can_review("traveler_1"));
    }

    #[test]
    fn test_can_review_rejects_other_users() {
        let c = completion(CompletionStatus::GuideConfirmed, None);
        assert!(!c.can_review("guide_1"));
        assert!(!c.can_review("someone_else"));
    }

    #[test]
    fn test_can_review_false_once_review_exists() {
        let c = completion(CompletionStatus::ReviewSent, Some("review_1"));
        assert!(!c.can_review("traveler_1"));
    }
}
