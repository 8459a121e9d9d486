//! End-to-end engine flows over a real (temporary) database:
//! rating aggregation under sequential and concurrent writers, the
//! completion-to-review lifecycle, and the read facade.

use std::sync::Arc;

use review_server::core::{Config, ServerState};
use review_server::db::DbService;
use review_server::db::repository::rating;
use review_server::services::{CreateReviewRequest, LogNotifier};
use shared::error::ErrorCode;
use shared::models::{
    CategoryScoresInput, CompletionCreate, CompletionStatus, ReviewVisibility, TargetKind,
};
use tempfile::TempDir;

async fn test_state() -> (TempDir, ServerState) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("engine.db");
    let db = DbService::new(db_path.to_str().unwrap()).await.unwrap();
    let config = Config::with_overrides(dir.path().to_string_lossy().to_string(), 0);
    let state = ServerState::with_pool(config, db.pool, Arc::new(LogNotifier));
    (dir, state)
}

fn review_request(score: i64) -> CreateReviewRequest {
    CreateReviewRequest {
        overall_score: score,
        title: "A day well spent".into(),
        body: "The guide knew every backstreet and the pace was perfect.".into(),
        category_scores: CategoryScoresInput {
            communication: Some(score),
            knowledge: Some(score),
            punctuality: Some(score),
            friendliness: Some(score),
            overall: Some(score),
        },
        would_recommend: true,
    }
}

fn booking(id: &str) -> CompletionCreate {
    CompletionCreate {
        booking_id: id.into(),
        guide_id: "guide_1".into(),
        traveler_id: "traveler_1".into(),
        tour_id: "tour_1".into(),
    }
}

// ============================================================================
// Scenario A: sequential rating aggregation
// ============================================================================

#[tokio::test]
async fn scenario_a_sequential_aggregation() {
    let (_dir, state) = test_state().await;
    let ratings = &state.ratings;

    // No ratings yet
    let stats = ratings.get_stats(TargetKind::Tour, "T1").await.unwrap();
    assert_eq!((stats.average_rating, stats.rating_count), (0.0, 0));
    assert!(stats.last_updated > 0);

    // U1 submits 4
    ratings.submit_rating(TargetKind::Tour, "T1", "U1", 4).await.unwrap();
    let stats = ratings.get_stats(TargetKind::Tour, "T1").await.unwrap();
    assert_eq!((stats.average_rating, stats.rating_count), (4.0, 1));

    // U1 updates to 2
    ratings.submit_rating(TargetKind::Tour, "T1", "U1", 2).await.unwrap();
    let stats = ratings.get_stats(TargetKind::Tour, "T1").await.unwrap();
    assert_eq!((stats.average_rating, stats.rating_count), (2.0, 1));

    // U2 submits 4
    ratings.submit_rating(TargetKind::Tour, "T1", "U2", 4).await.unwrap();
    let stats = ratings.get_stats(TargetKind::Tour, "T1").await.unwrap();
    assert_eq!((stats.average_rating, stats.rating_count), (3.0, 2));
}

// ============================================================================
// Invariant: average * count equals the sum of live records
// ============================================================================

#[tokio::test]
async fn aggregate_matches_record_sum_through_mixed_mutations() {
    let (_dir, state) = test_state().await;
    let ratings = &state.ratings;

    let ops: [(&str, i64); 6] = [
        ("U1", 5),
        ("U2", 3),
        ("U3", 1),
        ("U1", 2), // overwrite
        ("U4", 4),
        ("U2", 5), // overwrite
    ];
    for (user, score) in ops {
        ratings
            .submit_rating(TargetKind::Content, "C1", user, score)
            .await
            .unwrap();
    }
    ratings.remove_rating(TargetKind::Content, "C1", "U3").await.unwrap();

    let stats = ratings.get_stats(TargetKind::Content, "C1").await.unwrap();
    let sum = rating::sum_scores(&state.pool, TargetKind::Content, "C1")
        .await
        .unwrap();
    assert_eq!(stats.rating_count, 3);
    assert!(
        (stats.average_rating * stats.rating_count as f64 - sum as f64).abs() < 1e-9,
        "aggregate diverged from record sum"
    );
}

// ============================================================================
// Scenario B: completion-to-review lifecycle
// ============================================================================

#[tokio::test]
async fn scenario_b_lifecycle_gating() {
    let (_dir, state) = test_state().await;

    state.completions.record_completion(booking("B1")).await.unwrap();

    // Review before guide confirmation is rejected
    let err = state
        .reviews
        .create_review("B1", "traveler_1", review_request(5))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotEligible);

    // Guide confirms -> guide_confirmed, traveler becomes eligible
    let confirmed = state
        .completions
        .confirm_delivery("B1", "guide_1", None)
        .await
        .unwrap();
    assert_eq!(confirmed.status, CompletionStatus::GuideConfirmed);
    assert!(state.queries.can_review("B1", "traveler_1").await.unwrap());

    // Traveler reviews -> review_completed
    let review = state
        .reviews
        .create_review("B1", "traveler_1", review_request(5))
        .await
        .unwrap();
    let completion = state.queries.completion("B1").await.unwrap().unwrap();
    assert_eq!(completion.status, CompletionStatus::ReviewCompleted);
    assert_eq!(completion.review_id.as_deref(), Some(review.id.as_str()));
    assert!(!state.queries.can_review("B1", "traveler_1").await.unwrap());

    // Second review is rejected loudly
    let err = state
        .reviews
        .create_review("B1", "traveler_1", review_request(3))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::AlreadyReviewed);

    // Status never regresses: confirming again is an invalid transition
    let err = state
        .completions
        .confirm_delivery("B1", "guide_1", None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);
}

// ============================================================================
// Scenario C: concurrent submitters against one target
// ============================================================================

#[tokio::test]
async fn scenario_c_concurrent_submits_lose_no_update() {
    let (_dir, state) = test_state().await;

    let svc_a = (*state.ratings).clone();
    let svc_b = (*state.ratings).clone();
    let a = tokio::spawn(async move {
        svc_a.submit_rating(TargetKind::Tour, "T2", "U3", 5).await
    });
    let b = tokio::spawn(async move {
        svc_b.submit_rating(TargetKind::Tour, "T2", "U4", 1).await
    });
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let stats = state.ratings.get_stats(TargetKind::Tour, "T2").await.unwrap();
    assert_eq!(stats.rating_count, 2);
    assert!((stats.average_rating - 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn concurrent_submits_many_writers() {
    let (_dir, state) = test_state().await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let svc = (*state.ratings).clone();
        handles.push(tokio::spawn(async move {
            let user = format!("user_{i}");
            let score = ((i % 5) + 1) as i64;
            svc.submit_rating(TargetKind::Tour, "T3", &user, score).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stats = state.ratings.get_stats(TargetKind::Tour, "T3").await.unwrap();
    let sum = rating::sum_scores(&state.pool, TargetKind::Tour, "T3")
        .await
        .unwrap();
    assert_eq!(stats.rating_count, 8);
    assert!((stats.average_rating * 8.0 - sum as f64).abs() < 1e-9);
}

// ============================================================================
// Moderation and the read facade
// ============================================================================

#[tokio::test]
async fn facade_reads_reflect_moderated_reviews() {
    let (_dir, state) = test_state().await;

    state.completions.record_completion(booking("B1")).await.unwrap();
    state
        .completions
        .confirm_delivery("B1", "guide_1", Some("lovely group".into()))
        .await
        .unwrap();
    // Notification collaborator reports the invitation went out
    state.completions.mark_review_sent("B1").await.unwrap();
    let review = state
        .reviews
        .create_review("B1", "traveler_1", review_request(4))
        .await
        .unwrap();

    // Pending: invisible to both stats and listings
    let stats = state.queries.guide_review_stats("guide_1").await.unwrap();
    assert_eq!(stats.total_reviews, 0);
    assert!(state.queries.tour_reviews("tour_1", None).await.unwrap().is_empty());

    // Moderation approves
    state
        .reviews
        .set_visibility(&review.id, ReviewVisibility::Approved, true)
        .await
        .unwrap();

    let stats = state.queries.guide_review_stats("guide_1").await.unwrap();
    assert_eq!(stats.total_reviews, 1);
    assert_eq!(stats.average_rating, 4.0);
    assert_eq!(stats.rating_breakdown[3], 1);

    let listed = state.queries.tour_reviews("tour_1", Some(5)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, review.id);
}
