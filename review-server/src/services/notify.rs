//! Review invitation notifier
//!
//! Notification delivery is an external collaborator: the lifecycle
//! machine only decides *when* an invitation is due. Implementations are
//! injected so deployments can plug in mail/push without touching the
//! engine, and tests can record calls.

use async_trait::async_trait;
use shared::models::TourCompletion;

/// Dispatches the "please review your tour" invitation to the traveler
#[async_trait]
pub trait ReviewInviteNotifier: Send + Sync {
    async fn send_review_invitation(&self, completion: &TourCompletion) -> anyhow::Result<()>;
}

/// Default notifier: logs the invitation and succeeds.
///
/// Stands in until a real delivery channel is wired up in deployment.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl ReviewInviteNotifier for LogNotifier {
    async fn send_review_invitation(&self, completion: &TourCompletion) -> anyhow::Result<()> {
        tracing::info!(
            booking_id = %completion.booking_id,
            traveler_id = %completion.traveler_id,
            tour_id = %completion.tour_id,
            "Review invitation dispatched"
        );
        Ok(())
    }
}
