//! Forwards votes and approval decisions to the backend.

use crate::actor::StationActor;
use crate::error::FeedError;
use crate::notify::Notifier;
use crate::token::TokenId;
use daopad_orbit::ApprovalDecision;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    VoteYes,
    VoteNo,
    Approve,
    Reject,
}

impl Decision {
    pub fn is_vote(&self) -> bool {
        matches!(self, Decision::VoteYes | Decision::VoteNo)
    }

    fn success_message(&self) -> &'static str {
        match self {
            Decision::VoteYes => "Voted yes",
            Decision::VoteNo => "Voted no",
            Decision::Approve => "Request approved",
            Decision::Reject => "Request rejected",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Decision::VoteYes => "vote yes",
            Decision::VoteNo => "vote no",
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        })
    }
}

/// Sends decisions, retrying once after a fixed delay when the backend
/// reports that a dependency is down.
#[derive(Clone)]
pub struct VoteDispatcher {
    actor: Arc<dyn StationActor>,
    notifier: Arc<dyn Notifier>,
    retry_delay: Duration,
    shutdown: watch::Receiver<bool>,
}

impl VoteDispatcher {
    /// `shutdown` flipping to `true` cancels a pending retry wait.
    pub fn new(
        actor: Arc<dyn StationActor>,
        notifier: Arc<dyn Notifier>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            actor,
            notifier,
            retry_delay: DEFAULT_RETRY_DELAY,
            shutdown,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    #[instrument(skip(self, token_id, reason), fields(token_id = %token_id))]
    pub async fn dispatch(
        &self,
        token_id: &TokenId,
        request_id: &str,
        decision: Decision,
        reason: Option<&str>,
    ) -> Result<(), FeedError> {
        if self.actor.is_anonymous() {
            return Err(FeedError::AuthRequired);
        }

        match self.send(token_id, request_id, decision, reason).await {
            Err(e) if e.is_service_unavailable() => {
                warn!(error = %e, delay_ms = self.retry_delay.as_millis() as u64, "Retrying decision");
                self.notifier.info(&format!(
                    "{e}. Retrying in {}s...",
                    self.retry_delay.as_secs_f32()
                ));
                if !self.wait_for_retry().await {
                    info!("Retry cancelled by teardown");
                    return Err(FeedError::Cancelled);
                }
                self.send(token_id, request_id, decision, reason).await
            }
            other => other,
        }
    }

    /// Sleeps for the retry delay. Returns `false` when shutdown was
    /// signalled first.
    async fn wait_for_retry(&self) -> bool {
        let mut shutdown = self.shutdown.clone();
        tokio::select! {
            _ = tokio::time::sleep(self.retry_delay) => true,
            Ok(_) = shutdown.wait_for(|stopped| *stopped) => false,
        }
    }

    async fn send(
        &self,
        token_id: &TokenId,
        request_id: &str,
        decision: Decision,
        reason: Option<&str>,
    ) -> Result<(), FeedError> {
        let token_id = token_id.as_str();
        let result = match decision {
            Decision::VoteYes => self.actor.vote_on_orbit_request(token_id, request_id, true).await?,
            Decision::VoteNo => self.actor.vote_on_orbit_request(token_id, request_id, false).await?,
            Decision::Approve => {
                self.actor
                    .submit_request_approval(token_id, request_id, ApprovalDecision::Approved, reason)
                    .await?
            }
            Decision::Reject => {
                self.actor
                    .submit_request_approval(token_id, request_id, ApprovalDecision::Rejected, reason)
                    .await?
            }
        };
        result.into_result()?;
        info!(request_id, %decision, "Decision accepted");
        self.notifier.success(decision.success_message());
        Ok(())
    }
}
