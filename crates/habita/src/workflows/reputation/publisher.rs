use serde::{Deserialize, Serialize};

use super::domain::{AdvisorId, Tier};

/// Trait describing the outbound notification hook for tier transitions
/// (e.g., the in-app notification or e-mail adapters).
///
/// Publication is fire-and-forget from the engine's point of view: a failed
/// publish is logged and never fails the apply that triggered it.
pub trait TierAlertPublisher: Send + Sync {
    fn publish(&self, alert: TierChangeAlert) -> Result<(), AlertError>;
}

/// Payload describing a promotion or demotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierChangeAlert {
    pub advisor_id: AdvisorId,
    pub previous_tier: Tier,
    pub new_tier: Tier,
    pub score: i64,
}

impl TierChangeAlert {
    pub fn is_promotion(&self) -> bool {
        self.new_tier > self.previous_tier
    }
}

/// Alert dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}
