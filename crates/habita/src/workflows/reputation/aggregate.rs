use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AdvisorId, Tier};

/// Materialized per-advisor view of the ledger: current score, derived tier,
/// and the optimistic-concurrency token guarding updates.
///
/// The tier is always recomputed from the score by the engine; nothing may
/// set it independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorMetrics {
    pub advisor_id: AdvisorId,
    pub current_score: i64,
    pub current_tier: Tier,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl AdvisorMetrics {
    /// Fresh zero-score row for an advisor with no ledger history yet.
    pub fn initial(advisor_id: AdvisorId, now: DateTime<Utc>) -> Self {
        Self {
            advisor_id,
            current_score: 0,
            current_tier: Tier::Rookie,
            version: 0,
            updated_at: now,
        }
    }

    pub fn status_view(&self) -> MetricsView {
        MetricsView {
            advisor_id: self.advisor_id.clone(),
            score: self.current_score,
            tier: self.current_tier.label(),
            updated_at: self.updated_at,
        }
    }
}

/// Storage abstraction for the aggregate rows.
///
/// The store holds no business logic; it is a versioned key/value cell. The
/// compare-and-swap is the only mutation path, so a caller that read version
/// `n` can never silently overwrite a concurrent writer's version `n + 1`.
pub trait MetricsStore: Send + Sync {
    /// Fetch the advisor's row, creating the zero-score rookie row if absent.
    fn get_or_init(&self, advisor_id: &AdvisorId) -> Result<AdvisorMetrics, MetricsError>;

    /// Replace score and tier iff the stored version still matches
    /// `expected_version`. Returns the updated row.
    fn compare_and_swap(
        &self,
        advisor_id: &AdvisorId,
        expected_version: u64,
        new_score: i64,
        new_tier: Tier,
    ) -> Result<AdvisorMetrics, MetricsError>;
}

/// Error enumeration for aggregate-store failures.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("aggregate row changed since it was read")]
    VersionConflict,
    #[error("metrics store unavailable: {0}")]
    Unavailable(String),
}

/// Sanitized representation of an advisor's current standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsView {
    pub advisor_id: AdvisorId,
    pub score: i64,
    pub tier: &'static str,
    pub updated_at: DateTime<Utc>,
}
