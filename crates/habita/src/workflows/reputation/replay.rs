use tracing::info;

use super::aggregate::{AdvisorMetrics, MetricsError, MetricsStore};
use super::domain::AdvisorId;
use super::ledger::{ReputationEvent, ReputationLedger};
use super::publisher::TierAlertPublisher;
use super::service::{ReputationError, ReputationService};

/// Sum of the recorded deltas over a replayed history.
///
/// Uses the deltas captured on the rows, not the live taxonomy, so a rebuild
/// reproduces exactly what was credited at the time.
pub fn replayed_score(events: &[ReputationEvent]) -> i64 {
    events.iter().map(|event| event.points_delta).sum()
}

impl<L, M, P> ReputationService<L, M, P>
where
    L: ReputationLedger + 'static,
    M: MetricsStore + 'static,
    P: TierAlertPublisher + 'static,
{
    /// Rebuild an advisor's aggregate from the full ledger history.
    ///
    /// This is the recovery path for an aggregate left behind by an
    /// interrupted apply (deadline expiry or exhausted contention after the
    /// ledger row was durably written). It runs out-of-band, never on the
    /// hot path. When the stored aggregate already matches the replay it is
    /// returned untouched.
    pub fn reconcile(&self, advisor_id: &AdvisorId) -> Result<AdvisorMetrics, ReputationError> {
        let attempts = self.settings.max_swap_attempts.max(1);

        for _ in 1..=attempts {
            let history = self.ledger.replay(advisor_id)?;
            let rebuilt_score = replayed_score(&history);
            let rebuilt_tier = self.settings.tiers.classify(rebuilt_score);

            let current = self.metrics.get_or_init(advisor_id)?;
            if current.current_score == rebuilt_score && current.current_tier == rebuilt_tier {
                return Ok(current);
            }

            match self.metrics.compare_and_swap(
                advisor_id,
                current.version,
                rebuilt_score,
                rebuilt_tier,
            ) {
                Ok(updated) => {
                    info!(
                        advisor = %advisor_id.0,
                        stale_score = current.current_score,
                        rebuilt_score,
                        "aggregate reconciled from ledger replay"
                    );
                    return Ok(updated);
                }
                // A writer landed between replay and swap; replay again so
                // the rebuilt sum includes its row.
                Err(MetricsError::VersionConflict) => continue,
                Err(other) => return Err(other.into()),
            }
        }

        Err(ReputationError::ConcurrencyExhausted { attempts })
    }
}
