use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, warn};

use super::aggregate::{AdvisorMetrics, MetricsError, MetricsStore};
use super::domain::{AdvisorId, ApplyOutcome, EventId, EventKind, EventSubmission, Tier};
use super::ledger::{AppendOutcome, LedgerError, ReputationEvent, ReputationLedger};
use super::publisher::{AlertError, TierAlertPublisher, TierChangeAlert};
use super::taxonomy::EventTaxonomy;
use super::tier::TierSchedule;

/// Tuning knobs for the engine: the business tables plus the bounds of the
/// optimistic update loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReputationSettings {
    pub taxonomy: EventTaxonomy,
    pub tiers: TierSchedule,
    pub max_swap_attempts: u32,
    pub swap_backoff: Duration,
}

impl Default for ReputationSettings {
    fn default() -> Self {
        Self {
            taxonomy: EventTaxonomy::default(),
            tiers: TierSchedule::default(),
            max_swap_attempts: 5,
            swap_backoff: Duration::from_millis(2),
        }
    }
}

static EVENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_event_id() -> EventId {
    let id = EVENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EventId(format!("evt-{id:06}"))
}

/// Engine composing the ledger, the aggregate store, and the alert hook.
///
/// Correctness rests on two store-level invariants: the ledger's unique
/// `(advisor_id, idempotency_key)` constraint gives at-most-once point
/// application under caller retries, and the aggregate's compare-and-swap
/// version discipline gives lost-update-free read-modify-write per advisor
/// with no coordination across advisors. The ledger row is always written
/// first and never rolled back, so the aggregate can be rebuilt from replay
/// whenever an update is interrupted.
pub struct ReputationService<L, M, P> {
    pub(super) ledger: Arc<L>,
    pub(super) metrics: Arc<M>,
    alerts: Arc<P>,
    pub(super) settings: ReputationSettings,
}

impl<L, M, P> ReputationService<L, M, P>
where
    L: ReputationLedger + 'static,
    M: MetricsStore + 'static,
    P: TierAlertPublisher + 'static,
{
    pub fn new(
        ledger: Arc<L>,
        metrics: Arc<M>,
        alerts: Arc<P>,
        settings: ReputationSettings,
    ) -> Self {
        Self {
            ledger,
            metrics,
            alerts,
            settings,
        }
    }

    pub fn settings(&self) -> &ReputationSettings {
        &self.settings
    }

    /// Apply one business event to an advisor's reputation.
    ///
    /// Validation failures are rejected before any storage round trip. A
    /// resubmitted idempotency key short-circuits to the currently visible
    /// aggregate with `tier_changed = false` rather than double-counting.
    /// The optional deadline bounds only the aggregate settle loop; an
    /// already-appended ledger row stays durable on `Timeout`.
    pub fn apply(
        &self,
        submission: EventSubmission,
        deadline: Option<Instant>,
    ) -> Result<ApplyOutcome, ReputationError> {
        let kind = EventKind::parse(&submission.event_kind)
            .ok_or_else(|| ReputationError::InvalidEventKind(submission.event_kind.clone()))?;
        let reason = submission.reason.trim();
        if reason.is_empty() {
            return Err(ReputationError::InvalidReason);
        }

        let event = ReputationEvent {
            id: next_event_id(),
            advisor_id: submission.advisor_id.clone(),
            kind,
            points_delta: self.settings.taxonomy.points_for(kind),
            reason: reason.to_string(),
            idempotency_key: submission.idempotency_key,
            occurred_at: Utc::now(),
        };

        match self.ledger.append(event)? {
            AppendOutcome::AlreadyApplied(existing) => {
                debug!(
                    advisor = %existing.advisor_id.0,
                    key = %existing.idempotency_key,
                    "idempotent replay, returning current standing"
                );
                let current = self.metrics.get_or_init(&existing.advisor_id)?;
                Ok(ApplyOutcome {
                    advisor_id: current.advisor_id.clone(),
                    score: current.current_score,
                    tier: current.current_tier,
                    tier_changed: false,
                })
            }
            AppendOutcome::Applied(event) => self.settle(&event, deadline),
        }
    }

    /// Bounded optimistic read-modify-write against the advisor's aggregate.
    fn settle(
        &self,
        event: &ReputationEvent,
        deadline: Option<Instant>,
    ) -> Result<ApplyOutcome, ReputationError> {
        let attempts = self.settings.max_swap_attempts.max(1);

        for attempt in 1..=attempts {
            if deadline_expired(deadline) {
                return Err(ReputationError::Timeout);
            }

            let current = self.metrics.get_or_init(&event.advisor_id)?;
            let new_score = current.current_score + event.points_delta;
            let new_tier = self.settings.tiers.classify(new_score);

            match self.metrics.compare_and_swap(
                &event.advisor_id,
                current.version,
                new_score,
                new_tier,
            ) {
                Ok(updated) => {
                    let tier_changed = new_tier != current.current_tier;
                    if tier_changed {
                        self.announce_tier_change(&updated, current.current_tier);
                    }
                    return Ok(ApplyOutcome {
                        advisor_id: updated.advisor_id.clone(),
                        score: updated.current_score,
                        tier: updated.current_tier,
                        tier_changed,
                    });
                }
                Err(MetricsError::VersionConflict) => {
                    let pause = self.settings.swap_backoff * attempt;
                    if would_overrun(deadline, pause) {
                        return Err(ReputationError::Timeout);
                    }
                    debug!(
                        advisor = %event.advisor_id.0,
                        attempt,
                        "aggregate contended, retrying"
                    );
                    std::thread::sleep(pause);
                }
                Err(other) => return Err(other.into()),
            }
        }

        // The ledger row stays durable; reconcile can finish the sum later.
        Err(ReputationError::ConcurrencyExhausted { attempts })
    }

    fn announce_tier_change(&self, updated: &AdvisorMetrics, previous_tier: Tier) {
        let alert = TierChangeAlert {
            advisor_id: updated.advisor_id.clone(),
            previous_tier,
            new_tier: updated.current_tier,
            score: updated.current_score,
        };
        if let Err(AlertError::Transport(detail)) = self.alerts.publish(alert) {
            warn!(
                advisor = %updated.advisor_id.0,
                %detail,
                "tier alert publish failed, continuing"
            );
        }
    }

    /// Current standing for an advisor, lazily zero-initialized.
    pub fn metrics(&self, advisor_id: &AdvisorId) -> Result<AdvisorMetrics, ReputationError> {
        Ok(self.metrics.get_or_init(advisor_id)?)
    }

    /// Newest-first activity slice for the audit feed.
    pub fn activity(
        &self,
        advisor_id: &AdvisorId,
        limit: usize,
    ) -> Result<Vec<ReputationEvent>, ReputationError> {
        Ok(self.ledger.list_recent(advisor_id, limit)?)
    }
}

fn deadline_expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|at| Instant::now() >= at)
}

fn would_overrun(deadline: Option<Instant>, pause: Duration) -> bool {
    deadline.is_some_and(|at| {
        Instant::now()
            .checked_add(pause)
            .map_or(true, |resumed| resumed >= at)
    })
}

/// Error raised by the reputation engine.
#[derive(Debug, thiserror::Error)]
pub enum ReputationError {
    #[error("unknown event kind `{0}`")]
    InvalidEventKind(String),
    #[error("event reason must not be empty")]
    InvalidReason,
    #[error("aggregate update still contended after {attempts} attempts")]
    ConcurrencyExhausted { attempts: u32 },
    #[error("deadline expired before the aggregate update completed")]
    Timeout,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}
