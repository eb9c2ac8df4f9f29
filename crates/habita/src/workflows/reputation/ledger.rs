use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AdvisorId, EventId, EventKind};

/// Immutable ledger row, the durable record of one applied business event.
///
/// `points_delta` is captured from the taxonomy at write time so later
/// taxonomy revisions never alter history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationEvent {
    pub id: EventId,
    pub advisor_id: AdvisorId,
    pub kind: EventKind,
    pub points_delta: i64,
    pub reason: String,
    pub idempotency_key: String,
    pub occurred_at: DateTime<Utc>,
}

impl ReputationEvent {
    pub fn audit_view(&self) -> LedgerEntryView {
        LedgerEntryView {
            id: self.id.clone(),
            event_kind: self.kind.label(),
            points_delta: self.points_delta,
            reason: self.reason.clone(),
            occurred_at: self.occurred_at,
        }
    }
}

/// Distinguishes a fresh append from an idempotent replay of an earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    Applied(ReputationEvent),
    AlreadyApplied(ReputationEvent),
}

/// Append-only storage abstraction for the event ledger.
///
/// Implementations own the `(advisor_id, idempotency_key)` uniqueness
/// invariant; it must hold across engine instances and restarts, which is
/// why it lives in the store rather than in engine-side locking.
pub trait ReputationLedger: Send + Sync {
    /// Insert a row, or surface the original row when the key was seen before.
    fn append(&self, event: ReputationEvent) -> Result<AppendOutcome, LedgerError>;

    /// Newest-first slice of an advisor's history for the activity feed.
    fn list_recent(
        &self,
        advisor_id: &AdvisorId,
        limit: usize,
    ) -> Result<Vec<ReputationEvent>, LedgerError>;

    /// Full oldest-first history, used by the aggregate rebuild path.
    fn replay(&self, advisor_id: &AdvisorId) -> Result<Vec<ReputationEvent>, LedgerError>;
}

/// Error enumeration for ledger failures.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Sanitized representation of a ledger row for the audit feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntryView {
    pub id: EventId,
    pub event_kind: &'static str,
    pub points_delta: i64,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}
