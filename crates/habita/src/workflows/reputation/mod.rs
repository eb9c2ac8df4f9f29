//! Advisor reputation and tier ledger.
//!
//! Business events (closed sales, reviews, no-shows, policy violations) are
//! appended to an idempotent ledger and folded into a per-advisor aggregate
//! under an optimistic compare-and-swap discipline. The ledger is the source
//! of truth; the aggregate is a materialized view that can always be rebuilt
//! by replay.

pub mod aggregate;
pub mod domain;
pub mod ledger;
pub mod publisher;
pub mod replay;
pub mod router;
pub mod service;
pub mod taxonomy;
pub mod tier;

#[cfg(test)]
mod tests;

pub use aggregate::{AdvisorMetrics, MetricsError, MetricsStore, MetricsView};
pub use domain::{AdvisorId, ApplyOutcome, EventId, EventKind, EventSubmission, Tier};
pub use ledger::{
    AppendOutcome, LedgerEntryView, LedgerError, ReputationEvent, ReputationLedger,
};
pub use publisher::{AlertError, TierAlertPublisher, TierChangeAlert};
pub use replay::replayed_score;
pub use router::reputation_router;
pub use service::{ReputationError, ReputationService, ReputationSettings};
pub use taxonomy::EventTaxonomy;
pub use tier::TierSchedule;
