use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::workflows::reputation::aggregate::{AdvisorMetrics, MetricsError, MetricsStore};
use crate::workflows::reputation::domain::{AdvisorId, EventSubmission, Tier};
use crate::workflows::reputation::ledger::{
    AppendOutcome, LedgerError, ReputationEvent, ReputationLedger,
};
use crate::workflows::reputation::publisher::{AlertError, TierAlertPublisher, TierChangeAlert};
use crate::workflows::reputation::service::{ReputationService, ReputationSettings};

#[derive(Default)]
struct LedgerRows {
    events: Vec<ReputationEvent>,
    index: HashMap<(AdvisorId, String), usize>,
}

/// In-memory ledger enforcing the unique `(advisor, key)` constraint.
#[derive(Default)]
pub(super) struct MemoryLedger {
    rows: Mutex<LedgerRows>,
}

impl MemoryLedger {
    pub(super) fn events(&self) -> Vec<ReputationEvent> {
        self.rows.lock().expect("ledger mutex poisoned").events.clone()
    }

    pub(super) fn len(&self) -> usize {
        self.rows.lock().expect("ledger mutex poisoned").events.len()
    }
}

impl ReputationLedger for MemoryLedger {
    fn append(&self, event: ReputationEvent) -> Result<AppendOutcome, LedgerError> {
        let mut guard = self.rows.lock().expect("ledger mutex poisoned");
        let key = (event.advisor_id.clone(), event.idempotency_key.clone());
        if let Some(&at) = guard.index.get(&key) {
            return Ok(AppendOutcome::AlreadyApplied(guard.events[at].clone()));
        }
        let at = guard.events.len();
        guard.index.insert(key, at);
        guard.events.push(event.clone());
        Ok(AppendOutcome::Applied(event))
    }

    fn list_recent(
        &self,
        advisor_id: &AdvisorId,
        limit: usize,
    ) -> Result<Vec<ReputationEvent>, LedgerError> {
        let guard = self.rows.lock().expect("ledger mutex poisoned");
        Ok(guard
            .events
            .iter()
            .filter(|event| &event.advisor_id == advisor_id)
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    fn replay(&self, advisor_id: &AdvisorId) -> Result<Vec<ReputationEvent>, LedgerError> {
        let guard = self.rows.lock().expect("ledger mutex poisoned");
        Ok(guard
            .events
            .iter()
            .filter(|event| &event.advisor_id == advisor_id)
            .cloned()
            .collect())
    }
}

/// Ledger double that reports the backing store as unreachable.
pub(super) struct UnavailableLedger;

impl ReputationLedger for UnavailableLedger {
    fn append(&self, _event: ReputationEvent) -> Result<AppendOutcome, LedgerError> {
        Err(LedgerError::Unavailable("ledger offline".to_string()))
    }

    fn list_recent(
        &self,
        _advisor_id: &AdvisorId,
        _limit: usize,
    ) -> Result<Vec<ReputationEvent>, LedgerError> {
        Err(LedgerError::Unavailable("ledger offline".to_string()))
    }

    fn replay(&self, _advisor_id: &AdvisorId) -> Result<Vec<ReputationEvent>, LedgerError> {
        Err(LedgerError::Unavailable("ledger offline".to_string()))
    }
}

/// In-memory versioned aggregate store.
#[derive(Default)]
pub(super) struct MemoryMetrics {
    rows: Mutex<HashMap<AdvisorId, AdvisorMetrics>>,
}

impl MemoryMetrics {
    pub(super) fn snapshot(&self, advisor_id: &AdvisorId) -> Option<AdvisorMetrics> {
        self.rows
            .lock()
            .expect("metrics mutex poisoned")
            .get(advisor_id)
            .cloned()
    }

    pub(super) fn len(&self) -> usize {
        self.rows.lock().expect("metrics mutex poisoned").len()
    }
}

impl MetricsStore for MemoryMetrics {
    fn get_or_init(&self, advisor_id: &AdvisorId) -> Result<AdvisorMetrics, MetricsError> {
        let mut guard = self.rows.lock().expect("metrics mutex poisoned");
        let row = guard
            .entry(advisor_id.clone())
            .or_insert_with(|| AdvisorMetrics::initial(advisor_id.clone(), Utc::now()));
        Ok(row.clone())
    }

    fn compare_and_swap(
        &self,
        advisor_id: &AdvisorId,
        expected_version: u64,
        new_score: i64,
        new_tier: Tier,
    ) -> Result<AdvisorMetrics, MetricsError> {
        let mut guard = self.rows.lock().expect("metrics mutex poisoned");
        let row = guard.get_mut(advisor_id).ok_or(MetricsError::VersionConflict)?;
        if row.version != expected_version {
            return Err(MetricsError::VersionConflict);
        }
        row.current_score = new_score;
        row.current_tier = new_tier;
        row.version += 1;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }
}

/// Aggregate double whose swap never succeeds.
pub(super) struct ContentiousMetrics;

impl MetricsStore for ContentiousMetrics {
    fn get_or_init(&self, advisor_id: &AdvisorId) -> Result<AdvisorMetrics, MetricsError> {
        Ok(AdvisorMetrics::initial(advisor_id.clone(), Utc::now()))
    }

    fn compare_and_swap(
        &self,
        _advisor_id: &AdvisorId,
        _expected_version: u64,
        _new_score: i64,
        _new_tier: Tier,
    ) -> Result<AdvisorMetrics, MetricsError> {
        Err(MetricsError::VersionConflict)
    }
}

/// Aggregate double that conflicts a fixed number of times before behaving.
pub(super) struct FlakyMetrics {
    inner: MemoryMetrics,
    conflicts_left: AtomicU32,
}

impl FlakyMetrics {
    pub(super) fn new(conflicts: u32) -> Self {
        Self {
            inner: MemoryMetrics::default(),
            conflicts_left: AtomicU32::new(conflicts),
        }
    }
}

impl MetricsStore for FlakyMetrics {
    fn get_or_init(&self, advisor_id: &AdvisorId) -> Result<AdvisorMetrics, MetricsError> {
        self.inner.get_or_init(advisor_id)
    }

    fn compare_and_swap(
        &self,
        advisor_id: &AdvisorId,
        expected_version: u64,
        new_score: i64,
        new_tier: Tier,
    ) -> Result<AdvisorMetrics, MetricsError> {
        if self
            .conflicts_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok()
        {
            return Err(MetricsError::VersionConflict);
        }
        self.inner
            .compare_and_swap(advisor_id, expected_version, new_score, new_tier)
    }
}

/// Alert recorder.
#[derive(Default)]
pub(super) struct MemoryAlerts {
    events: Mutex<Vec<TierChangeAlert>>,
}

impl MemoryAlerts {
    pub(super) fn events(&self) -> Vec<TierChangeAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl TierAlertPublisher for MemoryAlerts {
    fn publish(&self, alert: TierChangeAlert) -> Result<(), AlertError> {
        self.events.lock().expect("alert mutex poisoned").push(alert);
        Ok(())
    }
}

/// Alert double with a dead transport.
pub(super) struct FailingAlerts;

impl TierAlertPublisher for FailingAlerts {
    fn publish(&self, _alert: TierChangeAlert) -> Result<(), AlertError> {
        Err(AlertError::Transport("alerts offline".to_string()))
    }
}

pub(super) fn quick_settings() -> ReputationSettings {
    ReputationSettings {
        swap_backoff: Duration::from_millis(1),
        ..ReputationSettings::default()
    }
}

pub(super) fn contended_settings() -> ReputationSettings {
    ReputationSettings {
        max_swap_attempts: 64,
        swap_backoff: Duration::from_micros(200),
        ..ReputationSettings::default()
    }
}

pub(super) fn submission(advisor: &str, kind: &str, key: &str) -> EventSubmission {
    EventSubmission {
        advisor_id: AdvisorId(advisor.to_string()),
        event_kind: kind.to_string(),
        reason: format!("{kind} recorded by upstream workflow"),
        idempotency_key: key.to_string(),
    }
}

/// Apply a scripted sequence, panicking on any rejection.
pub(super) fn seed<L, M, P>(
    service: &ReputationService<L, M, P>,
    advisor: &str,
    entries: &[(&str, &str)],
) where
    L: ReputationLedger + 'static,
    M: MetricsStore + 'static,
    P: TierAlertPublisher + 'static,
{
    for (kind, key) in entries {
        service
            .apply(submission(advisor, kind, key), None)
            .expect("seed event applies");
    }
}

pub(super) fn memory_service(
) -> ReputationService<MemoryLedger, MemoryMetrics, MemoryAlerts> {
    ReputationService::new(
        Arc::new(MemoryLedger::default()),
        Arc::new(MemoryMetrics::default()),
        Arc::new(MemoryAlerts::default()),
        quick_settings(),
    )
}

pub(super) async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body reads");
    serde_json::from_slice(&bytes).expect("response body is json")
}
