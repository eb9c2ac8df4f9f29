use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;

use habita::workflows::reputation::{
    AdvisorId, AdvisorMetrics, AlertError, AppendOutcome, LedgerError, MetricsError, MetricsStore,
    ReputationEvent, ReputationLedger, ReputationSettings, Tier, TierAlertPublisher,
    TierChangeAlert,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct LedgerRows {
    events: Vec<ReputationEvent>,
    index: HashMap<(AdvisorId, String), usize>,
}

/// In-process ledger. The unique `(advisor, idempotency key)` index is the
/// process-local stand-in for the unique constraint a database deployment
/// enforces.
#[derive(Default, Clone)]
pub(crate) struct InMemoryReputationLedger {
    rows: Arc<Mutex<LedgerRows>>,
}

impl ReputationLedger for InMemoryReputationLedger {
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

/// In-process versioned aggregate store.
#[derive(Default, Clone)]
pub(crate) struct InMemoryMetricsStore {
    rows: Arc<Mutex<HashMap<AdvisorId, AdvisorMetrics>>>,
}

impl MetricsStore for InMemoryMetricsStore {
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
        let row = guard
            .get_mut(advisor_id)
            .ok_or(MetricsError::VersionConflict)?;
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

/// Captures tier alerts so the demo (and tests) can assert on them; the
/// serve path also logs each one for operators.
#[derive(Default, Clone)]
pub(crate) struct InMemoryTierAlertPublisher {
    events: Arc<Mutex<Vec<TierChangeAlert>>>,
}

impl TierAlertPublisher for InMemoryTierAlertPublisher {
    fn publish(&self, alert: TierChangeAlert) -> Result<(), AlertError> {
        tracing::info!(
            advisor = %alert.advisor_id.0,
            from = alert.previous_tier.label(),
            to = alert.new_tier.label(),
            score = alert.score,
            "tier changed"
        );
        self.events.lock().expect("alert mutex poisoned").push(alert);
        Ok(())
    }
}

impl InMemoryTierAlertPublisher {
    pub(crate) fn events(&self) -> Vec<TierChangeAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

pub(crate) fn default_settings() -> ReputationSettings {
    ReputationSettings::default()
}
