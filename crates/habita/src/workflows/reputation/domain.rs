use serde::{Deserialize, Serialize};

/// Identifier wrapper for advisor accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdvisorId(pub String);

/// Identifier wrapper for ledger rows, assigned at write time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

/// Business events the marketplace credits or debits reputation for.
///
/// The set is closed here; callers submit the kind as a string and anything
/// outside this set is rejected before any storage is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SaleClosed,
    ReviewFiveStar,
    FastResponse,
    NoShow,
    LeakAttempt,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::SaleClosed,
        EventKind::ReviewFiveStar,
        EventKind::FastResponse,
        EventKind::NoShow,
        EventKind::LeakAttempt,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            EventKind::SaleClosed => "sale_closed",
            EventKind::ReviewFiveStar => "review_five_star",
            EventKind::FastResponse => "fast_response",
            EventKind::NoShow => "no_show",
            EventKind::LeakAttempt => "leak_attempt",
        }
    }

    /// Parse a caller-supplied kind, tolerating case but nothing else.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sale_closed" => Some(EventKind::SaleClosed),
            "review_five_star" => Some(EventKind::ReviewFiveStar),
            "fast_response" => Some(EventKind::FastResponse),
            "no_show" => Some(EventKind::NoShow),
            "leak_attempt" => Some(EventKind::LeakAttempt),
            _ => None,
        }
    }
}

/// Reputation bands, ordered from entry level upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Rookie,
    Gold,
    Diamond,
}

impl Tier {
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Rookie => "rookie",
            Tier::Gold => "gold",
            Tier::Diamond => "diamond",
        }
    }
}

/// Inbound command describing one logical business occurrence.
///
/// The idempotency key is caller-supplied, typically derived from the
/// upstream business-transaction id, so retried submissions are safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSubmission {
    pub advisor_id: AdvisorId,
    pub event_kind: String,
    pub reason: String,
    pub idempotency_key: String,
}

/// Result of a successful (or idempotently replayed) apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyOutcome {
    pub advisor_id: AdvisorId,
    pub score: i64,
    pub tier: Tier,
    pub tier_changed: bool,
}
