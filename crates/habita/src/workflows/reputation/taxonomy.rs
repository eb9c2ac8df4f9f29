use serde::{Deserialize, Serialize};

use super::domain::EventKind;

/// Point deltas credited or debited per event kind.
///
/// The table is data so deployments can revise weights, but the delta an
/// event earned is recorded on its ledger row at write time; revising this
/// table never rewrites history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTaxonomy {
    pub sale_closed: i64,
    pub review_five_star: i64,
    pub fast_response: i64,
    pub no_show: i64,
    pub leak_attempt: i64,
}

impl Default for EventTaxonomy {
    fn default() -> Self {
        Self {
            sale_closed: 1_000,
            review_five_star: 200,
            fast_response: 10,
            no_show: -300,
            leak_attempt: -5_000,
        }
    }
}

impl EventTaxonomy {
    /// Pure lookup, total over every known kind.
    pub const fn points_for(&self, kind: EventKind) -> i64 {
        match kind {
            EventKind::SaleClosed => self.sale_closed,
            EventKind::ReviewFiveStar => self.review_five_star,
            EventKind::FastResponse => self.fast_response,
            EventKind::NoShow => self.no_show,
            EventKind::LeakAttempt => self.leak_attempt,
        }
    }
}
