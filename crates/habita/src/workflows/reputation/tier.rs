use serde::{Deserialize, Serialize};

use super::domain::Tier;

/// Ordered tier thresholds, evaluated top-down as half-open bands.
///
/// Single point of change if the marketplace revises tier boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSchedule {
    pub diamond_floor: i64,
    pub gold_floor: i64,
}

impl Default for TierSchedule {
    fn default() -> Self {
        Self {
            diamond_floor: 10_000,
            gold_floor: 5_000,
        }
    }
}

impl TierSchedule {
    /// Classify a cumulative score. Total over all of `i64`; negative
    /// scores land in the entry band.
    pub const fn classify(&self, score: i64) -> Tier {
        if score >= self.diamond_floor {
            Tier::Diamond
        } else if score >= self.gold_floor {
            Tier::Gold
        } else {
            Tier::Rookie
        }
    }
}
