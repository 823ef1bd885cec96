//! Unicorn/banana reward ledger.
//!
//! Rewards are paid out from two per-session streak counters:
//! - Every 10 correct answers since the last unicorn earn one unicorn
//! - Every 10 wrong answers since the last banana earn one banana
//! - Each newly earned banana takes one unicorn away, never below zero
//!
//! Unicorns are settled before bananas, so crossing both thresholds at once pays out
//! both currencies before the banana sacrifice applies.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ANSWERS_PER_REWARD: u32 = 10;

/// The single reward ledger of an installation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardLedger {
    pub unicorns: u32,
    pub bananas: u32,
    pub last_updated: DateTime<Utc>,
}

impl Default for RewardLedger {
    fn default() -> Self {
        Self {
            unicorns: 0,
            bananas: 0,
            last_updated: Utc::now(),
        }
    }
}

/// Per-session answer counters that feed the ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewardCounters {
    pub since_last_unicorn: u32,
    pub since_last_banana: u32,
}

/// What a single accrual pass changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Payout {
    pub unicorns_earned: u32,
    pub bananas_earned: u32,
    pub unicorns_sacrificed: u32,
}

impl Payout {
    pub fn is_empty(&self) -> bool {
        *self == Payout::default()
    }
}

impl RewardLedger {
    /// Converts full streaks into rewards. Calling it again without new answers only
    /// refreshes `last_updated`.
    pub fn accrue(&mut self, counters: &mut RewardCounters, now: DateTime<Utc>) -> Payout {
        let mut payout = Payout::default();

        while counters.since_last_unicorn >= ANSWERS_PER_REWARD {
            self.unicorns += 1;
            counters.since_last_unicorn -= ANSWERS_PER_REWARD;
            payout.unicorns_earned += 1;
        }

        while counters.since_last_banana >= ANSWERS_PER_REWARD {
            self.bananas += 1;
            counters.since_last_banana -= ANSWERS_PER_REWARD;
            payout.bananas_earned += 1;

            if self.unicorns > 0 {
                self.unicorns -= 1;
                payout.unicorns_sacrificed += 1;
            }
        }

        self.last_updated = now;
        payout
    }

    /// A wrong answer costs one unicorn right away.
    pub fn penalize_wrong_answer(&mut self, now: DateTime<Utc>) {
        self.unicorns = self.unicorns.saturating_sub(1);
        self.last_updated = now;
    }

    /// Solving a stored wrong answer gives back one banana.
    pub fn redeem_banana(&mut self, now: DateTime<Utc>) {
        self.bananas = self.bananas.saturating_sub(1);
        self.last_updated = now;
    }
}
