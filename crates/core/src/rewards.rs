//! # Rewards Module
//!
//! Reward tables: join bonus policy and referral milestones.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Flat join bonus granted to every new user
pub const JOIN_BONUS_FLAT: i64 = 1200;

/// How much a user earns for claiming the join bonus.
///
/// Exactly one policy is active per deployment; it is chosen in the
/// `[rewards]` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum JoinBonusPolicy {
    /// Same amount for everyone
    Flat { amount: i64 },
    /// `initial` before/at `event_start`, minus `step` per elapsed day,
    /// never below `floor`
    Decaying {
        event_start: NaiveDate,
        initial: i64,
        step: i64,
        floor: i64,
    },
}

impl Default for JoinBonusPolicy {
    fn default() -> Self {
        JoinBonusPolicy::Flat {
            amount: JOIN_BONUS_FLAT,
        }
    }
}

impl JoinBonusPolicy {
    /// Bonus for a claim made at `now`
    pub fn bonus_at(&self, now: DateTime<Utc>) -> i64 {
        match self {
            JoinBonusPolicy::Flat { amount } => *amount,
            JoinBonusPolicy::Decaying {
                event_start,
                initial,
                step,
                floor,
            } => {
                let days = (now.date_naive() - *event_start).num_days();
                if days < 0 {
                    return *initial;
                }
                (initial - days * step).max(*floor)
            }
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        match self {
            JoinBonusPolicy::Flat { amount } if *amount <= 0 => Err(CoreError::Validation(
                "join bonus amount must be positive".to_string(),
            )),
            JoinBonusPolicy::Decaying {
                initial, step, floor, ..
            } if *floor <= 0 || *step < 0 || initial < floor => Err(CoreError::Validation(
                "decaying join bonus needs 0 < floor <= initial and step >= 0".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Referral-count threshold unlocking a one-time reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Milestone {
    One,
    Three,
    Five,
}

impl Milestone {
    pub const ALL: [Milestone; 3] = [Milestone::One, Milestone::Three, Milestone::Five];

    /// Referrals required
    pub fn threshold(&self) -> u32 {
        match self {
            Milestone::One => 1,
            Milestone::Three => 3,
            Milestone::Five => 5,
        }
    }

    /// Points credited on claim
    pub fn reward(&self) -> i64 {
        match self {
            Milestone::One => 1000,
            Milestone::Three => 5000,
            Milestone::Five => 10000,
        }
    }

    pub fn is_reached(&self, referral_count: i64) -> bool {
        referral_count >= self.threshold() as i64
    }

    /// Milestones reached by `referral_count` and not yet in `claimed`
    pub fn claimable(referral_count: i64, claimed: &[Milestone]) -> Vec<Milestone> {
        Self::ALL
            .into_iter()
            .filter(|m| m.is_reached(referral_count) && !claimed.contains(m))
            .collect()
    }
}

impl TryFrom<i64> for Milestone {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Milestone::One),
            3 => Ok(Milestone::Three),
            5 => Ok(Milestone::Five),
            other => Err(CoreError::InvalidMilestone(other)),
        }
    }
}

impl From<Milestone> for i64 {
    fn from(m: Milestone) -> Self {
        m.threshold() as i64
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.threshold())
    }
}
