//! # Streak Module
//!
//! Daily check-in streak state machine.
//!
//! The persisted pair `(last_checkin, streak_day)` is the whole state.
//! Transition table for a check-in at `now`:
//!
//! | last_checkin | elapsed since last       | result                 |
//! |--------------|--------------------------|------------------------|
//! | none         | -                        | day 1 (`Started`)      |
//! | some         | `< 24h`                  | `TooSoon`              |
//! | some         | `24h ..= 48h`            | day + 1 (`Continued`)  |
//! | some         | `> 48h`                  | day 1 (`Reset`)        |

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Minimum gap between two check-ins
pub const CHECKIN_COOLDOWN_HOURS: i64 = 24;

/// Longest gap that still continues the streak (inclusive)
pub const STREAK_WINDOW_HOURS: i64 = 48;

/// Award for day 1 of a streak
pub const CHECKIN_BASE_REWARD: i64 = 100;

/// Award stops doubling after this streak day (100 * 2^7 = 12800)
pub const MAX_DOUBLING_DAY: u32 = 8;

/// How a check-in moved the streak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakTransition {
    /// First check-in ever
    Started,
    /// Within the 24h..=48h window
    Continued,
    /// Gap exceeded 48h
    Reset,
}

/// Stored streak state of one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub last_checkin: Option<DateTime<Utc>>,
    pub streak_day: u32,
}

/// Outcome of a successful check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIn {
    pub transition: StreakTransition,
    pub streak_day: u32,
    pub award: i64,
    pub at: DateTime<Utc>,
}

impl StreakState {
    pub fn new(last_checkin: Option<DateTime<Utc>>, streak_day: u32) -> Self {
        Self {
            last_checkin,
            streak_day,
        }
    }

    /// Apply a check-in at `now`.
    ///
    /// Returns `TooSoon` with the remaining wait (rounded up to whole
    /// seconds) when the cooldown has not elapsed.
    pub fn check_in(&self, now: DateTime<Utc>) -> CoreResult<CheckIn> {
        let (transition, streak_day) = match self.last_checkin {
            None => (StreakTransition::Started, 1),
            Some(last) => {
                let elapsed = now - last;
                let cooldown = Duration::hours(CHECKIN_COOLDOWN_HOURS);

                if elapsed < cooldown {
                    let remaining_ms = (cooldown - elapsed).num_milliseconds();
                    return Err(CoreError::TooSoon {
                        remaining_secs: (remaining_ms + 999) / 1000,
                    });
                }

                if elapsed > Duration::hours(STREAK_WINDOW_HOURS) {
                    (StreakTransition::Reset, 1)
                } else {
                    (StreakTransition::Continued, self.streak_day + 1)
                }
            }
        };

        Ok(CheckIn {
            transition,
            streak_day,
            award: checkin_reward(streak_day),
            at: now,
        })
    }

    /// When the next check-in becomes possible
    pub fn next_available_at(&self) -> Option<DateTime<Utc>> {
        self.last_checkin
            .map(|last| last + Duration::hours(CHECKIN_COOLDOWN_HOURS))
    }
}

/// Award for a given streak day: `100 * 2^(day - 1)`, capped at day 8.
pub fn checkin_reward(streak_day: u32) -> i64 {
    let day = streak_day.clamp(1, MAX_DOUBLING_DAY);
    CHECKIN_BASE_REWARD << (day - 1)
}
