//! Countdown to the event target date, shown by the app and the bot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub is_active: bool,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub message: String,
}

impl Countdown {
    /// Time left until `target`; inactive once the target is reached
    pub fn until(event_name: &str, target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let left = target - now;
        if left.num_seconds() <= 0 {
            return Self {
                is_active: false,
                days: 0,
                hours: 0,
                minutes: 0,
                message: format!("It's {}!", event_name),
            };
        }

        let days = left.num_days();
        let hours = left.num_hours() % 24;
        let minutes = left.num_minutes() % 60;

        Self {
            is_active: true,
            days,
            hours,
            minutes,
            message: format!("{} in {}d {}h {}m", event_name, days, hours, minutes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_countdown_active() {
        let target = Utc.with_ymd_and_hms(2026, 1, 21, 0, 0, 0).unwrap();
        let now = target - Duration::days(2) - Duration::hours(5) - Duration::minutes(7);

        let c = Countdown::until("Launch", target, now);
        assert!(c.is_active);
        assert_eq!((c.days, c.hours, c.minutes), (2, 5, 7));
        assert_eq!(c.message, "Launch in 2d 5h 7m");
    }

    #[test]
    fn test_countdown_reached() {
        let target = Utc.with_ymd_and_hms(2026, 1, 21, 0, 0, 0).unwrap();
        let c = Countdown::until("Launch", target, target);
        assert!(!c.is_active);
        assert_eq!(c.message, "It's Launch!");
    }
}
