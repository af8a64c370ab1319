//! Source of "today" for date-driven hold rules.

use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock (UTC).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock pinned to midnight of a given day.
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self { today: Mutex::new(today) }
    }

    pub fn set(&self, today: NaiveDate) {
        *self.today.lock().unwrap_or_else(|p| p.into_inner()) = today;
    }

    pub fn advance_days(&self, days: i64) {
        let mut guard = self.today.lock().unwrap_or_else(|p| p.into_inner());
        *guard += Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let today = *self.today.lock().unwrap_or_else(|p| p.into_inner());
        today.and_time(NaiveTime::MIN).and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new("2024-06-01".parse().unwrap());
        assert_eq!(clock.today(), "2024-06-01".parse::<NaiveDate>().unwrap());
        clock.advance_days(30);
        assert_eq!(clock.today(), "2024-07-01".parse::<NaiveDate>().unwrap());
        clock.set("2025-01-01".parse().unwrap());
        assert_eq!(clock.now().date_naive(), "2025-01-01".parse::<NaiveDate>().unwrap());
    }
}
