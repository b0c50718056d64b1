//! Injectable clock and calendar-day helpers.
//!
//! Every day-level comparison in the crate goes through one normalization:
//! the `Clock` maps "now" to a local calendar date once, and everything
//! downstream works in `NaiveDate`.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, Utc};

/// Source of the current instant and the current local calendar day.
pub trait Clock {
    /// Current timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date, truncated to local midnight.
    fn today(&self) -> NaiveDate;
}

/// Wall clock backed by the host time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Hand-driven clock for deterministic tests.
///
/// Clones share the same instant, so a clock handed to the review engine can
/// still be advanced from the outside.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    /// Clock pinned to midnight of the given day.
    pub fn at_midnight(day: NaiveDate) -> Self {
        Self::starting_at(day.and_time(NaiveTime::MIN).and_utc())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance_days(&self, days: i64) {
        self.now.set(self.now.get() + Duration::days(days));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn today(&self) -> NaiveDate {
        self.now.get().date_naive()
    }
}

/// Inclusive Sunday-to-Saturday week containing `day`.
pub fn week_of(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = day - Duration::days(day.weekday().num_days_from_sunday() as i64);
    (start, start + Duration::days(6))
}

/// Inclusive first-to-last-day month containing `day`.
pub fn month_of(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(day.year(), day.month(), 1).unwrap_or(day);
    let next_month = if day.month() == 12 {
        NaiveDate::from_ymd_opt(day.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(day.year(), day.month() + 1, 1)
    };
    let end = next_month
        .and_then(|d| d.pred_opt())
        .unwrap_or(day);
    (start, end)
}
