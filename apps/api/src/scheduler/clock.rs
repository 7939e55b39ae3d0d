//! Clock abstraction and the weekly trigger-instant computation.
//! Injected so scheduling logic is testable against a fixed clock.

use chrono::{DateTime, Datelike, Duration, FixedOffset, TimeZone, Utc, Weekday};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The next strictly-future instant matching `weekday` at `hour`:`minute`
/// in the given fixed reference offset.
pub fn next_weekly_instant(
    after: DateTime<Utc>,
    weekday: Weekday,
    hour: u32,
    minute: u32,
    offset: FixedOffset,
) -> DateTime<Utc> {
    let local = after.with_timezone(&offset);
    let mut date = local.date_naive();

    // Checking eight days covers the case where today's instant already
    // passed and the next match is the same weekday next week.
    for _ in 0..=7 {
        if date.weekday() == weekday {
            let candidate = date
                .and_hms_opt(hour, minute, 0)
                .and_then(|naive| offset.from_local_datetime(&naive).single());
            if let Some(instant) = candidate {
                let instant = instant.with_timezone(&Utc);
                if instant > after {
                    return instant;
                }
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    // Unreachable for any valid hour/minute; keeps the function total.
    after + Duration::weeks(1)
}
