//! Rate limit bookkeeping for messaging accounts
//!
//! Each account counts sends against an hourly and a daily window. Windows
//! are rolling from their recorded start rather than aligned to the clock,
//! and every delivery attempt consumes a slot whether or not it succeeds.

use chrono::{DateTime, Duration, Utc};
use telereach_storage::models::Account;

/// Which counting windows a refresh reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterRefresh {
    pub hour_reset: bool,
    pub day_reset: bool,
}

impl CounterRefresh {
    /// Whether either window was reset
    pub fn any(self) -> bool {
        self.hour_reset || self.day_reset
    }
}

/// Reset expired counting windows on the in-memory account model
///
/// A window with no recorded start counts as expired, so an account with
/// missing bookkeeping starts a fresh window instead of staying blocked.
/// Callers persist the reset through the account store when either flag
/// comes back set.
pub fn refresh_windows(account: &mut Account, now: DateTime<Utc>) -> CounterRefresh {
    let mut refresh = CounterRefresh::default();

    let hour_expired = match account.last_hour_reset {
        Some(started) => now - started >= Duration::hours(1),
        None => true,
    };
    if hour_expired {
        account.sent_this_hour = 0;
        account.last_hour_reset = Some(now);
        refresh.hour_reset = true;
    }

    let day_expired = match account.last_day_reset {
        Some(started) => now - started >= Duration::days(1),
        None => true,
    };
    if day_expired {
        account.sent_today = 0;
        account.last_day_reset = Some(now);
        refresh.day_reset = true;
    }

    refresh
}

/// Whether the account can take one more send given work already in flight
///
/// In-flight attempts count against both windows so that an account picked
/// repeatedly within one run cannot overshoot its limits before the durable
/// counters catch up.
pub fn can_send(account: &Account, in_flight: u32) -> bool {
    let in_flight = i64::from(in_flight);
    i64::from(account.sent_this_hour) + in_flight < i64::from(account.max_per_hour)
        && i64::from(account.sent_today) + in_flight < i64::from(account.max_per_day)
}

/// Sends left in the hourly window after accounting for work in flight
///
/// May go negative when limits are not being respected; selection only uses
/// it for ordering.
pub fn hourly_headroom(account: &Account, in_flight: u32) -> i64 {
    i64::from(account.max_per_hour) - i64::from(account.sent_this_hour) - i64::from(in_flight)
}
