use std::time::{SystemTime, UNIX_EPOCH};

use crate::TimeSource;

/// Reads the system wall clock on every call.
///
/// The wall clock can be adjusted backward (NTP, manual changes). Prefer
/// [`MonotonicClock`](crate::MonotonicClock) unless following the host clock
/// exactly matters more than never going backward.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        // A clock set before 1970 reads as 0 and surfaces as clock skew.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
            })
    }
}
