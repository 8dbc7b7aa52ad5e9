use std::{
    sync::Arc,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use crate::TimeSource;

#[derive(Debug)]
struct Anchor {
    start: Instant,
    unix_millis: u64, // wall clock at `start`
}

/// A time source that never goes backward.
///
/// The wall clock is sampled once, at construction. Every later reading is
/// that sample plus the monotonic time elapsed since, measured with
/// [`Instant`]. Adjustments to the system clock (NTP steps, manual changes)
/// after construction are ignored, which is what keeps the sequence of
/// generated timestamps non-decreasing.
///
/// Clones share the same anchor, so every clone reports the same time.
///
/// # Example
///
/// ```
/// use goflake::{MonotonicClock, TimeSource};
///
/// let clock = MonotonicClock::new();
/// let first = clock.current_millis();
/// std::thread::sleep(std::time::Duration::from_millis(2));
/// assert!(clock.current_millis() >= first);
/// ```
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    anchor: Arc<Anchor>,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Anchors a new clock to the current system time.
    ///
    /// A system clock set before the Unix epoch anchors at 0.
    pub fn new() -> Self {
        let start = Instant::now();
        let unix_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
            });
        Self::with_anchor(start, unix_millis)
    }

    /// Anchors a clock so that `start` corresponds to `unix_millis`.
    pub fn with_anchor(start: Instant, unix_millis: u64) -> Self {
        Self {
            anchor: Arc::new(Anchor { start, unix_millis }),
        }
    }
}

impl TimeSource for MonotonicClock {
    fn current_millis(&self) -> u64 {
        let elapsed = u64::try_from(self.anchor.start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.anchor.unix_millis.saturating_add(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn readings_start_at_the_anchor_and_never_decrease() {
        let clock = MonotonicClock::with_anchor(Instant::now(), 5_000);
        let mut last = clock.current_millis();
        assert!(last >= 5_000);

        for _ in 0..1_000 {
            let now = clock.current_millis();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn advances_with_elapsed_time() {
        let clock = MonotonicClock::with_anchor(Instant::now(), 0);
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.current_millis() >= 5);
    }

    #[test]
    fn clones_share_the_anchor() {
        let clock = MonotonicClock::new();
        let clone = clock.clone();
        let a = clock.current_millis();
        let b = clone.current_millis();
        let c = clock.current_millis();
        assert!(a <= b && b <= c);
    }
}
