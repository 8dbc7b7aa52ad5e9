/// Epoch used when none is configured: Thursday, July 28, 2022 18:57:35.453
/// UTC, in milliseconds since the Unix epoch.
pub const DEFAULT_EPOCH: u64 = 1_659_034_655_453;

/// A source of wall-clock time in milliseconds since the Unix epoch.
///
/// The generator subtracts its configured epoch from this value, so
/// implementations report absolute time. Correctness relies on the reading
/// never decreasing; [`MonotonicClock`](crate::MonotonicClock) guarantees
/// that, [`SystemClock`](crate::SystemClock) does not.
///
/// This abstraction lets tests plug in a fixed or stepped clock.
///
/// # Example
///
/// ```
/// use goflake::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}
