use portable_atomic::{AtomicU64, Ordering};

/// The per-tick sequence counter shared by every caller of
/// [`Generator::next_id`](crate::Generator::next_id).
///
/// Increments are a single lock-free `fetch_add`, so concurrent callers each
/// observe a distinct value and nobody waits on anybody else. The counter is
/// only ever set back to zero by the [`Ticker`](crate::Ticker).
///
/// The value is 64 bits wide even though a sequence field is much narrower:
/// callers that overshoot the field keep incrementing until the next reset,
/// and a 64-bit counter cannot wrap back into the valid range in the
/// meantime.
#[derive(Debug)]
pub struct SequenceCounter {
    #[cfg(feature = "cache-padded")]
    value: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    value: AtomicU64,
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceCounter {
    /// Creates a counter starting at zero.
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            value: crossbeam_utils::CachePadded::new(AtomicU64::new(0)),
            #[cfg(not(feature = "cache-padded"))]
            value: AtomicU64::new(0),
        }
    }

    /// Increments the counter and returns the value it held before, so the
    /// first caller after a reset gets `0`.
    pub fn increment_and_get(&self) -> u64 {
        self.value.fetch_add(1, Ordering::Relaxed)
    }

    /// Sets the counter back to zero.
    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }

    /// The value the next [`Self::increment_and_get`] would return.
    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}
