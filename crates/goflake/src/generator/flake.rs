use core::{cmp, time::Duration};
use std::sync::Arc;

use portable_atomic::{AtomicBool, AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    BitLayout, Decomposed, Error, GeneratorConfig, MonotonicClock, OverflowPolicy, Result,
    SequenceCounter, SequenceReset, Ticker, TimeSource,
};

/// No id has been issued yet. Packed `(timestamp, sequence)` pairs occupy at
/// most 63 bits, so they can never collide with this value.
const UNSET: u64 = u64::MAX;

#[derive(Debug)]
enum Sequencer {
    Interval {
        counter: Arc<SequenceCounter>,
        ticker: Ticker,
    },
    Timestamp {
        last: AtomicU64,
    },
}

/// A thread-safe Snowflake-style id generator.
///
/// Every id packs, from the most significant bit down: one unused bit, the
/// milliseconds since `epoch`, the datacenter id, the machine id and a
/// per-tick sequence number. The split is given by a [`BitLayout`].
///
/// Build one instance per (datacenter, machine) identity and share it by
/// reference (for instance behind an [`Arc`]) with every caller. All methods
/// take `&self`.
///
/// ## Sequencing
///
/// With [`SequenceReset::Interval`] (the default) a [`Ticker`] thread is
/// started by [`Generator::new`] and zeroes the sequence counter every tick.
/// It runs until [`Generator::shutdown`] is called or the generator is
/// dropped. With [`SequenceReset::Timestamp`] no thread is started. See
/// [`SequenceReset`] for the trade-off.
///
/// ## Example
///
/// ```
/// use goflake::{GeneratorConfig, Generator, MonotonicClock};
///
/// let config = GeneratorConfig::default()
///     .with_datacenter_id(3)
///     .with_machine_id(7);
/// let generator = Generator::new(config, MonotonicClock::new()).unwrap();
///
/// let id = generator.next_id().unwrap();
/// let parts = generator.decompose(id);
/// assert_eq!(parts.datacenter_id, 3);
/// assert_eq!(parts.machine_id, 7);
///
/// generator.shutdown();
/// assert!(generator.next_id().is_err());
/// ```
#[derive(Debug)]
pub struct Generator<T = MonotonicClock>
where
    T: TimeSource,
{
    datacenter_id: u64,
    machine_id: u64,
    epoch: u64,
    tick_interval: Duration,
    layout: BitLayout,
    overflow: OverflowPolicy,
    sequencer: Sequencer,
    stopped: AtomicBool,
    clock: T,
}

impl<T> Generator<T>
where
    T: TimeSource,
{
    /// Validates `config` and builds a generator reading time from `clock`.
    ///
    /// Under [`SequenceReset::Interval`] this also starts the background
    /// ticker, exactly once per generator.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidLayout`], [`Error::InvalidIdentity`] or
    ///   [`Error::InvalidTickInterval`] if the configuration is invalid (see
    ///   [`GeneratorConfig::validate`]).
    /// - [`Error::TickerSpawn`] if the ticker thread cannot be created.
    pub fn new(config: GeneratorConfig, clock: T) -> Result<Self> {
        config.validate()?;

        let sequencer = match config.reset {
            SequenceReset::Interval => {
                let counter = Arc::new(SequenceCounter::new());
                let ticker = Ticker::spawn(&counter, config.tick_interval)?;
                Sequencer::Interval { counter, ticker }
            }
            SequenceReset::Timestamp => Sequencer::Timestamp {
                last: AtomicU64::new(UNSET),
            },
        };

        #[cfg(feature = "tracing")]
        tracing::info!(
            datacenter_id = config.datacenter_id,
            machine_id = config.machine_id,
            epoch = config.epoch,
            layout = %config.layout,
            reset = ?config.reset,
            overflow = ?config.overflow,
            "generator started"
        );

        Ok(Self {
            datacenter_id: config.datacenter_id,
            machine_id: config.machine_id,
            epoch: config.epoch,
            tick_interval: config.tick_interval,
            layout: config.layout,
            overflow: config.overflow,
            sequencer,
            stopped: AtomicBool::new(false),
            clock,
        })
    }

    /// Generates the next id.
    ///
    /// Never returns a value with a truncated or misplaced field: anything
    /// that does not fit is reported as an error instead.
    ///
    /// # Errors
    ///
    /// - [`Error::SequenceExhausted`] when the tick has no sequence values
    ///   left and the policy is [`OverflowPolicy::Reject`].
    /// - [`Error::ClockSkew`] when the clock reads earlier than the epoch.
    /// - [`Error::TimestampOverflow`] when the time since the epoch no longer
    ///   fits in the time field.
    /// - [`Error::ClockRegressed`] when, under [`SequenceReset::Timestamp`]
    ///   with [`OverflowPolicy::Reject`], the clock reads earlier than the
    ///   last issued timestamp.
    /// - [`Error::Stopped`] after [`Self::shutdown`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<u64> {
        if self.is_stopped() {
            return Err(Error::Stopped);
        }

        match &self.sequencer {
            Sequencer::Interval { counter, .. } => self.next_interval_id(counter),
            Sequencer::Timestamp { last } => self.next_timestamp_id(last),
        }
    }

    fn next_interval_id(&self, counter: &SequenceCounter) -> Result<u64> {
        let max = self.layout.max_sequence();
        let sequence = loop {
            let sequence = counter.increment_and_get();
            if sequence <= max {
                break sequence;
            }
            match self.overflow {
                OverflowPolicy::Reject => return Err(Error::SequenceExhausted { max }),
                OverflowPolicy::Block => self.backoff()?,
            }
        };

        let timestamp = self.relative_millis()?;
        Ok(self
            .layout
            .pack(timestamp, self.datacenter_id, self.machine_id, sequence))
    }

    fn next_timestamp_id(&self, last: &AtomicU64) -> Result<u64> {
        let max = self.layout.max_sequence();
        let shift = u32::from(self.layout.sequence_bits());

        loop {
            let now = self.relative_millis()?;
            let current = last.load(Ordering::Acquire);

            let (timestamp, sequence) = if current == UNSET {
                (now, 0)
            } else {
                let last_ts = current >> shift;
                let last_seq = current & max;
                match now.cmp(&last_ts) {
                    cmp::Ordering::Greater => (now, 0),
                    cmp::Ordering::Equal if last_seq < max => (now, last_seq + 1),
                    cmp::Ordering::Equal => {
                        match self.overflow {
                            OverflowPolicy::Reject => return Err(Error::SequenceExhausted { max }),
                            OverflowPolicy::Block => self.backoff()?,
                        }
                        continue;
                    }
                    cmp::Ordering::Less => {
                        match self.overflow {
                            OverflowPolicy::Reject => {
                                return Err(Error::ClockRegressed { now, last: last_ts });
                            }
                            OverflowPolicy::Block => self.backoff()?,
                        }
                        continue;
                    }
                }
            };

            let next = (timestamp << shift) | sequence;
            if last
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Ok(self
                    .layout
                    .pack(timestamp, self.datacenter_id, self.machine_id, sequence));
            }
            // Another caller won the race; retry against its state.
            core::hint::spin_loop();
        }
    }

    fn relative_millis(&self) -> Result<u64> {
        let now = self.clock.current_millis();
        let relative = now.checked_sub(self.epoch).ok_or(Error::ClockSkew {
            now,
            epoch: self.epoch,
        })?;

        let max = self.layout.max_timestamp();
        if relative > max {
            return Err(Error::TimestampOverflow { relative, max });
        }
        Ok(relative)
    }

    #[cold]
    fn backoff(&self) -> Result<()> {
        if self.is_stopped() {
            return Err(Error::Stopped);
        }
        std::thread::yield_now();
        Ok(())
    }

    /// Stops the background ticker and waits for it to exit. Subsequent
    /// calls to [`Self::next_id`] return [`Error::Stopped`].
    ///
    /// Calling this more than once is a no-op. Dropping the generator has the
    /// same effect on the ticker.
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Sequencer::Interval { ticker, .. } = &self.sequencer {
            ticker.stop();
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            datacenter_id = self.datacenter_id,
            machine_id = self.machine_id,
            "generator shut down"
        );
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Returns `false` once [`Self::shutdown`] has been called.
    pub fn is_running(&self) -> bool {
        !self.is_stopped()
    }

    /// Splits an id produced by this generator back into its fields.
    pub const fn decompose(&self, id: u64) -> Decomposed {
        self.layout.decompose(id)
    }

    pub const fn layout(&self) -> &BitLayout {
        &self.layout
    }

    pub const fn datacenter_id(&self) -> u64 {
        self.datacenter_id
    }

    pub const fn machine_id(&self) -> u64 {
        self.machine_id
    }

    /// Milliseconds since the Unix epoch that timestamps are relative to.
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    pub const fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub const fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow
    }

    pub fn sequence_reset(&self) -> SequenceReset {
        match self.sequencer {
            Sequencer::Interval { .. } => SequenceReset::Interval,
            Sequencer::Timestamp { .. } => SequenceReset::Timestamp,
        }
    }

    pub const fn clock(&self) -> &T {
        &self.clock
    }
}
