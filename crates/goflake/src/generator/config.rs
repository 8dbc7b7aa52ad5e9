use core::time::Duration;

use crate::{BitLayout, DEFAULT_EPOCH, Error, IdentityField, Result, Ticker};

/// How the sequence returns to zero for a new tick.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SequenceReset {
    /// A background [`Ticker`](crate::Ticker) zeroes a shared counter every
    /// tick interval, whether or not the clock has moved.
    ///
    /// The reset is not tied to the timestamps actually embedded in ids. If
    /// the ticker fires late, or fires while the clock still reads the same
    /// millisecond, two ids can end up with the same `(timestamp, sequence)`
    /// pair. Use [`SequenceReset::Timestamp`] when that is unacceptable.
    #[default]
    Interval,

    /// Every call compares the current timestamp with the last one issued: a
    /// newer timestamp restarts the sequence at zero, the same timestamp
    /// increments it. Ids are unique as long as the clock never goes
    /// backward, which is reported as [`Error::ClockRegressed`]. No
    /// background thread is started and the tick interval is not used.
    Timestamp,
}

/// What to do when a tick runs out of sequence values.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OverflowPolicy {
    /// Fail the call with [`Error::SequenceExhausted`].
    #[default]
    Reject,

    /// Yield the thread until the next tick and retry. With
    /// [`SequenceReset::Timestamp`] this also waits out a clock that went
    /// backward instead of returning [`Error::ClockRegressed`].
    Block,
}

/// Everything needed to build a [`Generator`](crate::Generator).
///
/// Defaults: datacenter `0`, machine `0`, epoch [`DEFAULT_EPOCH`], a 1 ms
/// tick, [`BitLayout::DEFAULT`], [`SequenceReset::Interval`] and
/// [`OverflowPolicy::Reject`].
///
/// # Example
///
/// ```
/// use goflake::{BitLayout, GeneratorConfig, OverflowPolicy};
///
/// let config = GeneratorConfig::default()
///     .with_datacenter_id(3)
///     .with_machine_id(7)
///     .with_layout(BitLayout::new(5, 5, 41, 12).unwrap())
///     .with_overflow(OverflowPolicy::Block);
/// assert!(config.validate().is_ok());
///
/// assert!(config.with_machine_id(32).validate().is_err());
/// ```
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeneratorConfig {
    pub datacenter_id: u64,
    pub machine_id: u64,
    /// Milliseconds since the Unix epoch subtracted from every timestamp.
    pub epoch: u64,
    #[cfg_attr(feature = "serde", serde(rename = "tick_ms", with = "millis"))]
    pub tick_interval: Duration,
    #[cfg_attr(feature = "serde", serde(rename = "bits_len"))]
    pub layout: BitLayout,
    #[cfg_attr(feature = "serde", serde(rename = "sequence_reset"))]
    pub reset: SequenceReset,
    pub overflow: OverflowPolicy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            datacenter_id: 0,
            machine_id: 0,
            epoch: DEFAULT_EPOCH,
            tick_interval: Duration::from_millis(1),
            layout: BitLayout::DEFAULT,
            reset: SequenceReset::default(),
            overflow: OverflowPolicy::default(),
        }
    }
}

impl GeneratorConfig {
    #[must_use]
    pub const fn with_datacenter_id(mut self, datacenter_id: u64) -> Self {
        self.datacenter_id = datacenter_id;
        self
    }

    #[must_use]
    pub const fn with_machine_id(mut self, machine_id: u64) -> Self {
        self.machine_id = machine_id;
        self
    }

    #[must_use]
    pub const fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    #[must_use]
    pub const fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    #[must_use]
    pub const fn with_layout(mut self, layout: BitLayout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub const fn with_reset(mut self, reset: SequenceReset) -> Self {
        self.reset = reset;
        self
    }

    #[must_use]
    pub const fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Checks the configuration without starting anything.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidLayout`] if the layout does not sum to 63 bits.
    /// - [`Error::InvalidIdentity`] if the datacenter or machine id does not
    ///   fit its field. Oversized values are rejected, never truncated.
    /// - [`Error::InvalidTickInterval`] under [`SequenceReset::Interval`] for
    ///   a zero tick, or one too large for the ticker to schedule.
    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;

        let max = self.layout.max_datacenter_id();
        if self.datacenter_id > max {
            return Err(Error::InvalidIdentity {
                field: IdentityField::DatacenterId,
                value: self.datacenter_id,
                max,
            });
        }

        let max = self.layout.max_machine_id();
        if self.machine_id > max {
            return Err(Error::InvalidIdentity {
                field: IdentityField::MachineId,
                value: self.machine_id,
                max,
            });
        }

        if self.reset == SequenceReset::Interval && !Ticker::accepts_interval(self.tick_interval) {
            return Err(Error::InvalidTickInterval);
        }

        Ok(())
    }
}

#[cfg(feature = "serde")]
mod millis {
    use core::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        s.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
