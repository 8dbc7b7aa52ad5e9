use core::fmt;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Names the identity field rejected by [`Error::InvalidIdentity`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentityField {
    DatacenterId,
    MachineId,
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DatacenterId => f.write_str("datacenter_id"),
            Self::MachineId => f.write_str("machine_id"),
        }
    }
}

/// All errors that `goflake` can produce.
///
/// The first group is raised once, while constructing a
/// [`Generator`](crate::Generator), and must abort startup. The second group is
/// returned from [`Generator::next_id`](crate::Generator::next_id) and is left
/// to the caller to retry or surface.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The four field widths do not add up to the 63 usable bits.
    #[error(
        "invalid bit layout: datacenter ({datacenter_bits}) + machine ({machine_bits}) + time \
         ({time_bits}) + sequence ({sequence_bits}) = {total}, expected 63"
    )]
    InvalidLayout {
        datacenter_bits: u8,
        machine_bits: u8,
        time_bits: u8,
        sequence_bits: u8,
        total: u32,
    },

    /// A datacenter or machine id does not fit its allotted bit width.
    #[error("invalid identity: {field} {value} exceeds the maximum of {max}")]
    InvalidIdentity {
        field: IdentityField,
        value: u64,
        max: u64,
    },

    /// The interval reset strategy needs a tick that is non-zero and small
    /// enough to schedule.
    #[error("invalid tick interval: must be greater than zero and schedulable")]
    InvalidTickInterval,

    /// The background ticker thread could not be started.
    #[error("failed to spawn the sequence ticker: {0}")]
    TickerSpawn(#[from] std::io::Error),

    /// The clock reads earlier than the configured epoch.
    #[error("clock skew: now ({now} ms) is before the epoch ({epoch} ms)")]
    ClockSkew { now: u64, epoch: u64 },

    /// The clock moved backward relative to a timestamp already issued.
    #[error("clock regressed: relative time {now} ms is behind the last issued {last} ms")]
    ClockRegressed { now: u64, last: u64 },

    /// The relative timestamp no longer fits in the time field.
    #[error("timestamp overflow: relative time {relative} ms exceeds the maximum of {max}")]
    TimestampOverflow { relative: u64, max: u64 },

    /// Every sequence value of the current tick has been handed out.
    #[error("sequence exhausted: the current tick is already past sequence {max}")]
    SequenceExhausted { max: u64 },

    /// The generator was shut down.
    #[error("generator has been shut down")]
    Stopped,
}

impl Error {
    /// Returns `true` for errors that are expected to clear by themselves once
    /// the clock moves forward.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SequenceExhausted { .. } | Self::ClockRegressed { .. }
        )
    }

    /// Returns `true` for errors detected while constructing a generator.
    pub const fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidLayout { .. }
                | Self::InvalidIdentity { .. }
                | Self::InvalidTickInterval
                | Self::TickerSpawn(_)
        )
    }
}
