use core::fmt;

use crate::{Decomposed, Error, Result};

/// Number of bits available to the four fields. The most significant bit of
/// the 64-bit id is left unused.
pub const USABLE_BITS: u32 = 63;

/// How the 63 usable bits of an id are split between its fields.
///
/// Fields are packed most-significant-first after the unused top bit:
///
/// ```text
///  Bit Index:  63           62                                                   0
///              +----------+-----------+-----------------+---------------+------------+
///  Field:      | unused   | time (t)  | datacenter (d)  | machine (m)   | seq (s)    |
///              +----------+-----------+-----------------+---------------+------------+
///              |<--- MSB ----------------- 64 bits ----------------------- LSB ---->|
/// ```
///
/// A `BitLayout` can only be obtained through [`BitLayout::new`] (or
/// deserialization, which goes through the same check), so every instance
/// satisfies `d + m + t + s == 63`.
///
/// # Example
///
/// ```
/// use goflake::BitLayout;
///
/// let layout = BitLayout::new(5, 5, 41, 12).unwrap();
/// assert_eq!(layout, BitLayout::default());
/// assert_eq!(layout.max_sequence(), 4095);
/// assert!(BitLayout::new(5, 5, 41, 13).is_err());
/// ```
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawBitLayout")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BitLayout {
    #[cfg_attr(feature = "serde", serde(rename = "datacenter_id"))]
    datacenter_bits: u8,
    #[cfg_attr(feature = "serde", serde(rename = "machine_id"))]
    machine_bits: u8,
    #[cfg_attr(feature = "serde", serde(rename = "time"))]
    time_bits: u8,
    #[cfg_attr(feature = "serde", serde(rename = "sequence"))]
    sequence_bits: u8,
}

impl BitLayout {
    /// 5 datacenter bits, 5 machine bits, 41 time bits, 12 sequence bits.
    pub const DEFAULT: Self = Self {
        datacenter_bits: 5,
        machine_bits: 5,
        time_bits: 41,
        sequence_bits: 12,
    };

    /// Creates a layout from its four field widths.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLayout`] if the widths do not sum to exactly
    /// 63.
    pub fn new(
        datacenter_bits: u8,
        machine_bits: u8,
        time_bits: u8,
        sequence_bits: u8,
    ) -> Result<Self> {
        let layout = Self {
            datacenter_bits,
            machine_bits,
            time_bits,
            sequence_bits,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Checks that the field widths sum to exactly 63.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLayout`] carrying all four widths and their
    /// sum.
    pub fn validate(&self) -> Result<()> {
        let total = self.total_bits();
        if total == USABLE_BITS {
            Ok(())
        } else {
            Err(Error::InvalidLayout {
                datacenter_bits: self.datacenter_bits,
                machine_bits: self.machine_bits,
                time_bits: self.time_bits,
                sequence_bits: self.sequence_bits,
                total,
            })
        }
    }

    const fn total_bits(&self) -> u32 {
        self.datacenter_bits as u32
            + self.machine_bits as u32
            + self.time_bits as u32
            + self.sequence_bits as u32
    }

    pub const fn datacenter_bits(&self) -> u8 {
        self.datacenter_bits
    }

    pub const fn machine_bits(&self) -> u8 {
        self.machine_bits
    }

    pub const fn time_bits(&self) -> u8 {
        self.time_bits
    }

    pub const fn sequence_bits(&self) -> u8 {
        self.sequence_bits
    }

    /// Largest value the time field can hold.
    pub const fn max_timestamp(&self) -> u64 {
        max_value(self.time_bits)
    }

    /// Largest value the datacenter field can hold.
    pub const fn max_datacenter_id(&self) -> u64 {
        max_value(self.datacenter_bits)
    }

    /// Largest value the machine field can hold.
    pub const fn max_machine_id(&self) -> u64 {
        max_value(self.machine_bits)
    }

    /// Largest value the sequence field can hold.
    pub const fn max_sequence(&self) -> u64 {
        max_value(self.sequence_bits)
    }

    /// Position of the lowest time bit.
    pub const fn timestamp_shift(&self) -> u32 {
        self.datacenter_bits as u32 + self.machine_bits as u32 + self.sequence_bits as u32
    }

    /// Position of the lowest datacenter bit.
    pub const fn datacenter_shift(&self) -> u32 {
        self.machine_bits as u32 + self.sequence_bits as u32
    }

    /// Position of the lowest machine bit.
    pub const fn machine_shift(&self) -> u32 {
        self.sequence_bits as u32
    }

    /// Packs the four fields into an id.
    ///
    /// Each value is masked to its field width so a caller can never spill
    /// into a neighbouring field. [`Generator`](crate::Generator) checks every
    /// value against its maximum before calling this, so the masks never
    /// discard bits there.
    pub const fn pack(
        &self,
        timestamp: u64,
        datacenter_id: u64,
        machine_id: u64,
        sequence: u64,
    ) -> u64 {
        debug_assert!(timestamp <= self.max_timestamp(), "timestamp overflow");
        debug_assert!(datacenter_id <= self.max_datacenter_id(), "datacenter_id overflow");
        debug_assert!(machine_id <= self.max_machine_id(), "machine_id overflow");
        debug_assert!(sequence <= self.max_sequence(), "sequence overflow");

        ((timestamp & self.max_timestamp()) << self.timestamp_shift())
            | ((datacenter_id & self.max_datacenter_id()) << self.datacenter_shift())
            | ((machine_id & self.max_machine_id()) << self.machine_shift())
            | (sequence & self.max_sequence())
    }

    /// Splits an id back into its fields. See [`decompose`](crate::decompose).
    pub const fn decompose(&self, id: u64) -> Decomposed {
        Decomposed {
            relative_timestamp: (id >> self.timestamp_shift()) & self.max_timestamp(),
            datacenter_id: (id >> self.datacenter_shift()) & self.max_datacenter_id(),
            machine_id: (id >> self.machine_shift()) & self.max_machine_id(),
            sequence: id & self.max_sequence(),
            top_bit: id >> USABLE_BITS == 1,
        }
    }
}

impl Default for BitLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for BitLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "time({}) | datacenter({}) | machine({}) | sequence({})",
            self.time_bits, self.datacenter_bits, self.machine_bits, self.sequence_bits
        )
    }
}

// Widths are at most 63 once validated, so the shift cannot overflow.
const fn max_value(bits: u8) -> u64 {
    (1u64 << bits) - 1
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawBitLayout {
    datacenter_id: u8,
    machine_id: u8,
    time: u8,
    sequence: u8,
}

#[cfg(feature = "serde")]
impl TryFrom<RawBitLayout> for BitLayout {
    type Error = Error;

    fn try_from(raw: RawBitLayout) -> Result<Self> {
        Self::new(raw.datacenter_id, raw.machine_id, raw.time, raw.sequence)
    }
}
