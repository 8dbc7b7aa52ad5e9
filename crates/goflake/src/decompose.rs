use crate::BitLayout;

/// The fields recovered from an id by [`decompose`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Decomposed {
    /// Milliseconds since the generator's epoch.
    pub relative_timestamp: u64,
    pub datacenter_id: u64,
    pub machine_id: u64,
    pub sequence: u64,
    /// The unused most significant bit. Always `false` for ids produced by a
    /// [`Generator`](crate::Generator).
    pub top_bit: bool,
}

impl Decomposed {
    /// Converts the relative timestamp back to milliseconds since the Unix
    /// epoch, given the epoch the id was generated with.
    ///
    /// Saturates at [`u64::MAX`] for arbitrary inputs.
    pub const fn unix_millis(&self, epoch: u64) -> u64 {
        self.relative_timestamp.saturating_add(epoch)
    }
}

/// Splits an id into its fields according to `layout`.
///
/// This never fails: any 64-bit input decodes mechanically, whether or not a
/// generator could have produced it. For ids produced with the same layout it
/// is the exact inverse of [`BitLayout::pack`].
///
/// # Example
///
/// ```
/// use goflake::{BitLayout, decompose};
///
/// let layout = BitLayout::default();
/// let id = layout.pack(1000, 3, 7, 1);
///
/// let parts = decompose(id, &layout);
/// assert_eq!(parts.relative_timestamp, 1000);
/// assert_eq!(parts.datacenter_id, 3);
/// assert_eq!(parts.machine_id, 7);
/// assert_eq!(parts.sequence, 1);
/// assert!(!parts.top_bit);
/// ```
pub const fn decompose(id: u64, layout: &BitLayout) -> Decomposed {
    layout.decompose(id)
}
