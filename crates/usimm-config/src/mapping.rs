//! Physical-address-to-DRAM-field mapping policy.

/// Which order the address decoder strips fields from the physical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMapping {
    /// From the LSB upward (after the byte offset): column, channel, bank,
    /// rank, row. Cache-line-adjacent lines land in the same row.
    Mode1,
    /// From the LSB upward (after the byte offset): channel, bank, rank,
    /// column, row. Lines are striped across banks.
    Mode2,
}

impl AddressMapping {
    #[must_use]
    pub const fn from_token(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Mode1),
            2 => Some(Self::Mode2),
            _ => None,
        }
    }
}
