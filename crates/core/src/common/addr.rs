//! Physical address type.
//!
//! This module defines a strong type for addresses in the simulated physical
//! space. It provides:
//! 1. **Type Safety:** Keeps raw integers and addresses apart at API seams.
//! 2. **Alignment:** Predicates and rounding for half-word and word accesses.
//! 3. **Arithmetic:** Wrapping add/offset helpers used by the cores and cache.

use std::fmt;

/// A physical address in the simulated 32-bit address space.
///
/// The architectural view is big-endian; all addresses are byte addresses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub u32);

impl Address {
    /// Creates a new address from a raw 32-bit value.
    #[inline(always)]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Returns the raw 32-bit address value.
    #[inline(always)]
    pub const fn val(self) -> u32 {
        self.0
    }

    /// Returns whether this address is aligned to a 4-byte word boundary.
    #[inline(always)]
    pub const fn is_word_aligned(self) -> bool {
        self.0 & 3 == 0
    }

    /// Returns whether this address is aligned to a 2-byte half boundary.
    #[inline(always)]
    pub const fn is_half_aligned(self) -> bool {
        self.0 & 1 == 0
    }

    /// Returns this address rounded down to the containing word boundary.
    #[inline(always)]
    pub const fn word_aligned(self) -> Self {
        Self(self.0 & !3)
    }

    /// Returns this address advanced by `bytes`, wrapping on overflow.
    #[inline(always)]
    pub const fn wrapping_add(self, bytes: u32) -> Self {
        Self(self.0.wrapping_add(bytes))
    }

    /// Returns the word index of this address (address divided by 4).
    #[inline(always)]
    pub const fn word_index(self) -> u32 {
        self.0 >> 2
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<u32> for Address {
    fn from(addr: u32) -> Self {
        Self(addr)
    }
}
