//! Common types shared across the simulator.
//!
//! This module gathers the small vocabulary types used by every component:
//! 1. **Addresses:** the `Address` newtype for the 32-bit physical space.
//! 2. **Access metadata:** widths and the source of a memory access.
//! 3. **Traps:** the CPU-visible error type and its CLI classification.

/// Access width and access source types.
pub mod access;
/// Physical address newtype and alignment helpers.
pub mod addr;
/// CPU trap definitions and classification.
pub mod error;

pub use access::{AccessSource, MemWidth};
pub use addr::Address;
pub use error::{Trap, TrapKind};
