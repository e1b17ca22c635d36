//! CPU trap definitions.
//!
//! This module defines the error type surfaced by the cores and the memory
//! hierarchy. It provides:
//! 1. **Trap Representation:** All synchronous exceptions the machine models.
//! 2. **Classification:** The single-letter kinds used by failure matching.
//! 3. **Error Handling:** Integration with standard Rust error traits.

use std::fmt;

use super::addr::Address;

/// Trap types raised during fetch, execute, or memory access.
///
/// A trap stops execution, latches the faulting PC into CP0 `EPC` and the
/// cause code into CP0 `Cause`, and surfaces through the machine reporter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trap {
    /// The decoder rejected the instruction word.
    ///
    /// The associated value is the offending encoding.
    UnsupportedInstruction(u32),

    /// An ALU case reached an impossible operand combination.
    ///
    /// The associated value is the encoding of the instruction being executed.
    UnsupportedAlu(u32),

    /// Signed overflow on a trapping arithmetic variant (ADD, ADDI, SUB).
    ///
    /// The associated value is the address of the faulting instruction.
    Overflow(Address),

    /// Jump or branch target not aligned to the instruction size.
    ///
    /// The associated value is the misaligned target address.
    UnalignedJump(Address),

    /// Data access not aligned to its width.
    ///
    /// The associated value is the misaligned data address.
    UnalignedAccess(Address),

    /// Access to an address no backend claims.
    ///
    /// The associated value is the faulting address.
    BusError(Address),
}

/// Coarse trap classification used by `--fail-match`.
///
/// The letters follow the command-line contract: `I` unsupported instruction,
/// `A` unsupported ALU operation, `O` arithmetic overflow, `J` unaligned
/// jump or access. Bus errors have no letter and never match a letter set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapKind {
    /// Unsupported instruction (`I`).
    UnsupportedInstruction,
    /// Unsupported ALU operation (`A`).
    UnsupportedAlu,
    /// Arithmetic overflow (`O`).
    Overflow,
    /// Unaligned jump or data access (`J`).
    Unaligned,
    /// Unmapped address.
    BusError,
}

impl TrapKind {
    /// Returns the single-letter code for this kind, if it has one.
    pub const fn letter(self) -> Option<char> {
        match self {
            Self::UnsupportedInstruction => Some('I'),
            Self::UnsupportedAlu => Some('A'),
            Self::Overflow => Some('O'),
            Self::Unaligned => Some('J'),
            Self::BusError => None,
        }
    }
}

impl Trap {
    /// Returns the coarse classification of this trap.
    pub const fn kind(&self) -> TrapKind {
        match self {
            Self::UnsupportedInstruction(_) => TrapKind::UnsupportedInstruction,
            Self::UnsupportedAlu(_) => TrapKind::UnsupportedAlu,
            Self::Overflow(_) => TrapKind::Overflow,
            Self::UnalignedJump(_) | Self::UnalignedAccess(_) => TrapKind::Unaligned,
            Self::BusError(_) => TrapKind::BusError,
        }
    }

    /// Returns the CP0 `Cause` exception code for this trap.
    ///
    /// The codes follow the MIPS convention where one exists: address error
    /// (4), overflow (12), reserved instruction (10), bus error (7).
    pub const fn cause_code(&self) -> u32 {
        match self {
            Self::UnalignedJump(_) | Self::UnalignedAccess(_) => 4,
            Self::BusError(_) => 7,
            Self::UnsupportedInstruction(_) | Self::UnsupportedAlu(_) => 10,
            Self::Overflow(_) => 12,
        }
    }

    /// Returns the faulting address carried by this trap, if it has one.
    pub const fn bad_addr(&self) -> Option<Address> {
        match self {
            Self::UnalignedJump(a) | Self::UnalignedAccess(a) | Self::BusError(a) => Some(*a),
            _ => None,
        }
    }
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedInstruction(word) => {
                write!(f, "UnsupportedInstruction({word:#010x})")
            }
            Self::UnsupportedAlu(word) => write!(f, "UnsupportedAlu({word:#010x})"),
            Self::Overflow(pc) => write!(f, "Overflow({pc})"),
            Self::UnalignedJump(addr) => write!(f, "UnalignedJump({addr})"),
            Self::UnalignedAccess(addr) => write!(f, "UnalignedAccess({addr})"),
            Self::BusError(addr) => write!(f, "BusError({addr})"),
        }
    }
}

impl std::error::Error for Trap {}
