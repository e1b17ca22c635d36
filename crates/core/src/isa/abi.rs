//! Register naming conventions.
//!
//! Conventional O32 names for the 32 general-purpose registers plus the
//! indices the OS-call emulation and pseudo-instructions rely on.

/// Conventional names of the general-purpose registers, indexed by number.
pub const REG_NAMES: [&str; 32] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6",
    "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp",
    "fp", "ra",
];

/// Hardwired zero register.
pub const REG_ZERO: usize = 0;
/// Assembler temporary, used by pseudo-instruction expansion.
pub const REG_AT: usize = 1;
/// First result register; carries the OS-call number.
pub const REG_V0: usize = 2;
/// First argument register.
pub const REG_A0: usize = 4;
/// Stack pointer.
pub const REG_SP: usize = 29;
/// Return address, written by link instructions.
pub const REG_RA: usize = 31;

/// Returns the register index for a conventional name (without `$`).
///
/// Accepts both conventional names (`v0`, `ra`) and plain numbers (`2`).
pub fn lookup(name: &str) -> Option<usize> {
    if let Ok(index) = name.parse::<usize>() {
        return (index < 32).then_some(index);
    }
    REG_NAMES.iter().position(|&n| n == name)
}
