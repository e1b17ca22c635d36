//! Primary opcode constants.
//!
//! The primary opcode occupies the top six bits of every MIPS machine word
//! and selects the instruction format: R-format operations share opcode 0
//! (`SPECIAL`) and are distinguished by their function field, REGIMM
//! branches share opcode 1 and are distinguished by the `rt` field.

/// R-format escape; the operation lives in the function field.
pub const OP_SPECIAL: u32 = 0o00;
/// Branch-on-sign family; the operation lives in the `rt` field.
pub const OP_REGIMM: u32 = 0o01;
/// Unconditional jump within the current 256 MiB region.
pub const OP_J: u32 = 0o02;
/// Jump and link; return address into `$ra`.
pub const OP_JAL: u32 = 0o03;
/// Branch if equal.
pub const OP_BEQ: u32 = 0o04;
/// Branch if not equal.
pub const OP_BNE: u32 = 0o05;
/// Branch if less than or equal to zero.
pub const OP_BLEZ: u32 = 0o06;
/// Branch if greater than zero.
pub const OP_BGTZ: u32 = 0o07;
/// Add immediate (traps on signed overflow).
pub const OP_ADDI: u32 = 0o10;
/// Add immediate unsigned (no overflow trap).
pub const OP_ADDIU: u32 = 0o11;
/// Set on less than immediate (signed).
pub const OP_SLTI: u32 = 0o12;
/// Set on less than immediate unsigned.
pub const OP_SLTIU: u32 = 0o13;
/// AND with zero-extended immediate.
pub const OP_ANDI: u32 = 0o14;
/// OR with zero-extended immediate.
pub const OP_ORI: u32 = 0o15;
/// XOR with zero-extended immediate.
pub const OP_XORI: u32 = 0o16;
/// Load upper immediate.
pub const OP_LUI: u32 = 0o17;
/// Coprocessor 0 operations; the operation lives in the `rs` field.
pub const OP_COP0: u32 = 0o20;
/// Load byte (sign-extended).
pub const OP_LB: u32 = 0o40;
/// Load half-word (sign-extended).
pub const OP_LH: u32 = 0o41;
/// Load word.
pub const OP_LW: u32 = 0o43;
/// Load byte unsigned.
pub const OP_LBU: u32 = 0o44;
/// Load half-word unsigned.
pub const OP_LHU: u32 = 0o45;
/// Store byte.
pub const OP_SB: u32 = 0o50;
/// Store half-word.
pub const OP_SH: u32 = 0o51;
/// Store word.
pub const OP_SW: u32 = 0o53;
