//! Secondary operation field constants.
//!
//! Three sub-tables hang off the primary opcode table:
//! 1. **SPECIAL functions** (opcode 0): the low six bits select the operation.
//! 2. **REGIMM codes** (opcode 1): the `rt` field selects the branch variant.
//! 3. **COP0 codes** (opcode 16): the `rs` field selects the move direction.

/// Shift left logical (also the canonical NOP when fully zero).
pub const FN_SLL: u32 = 0o00;
/// Shift right logical.
pub const FN_SRL: u32 = 0o02;
/// Shift right arithmetic.
pub const FN_SRA: u32 = 0o03;
/// Shift left logical variable.
pub const FN_SLLV: u32 = 0o04;
/// Shift right logical variable.
pub const FN_SRLV: u32 = 0o06;
/// Shift right arithmetic variable.
pub const FN_SRAV: u32 = 0o07;
/// Jump register.
pub const FN_JR: u32 = 0o10;
/// Jump and link register.
pub const FN_JALR: u32 = 0o11;
/// System call.
pub const FN_SYSCALL: u32 = 0o14;
/// Breakpoint.
pub const FN_BREAK: u32 = 0o15;
/// Move from HI.
pub const FN_MFHI: u32 = 0o20;
/// Move to HI.
pub const FN_MTHI: u32 = 0o21;
/// Move from LO.
pub const FN_MFLO: u32 = 0o22;
/// Move to LO.
pub const FN_MTLO: u32 = 0o23;
/// Multiply (signed); result into HI/LO.
pub const FN_MULT: u32 = 0o30;
/// Multiply unsigned; result into HI/LO.
pub const FN_MULTU: u32 = 0o31;
/// Divide (signed); quotient into LO, remainder into HI.
pub const FN_DIV: u32 = 0o32;
/// Divide unsigned.
pub const FN_DIVU: u32 = 0o33;
/// Add (traps on signed overflow).
pub const FN_ADD: u32 = 0o40;
/// Add unsigned (no overflow trap).
pub const FN_ADDU: u32 = 0o41;
/// Subtract (traps on signed overflow).
pub const FN_SUB: u32 = 0o42;
/// Subtract unsigned.
pub const FN_SUBU: u32 = 0o43;
/// Bitwise AND.
pub const FN_AND: u32 = 0o44;
/// Bitwise OR.
pub const FN_OR: u32 = 0o45;
/// Bitwise XOR.
pub const FN_XOR: u32 = 0o46;
/// Bitwise NOR.
pub const FN_NOR: u32 = 0o47;
/// Set on less than (signed).
pub const FN_SLT: u32 = 0o52;
/// Set on less than unsigned.
pub const FN_SLTU: u32 = 0o53;

/// REGIMM: branch if less than zero.
pub const RI_BLTZ: u32 = 0o00;
/// REGIMM: branch if greater than or equal to zero.
pub const RI_BGEZ: u32 = 0o01;
/// REGIMM: branch if less than zero and link.
pub const RI_BLTZAL: u32 = 0o20;
/// REGIMM: branch if greater than or equal to zero and link.
pub const RI_BGEZAL: u32 = 0o21;

/// COP0: move from coprocessor 0 register.
pub const C0_MFC0: u32 = 0o00;
/// COP0: move to coprocessor 0 register.
pub const C0_MTC0: u32 = 0o04;
