//! Machine-word encoder.
//!
//! The inverse of the decoder: rebuilds the canonical 32-bit encoding of a
//! decoded instruction. The assembler uses the field-level builders; the
//! round-trip `decode(encode(i)) == i` holds for every supported instruction
//! and is enforced by property tests.

use crate::isa::funct;
use crate::isa::instruction::{CODE_MASK, IMM_MASK, Instruction, Operation, REG_MASK, TARGET_MASK};
use crate::isa::opcodes;

/// Encoding class of an operation: which format it assembles into and the
/// constant that selects it within that format.
enum Class {
    /// R-format with the given function code.
    Special(u32),
    /// SYSCALL/BREAK: 20-bit code plus function code.
    Code(u32),
    /// REGIMM branch with the given `rt` code.
    Regimm(u32),
    /// J-format with the given primary opcode.
    Jump(u32),
    /// I-format with the given primary opcode.
    Imm(u32),
    /// COP0 move with the given `rs` code.
    Cop0(u32),
}

/// Returns the encoding class of an operation.
const fn class_of(op: Operation) -> Class {
    use Operation as Op;
    match op {
        Op::Sll => Class::Special(funct::FN_SLL),
        Op::Srl => Class::Special(funct::FN_SRL),
        Op::Sra => Class::Special(funct::FN_SRA),
        Op::Sllv => Class::Special(funct::FN_SLLV),
        Op::Srlv => Class::Special(funct::FN_SRLV),
        Op::Srav => Class::Special(funct::FN_SRAV),
        Op::Jr => Class::Special(funct::FN_JR),
        Op::Jalr => Class::Special(funct::FN_JALR),
        Op::Mfhi => Class::Special(funct::FN_MFHI),
        Op::Mthi => Class::Special(funct::FN_MTHI),
        Op::Mflo => Class::Special(funct::FN_MFLO),
        Op::Mtlo => Class::Special(funct::FN_MTLO),
        Op::Mult => Class::Special(funct::FN_MULT),
        Op::Multu => Class::Special(funct::FN_MULTU),
        Op::Div => Class::Special(funct::FN_DIV),
        Op::Divu => Class::Special(funct::FN_DIVU),
        Op::Add => Class::Special(funct::FN_ADD),
        Op::Addu => Class::Special(funct::FN_ADDU),
        Op::Sub => Class::Special(funct::FN_SUB),
        Op::Subu => Class::Special(funct::FN_SUBU),
        Op::And => Class::Special(funct::FN_AND),
        Op::Or => Class::Special(funct::FN_OR),
        Op::Xor => Class::Special(funct::FN_XOR),
        Op::Nor => Class::Special(funct::FN_NOR),
        Op::Slt => Class::Special(funct::FN_SLT),
        Op::Sltu => Class::Special(funct::FN_SLTU),
        Op::Syscall => Class::Code(funct::FN_SYSCALL),
        Op::Break => Class::Code(funct::FN_BREAK),
        Op::Bltz => Class::Regimm(funct::RI_BLTZ),
        Op::Bgez => Class::Regimm(funct::RI_BGEZ),
        Op::Bltzal => Class::Regimm(funct::RI_BLTZAL),
        Op::Bgezal => Class::Regimm(funct::RI_BGEZAL),
        Op::J => Class::Jump(opcodes::OP_J),
        Op::Jal => Class::Jump(opcodes::OP_JAL),
        Op::Beq => Class::Imm(opcodes::OP_BEQ),
        Op::Bne => Class::Imm(opcodes::OP_BNE),
        Op::Blez => Class::Imm(opcodes::OP_BLEZ),
        Op::Bgtz => Class::Imm(opcodes::OP_BGTZ),
        Op::Addi => Class::Imm(opcodes::OP_ADDI),
        Op::Addiu => Class::Imm(opcodes::OP_ADDIU),
        Op::Slti => Class::Imm(opcodes::OP_SLTI),
        Op::Sltiu => Class::Imm(opcodes::OP_SLTIU),
        Op::Andi => Class::Imm(opcodes::OP_ANDI),
        Op::Ori => Class::Imm(opcodes::OP_ORI),
        Op::Xori => Class::Imm(opcodes::OP_XORI),
        Op::Lui => Class::Imm(opcodes::OP_LUI),
        Op::Lb => Class::Imm(opcodes::OP_LB),
        Op::Lbu => Class::Imm(opcodes::OP_LBU),
        Op::Lh => Class::Imm(opcodes::OP_LH),
        Op::Lhu => Class::Imm(opcodes::OP_LHU),
        Op::Lw => Class::Imm(opcodes::OP_LW),
        Op::Sb => Class::Imm(opcodes::OP_SB),
        Op::Sh => Class::Imm(opcodes::OP_SH),
        Op::Sw => Class::Imm(opcodes::OP_SW),
        Op::Mfc0 => Class::Cop0(funct::C0_MFC0),
        Op::Mtc0 => Class::Cop0(funct::C0_MTC0),
    }
}

/// Assembles an R-format word.
#[inline]
pub const fn r_type(fn_code: u32, rs: usize, rt: usize, rd: usize, shamt: u32) -> u32 {
    ((rs as u32 & REG_MASK) << 21)
        | ((rt as u32 & REG_MASK) << 16)
        | ((rd as u32 & REG_MASK) << 11)
        | ((shamt & REG_MASK) << 6)
        | (fn_code & OP_FIELD)
}

/// Assembles an I-format word.
#[inline]
pub const fn i_type(opcode: u32, rs: usize, rt: usize, imm: u16) -> u32 {
    ((opcode & OP_FIELD) << 26)
        | ((rs as u32 & REG_MASK) << 21)
        | ((rt as u32 & REG_MASK) << 16)
        | (imm as u32 & IMM_MASK)
}

/// Assembles a J-format word.
#[inline]
pub const fn j_type(opcode: u32, target: u32) -> u32 {
    ((opcode & OP_FIELD) << 26) | (target & TARGET_MASK)
}

/// Assembles a REGIMM branch word.
#[inline]
pub const fn regimm(rt_code: u32, rs: usize, imm: u16) -> u32 {
    i_type(opcodes::OP_REGIMM, rs, rt_code as usize, imm)
}

/// Assembles a COP0 move word.
#[inline]
pub const fn cop0(rs_code: u32, rt: usize, rd: usize) -> u32 {
    ((opcodes::OP_COP0 & OP_FIELD) << 26)
        | ((rs_code & REG_MASK) << 21)
        | ((rt as u32 & REG_MASK) << 16)
        | ((rd as u32 & REG_MASK) << 11)
}

/// Width mask of the 6-bit opcode/function fields.
const OP_FIELD: u32 = 0x3F;

/// Re-encodes a decoded instruction into its canonical machine word.
///
/// # Arguments
///
/// * `inst` - The decoded instruction.
///
/// # Returns
///
/// The 32-bit encoding; for any instruction produced by `decode` from a
/// canonical word, `encode` returns that word.
pub const fn encode(inst: &Instruction) -> u32 {
    match class_of(inst.op) {
        Class::Special(fn_code) => r_type(fn_code, inst.rs, inst.rt, inst.rd, inst.shamt),
        Class::Code(fn_code) => ((inst.code & CODE_MASK) << 6) | fn_code,
        Class::Regimm(rt_code) => regimm(rt_code, inst.rs, inst.imm),
        Class::Jump(opcode) => j_type(opcode, inst.target),
        Class::Imm(opcode) => i_type(opcode, inst.rs, inst.rt, inst.imm),
        Class::Cop0(rs_code) => cop0(rs_code, inst.rt, inst.rd),
    }
}
