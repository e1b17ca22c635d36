//! Machine-word decoder.
//!
//! This module translates raw 32-bit machine words into the internal
//! `Instruction` form. Decoding is pure and deterministic: the same word
//! always produces the same record, and anything outside the supported
//! MIPS-I subset fails with an unsupported-instruction trap.

use crate::common::Trap;
use crate::isa::funct;
use crate::isa::instruction::{Instruction, InstructionBits, Operation};
use crate::isa::opcodes;

/// Decodes one machine word.
///
/// # Arguments
///
/// * `word` - The 32-bit instruction encoding.
///
/// # Errors
///
/// Returns [`Trap::UnsupportedInstruction`] when the encoding is not part of
/// the supported subset.
pub fn decode(word: u32) -> Result<Instruction, Trap> {
    let op = match word.opcode() {
        opcodes::OP_SPECIAL => decode_special(word)?,
        opcodes::OP_REGIMM => decode_regimm(word)?,
        opcodes::OP_J => Operation::J,
        opcodes::OP_JAL => Operation::Jal,
        opcodes::OP_BEQ => Operation::Beq,
        opcodes::OP_BNE => Operation::Bne,
        opcodes::OP_BLEZ => Operation::Blez,
        opcodes::OP_BGTZ => Operation::Bgtz,
        opcodes::OP_ADDI => Operation::Addi,
        opcodes::OP_ADDIU => Operation::Addiu,
        opcodes::OP_SLTI => Operation::Slti,
        opcodes::OP_SLTIU => Operation::Sltiu,
        opcodes::OP_ANDI => Operation::Andi,
        opcodes::OP_ORI => Operation::Ori,
        opcodes::OP_XORI => Operation::Xori,
        opcodes::OP_LUI => Operation::Lui,
        opcodes::OP_COP0 => decode_cop0(word)?,
        opcodes::OP_LB => Operation::Lb,
        opcodes::OP_LH => Operation::Lh,
        opcodes::OP_LW => Operation::Lw,
        opcodes::OP_LBU => Operation::Lbu,
        opcodes::OP_LHU => Operation::Lhu,
        opcodes::OP_SB => Operation::Sb,
        opcodes::OP_SH => Operation::Sh,
        opcodes::OP_SW => Operation::Sw,
        _ => return Err(Trap::UnsupportedInstruction(word)),
    };

    Ok(Instruction {
        raw: word,
        op,
        rs: word.rs(),
        rt: word.rt(),
        rd: word.rd(),
        shamt: word.shamt(),
        imm: word.imm16(),
        target: word.target26(),
        code: word.code20(),
        reloc: None,
    })
}

/// Decodes the function field of an R-format word (opcode `SPECIAL`).
fn decode_special(word: u32) -> Result<Operation, Trap> {
    let op = match word.funct() {
        funct::FN_SLL => Operation::Sll,
        funct::FN_SRL => Operation::Srl,
        funct::FN_SRA => Operation::Sra,
        funct::FN_SLLV => Operation::Sllv,
        funct::FN_SRLV => Operation::Srlv,
        funct::FN_SRAV => Operation::Srav,
        funct::FN_JR => Operation::Jr,
        funct::FN_JALR => Operation::Jalr,
        funct::FN_SYSCALL => Operation::Syscall,
        funct::FN_BREAK => Operation::Break,
        funct::FN_MFHI => Operation::Mfhi,
        funct::FN_MTHI => Operation::Mthi,
        funct::FN_MFLO => Operation::Mflo,
        funct::FN_MTLO => Operation::Mtlo,
        funct::FN_MULT => Operation::Mult,
        funct::FN_MULTU => Operation::Multu,
        funct::FN_DIV => Operation::Div,
        funct::FN_DIVU => Operation::Divu,
        funct::FN_ADD => Operation::Add,
        funct::FN_ADDU => Operation::Addu,
        funct::FN_SUB => Operation::Sub,
        funct::FN_SUBU => Operation::Subu,
        funct::FN_AND => Operation::And,
        funct::FN_OR => Operation::Or,
        funct::FN_XOR => Operation::Xor,
        funct::FN_NOR => Operation::Nor,
        funct::FN_SLT => Operation::Slt,
        funct::FN_SLTU => Operation::Sltu,
        _ => return Err(Trap::UnsupportedInstruction(word)),
    };
    Ok(op)
}

/// Decodes the `rt` field of a REGIMM word (opcode 1).
fn decode_regimm(word: u32) -> Result<Operation, Trap> {
    let op = match word.rt() as u32 {
        funct::RI_BLTZ => Operation::Bltz,
        funct::RI_BGEZ => Operation::Bgez,
        funct::RI_BLTZAL => Operation::Bltzal,
        funct::RI_BGEZAL => Operation::Bgezal,
        _ => return Err(Trap::UnsupportedInstruction(word)),
    };
    Ok(op)
}

/// Decodes the `rs` field of a COP0 word (opcode 16).
fn decode_cop0(word: u32) -> Result<Operation, Trap> {
    let op = match word.rs() as u32 {
        funct::C0_MFC0 => Operation::Mfc0,
        funct::C0_MTC0 => Operation::Mtc0,
        _ => return Err(Trap::UnsupportedInstruction(word)),
    };
    Ok(op)
}
