//! Instruction disassembler.
//!
//! Renders decoded instructions back into canonical assembly text. Used by
//! listings, trace output, and test diagnostics.

use crate::common::Address;
use crate::isa::abi::REG_NAMES;
use crate::isa::instruction::{Instruction, Operation};

/// Returns the display name of a general-purpose register.
fn reg(index: usize) -> String {
    format!("${}", REG_NAMES[index & 31])
}

/// Disassembles one instruction at the given address.
///
/// Branch and jump targets are rendered as absolute addresses so listings
/// read the way the assembler input did.
///
/// # Arguments
///
/// * `inst` - The decoded instruction.
/// * `pc` - The address the instruction resides at.
pub fn disassemble(inst: &Instruction, pc: Address) -> String {
    use Operation as Op;
    match inst.op {
        Op::Sll if inst.is_nop() => "nop".to_string(),

        Op::Add | Op::Addu | Op::Sub | Op::Subu | Op::And | Op::Or | Op::Xor | Op::Nor
        | Op::Slt | Op::Sltu | Op::Sllv | Op::Srlv | Op::Srav => {
            // Variable shifts read the shift amount from rs.
            let (a, b) = if matches!(inst.op, Op::Sllv | Op::Srlv | Op::Srav) {
                (reg(inst.rt), reg(inst.rs))
            } else {
                (reg(inst.rs), reg(inst.rt))
            };
            format!("{} {}, {}, {}", mnemonic(inst.op), reg(inst.rd), a, b)
        }

        Op::Sll | Op::Srl | Op::Sra => format!(
            "{} {}, {}, {}",
            mnemonic(inst.op),
            reg(inst.rd),
            reg(inst.rt),
            inst.shamt
        ),

        Op::Mult | Op::Multu | Op::Div | Op::Divu => {
            format!("{} {}, {}", mnemonic(inst.op), reg(inst.rs), reg(inst.rt))
        }

        Op::Mfhi | Op::Mflo => format!("{} {}", mnemonic(inst.op), reg(inst.rd)),
        Op::Mthi | Op::Mtlo | Op::Jr => format!("{} {}", mnemonic(inst.op), reg(inst.rs)),
        Op::Jalr => format!("{} {}, {}", mnemonic(inst.op), reg(inst.rd), reg(inst.rs)),

        Op::Lb | Op::Lbu | Op::Lh | Op::Lhu | Op::Lw | Op::Sb | Op::Sh | Op::Sw => format!(
            "{} {}, {}({})",
            mnemonic(inst.op),
            reg(inst.rt),
            inst.imm_se(),
            reg(inst.rs)
        ),

        Op::Beq | Op::Bne => format!(
            "{} {}, {}, {}",
            mnemonic(inst.op),
            reg(inst.rs),
            reg(inst.rt),
            inst.branch_target(pc)
        ),

        Op::Blez | Op::Bgtz | Op::Bltz | Op::Bgez | Op::Bltzal | Op::Bgezal => format!(
            "{} {}, {}",
            mnemonic(inst.op),
            reg(inst.rs),
            inst.branch_target(pc)
        ),

        Op::J | Op::Jal => format!("{} {}", mnemonic(inst.op), inst.jump_target(pc)),

        Op::Addi | Op::Addiu | Op::Slti | Op::Sltiu => format!(
            "{} {}, {}, {}",
            mnemonic(inst.op),
            reg(inst.rt),
            reg(inst.rs),
            inst.imm_se()
        ),

        Op::Andi | Op::Ori | Op::Xori => format!(
            "{} {}, {}, {:#x}",
            mnemonic(inst.op),
            reg(inst.rt),
            reg(inst.rs),
            inst.imm_ze()
        ),

        Op::Lui => format!("lui {}, {:#x}", reg(inst.rt), inst.imm_ze()),

        Op::Syscall => "syscall".to_string(),
        Op::Break => "break".to_string(),

        Op::Mfc0 | Op::Mtc0 => format!(
            "{} {}, ${}",
            mnemonic(inst.op),
            reg(inst.rt),
            inst.rd
        ),
    }
}

/// Returns the canonical mnemonic of an operation.
pub const fn mnemonic(op: Operation) -> &'static str {
    use Operation as Op;
    match op {
        Op::Add => "add",
        Op::Addu => "addu",
        Op::Sub => "sub",
        Op::Subu => "subu",
        Op::And => "and",
        Op::Or => "or",
        Op::Xor => "xor",
        Op::Nor => "nor",
        Op::Slt => "slt",
        Op::Sltu => "sltu",
        Op::Sll => "sll",
        Op::Srl => "srl",
        Op::Sra => "sra",
        Op::Sllv => "sllv",
        Op::Srlv => "srlv",
        Op::Srav => "srav",
        Op::Mult => "mult",
        Op::Multu => "multu",
        Op::Div => "div",
        Op::Divu => "divu",
        Op::Mfhi => "mfhi",
        Op::Mflo => "mflo",
        Op::Mthi => "mthi",
        Op::Mtlo => "mtlo",
        Op::Lb => "lb",
        Op::Lbu => "lbu",
        Op::Lh => "lh",
        Op::Lhu => "lhu",
        Op::Lw => "lw",
        Op::Sb => "sb",
        Op::Sh => "sh",
        Op::Sw => "sw",
        Op::Beq => "beq",
        Op::Bne => "bne",
        Op::Blez => "blez",
        Op::Bgtz => "bgtz",
        Op::Bltz => "bltz",
        Op::Bgez => "bgez",
        Op::Bltzal => "bltzal",
        Op::Bgezal => "bgezal",
        Op::J => "j",
        Op::Jal => "jal",
        Op::Jr => "jr",
        Op::Jalr => "jalr",
        Op::Addi => "addi",
        Op::Addiu => "addiu",
        Op::Slti => "slti",
        Op::Sltiu => "sltiu",
        Op::Andi => "andi",
        Op::Ori => "ori",
        Op::Xori => "xori",
        Op::Lui => "lui",
        Op::Syscall => "syscall",
        Op::Break => "break",
        Op::Mfc0 => "mfc0",
        Op::Mtc0 => "mtc0",
    }
}
