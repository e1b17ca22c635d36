//! Shared operation semantics.
//!
//! Helpers used by both cores so that the pipelined and single-cycle
//! implementations execute instructions through the same code paths; the
//! architectural-equivalence property between the cores is structural, not
//! coincidental.

use crate::common::{Address, MemWidth, Trap};
use crate::core::alu;
use crate::isa::instruction::{Instruction, Operation};

/// Resolved control-flow outcome of a branch or jump.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlOutcome {
    /// Whether the PC is redirected.
    pub taken: bool,
    /// Redirect target (meaningful when `taken`).
    pub target: Address,
    /// Link register write performed by `-AL` variants and JAL/JALR.
    pub link: Option<(usize, u32)>,
}

/// Returns the access width of a load or store operation.
pub const fn mem_width(op: Operation) -> MemWidth {
    use Operation as Op;
    match op {
        Op::Lb | Op::Lbu | Op::Sb => MemWidth::Byte,
        Op::Lh | Op::Lhu | Op::Sh => MemWidth::Half,
        _ => MemWidth::Word,
    }
}

/// Extends a loaded value to register width per the operation.
pub const fn load_extend(op: Operation, raw: u32) -> u32 {
    use Operation as Op;
    match op {
        Op::Lb => raw as u8 as i8 as i32 as u32,
        Op::Lh => raw as u16 as i16 as i32 as u32,
        _ => raw,
    }
}

/// Returns the effective address of a load or store.
#[inline]
pub fn effective_addr(inst: &Instruction, base: u32) -> Address {
    Address::new(base.wrapping_add(inst.imm_se() as u32))
}

/// Resolves a control-flow instruction.
///
/// Branch conditions evaluate against the (possibly forwarded) operand
/// values; register jumps check target alignment. The link value is the
/// address of the instruction after the delay slot when delay slots are
/// enabled, and the directly following instruction otherwise.
///
/// # Errors
///
/// [`Trap::UnalignedJump`] when a register jump targets a misaligned
/// address.
pub fn resolve_control(
    inst: &Instruction,
    pc: Address,
    rs_val: u32,
    rt_val: u32,
    delay_slot: bool,
) -> Result<ControlOutcome, Trap> {
    use Operation as Op;

    let link_addr = if delay_slot {
        pc.wrapping_add(8).val()
    } else {
        pc.wrapping_add(4).val()
    };

    let outcome = match inst.op {
        Op::J => ControlOutcome {
            taken: true,
            target: inst.jump_target(pc),
            link: None,
        },
        Op::Jal => ControlOutcome {
            taken: true,
            target: inst.jump_target(pc),
            link: Some((31, link_addr)),
        },
        Op::Jr => {
            let target = Address::new(rs_val);
            if !target.is_word_aligned() {
                return Err(Trap::UnalignedJump(target));
            }
            ControlOutcome {
                taken: true,
                target,
                link: None,
            }
        }
        Op::Jalr => {
            let target = Address::new(rs_val);
            if !target.is_word_aligned() {
                return Err(Trap::UnalignedJump(target));
            }
            ControlOutcome {
                taken: true,
                target,
                link: Some((inst.rd, link_addr)),
            }
        }
        op if op.is_branch() => {
            let taken = alu::branch_taken(op, rs_val, rt_val);
            let link = matches!(op, Op::Bltzal | Op::Bgezal).then_some((31, link_addr));
            ControlOutcome {
                taken,
                target: inst.branch_target(pc),
                link,
            }
        }
        _ => ControlOutcome {
            taken: false,
            target: pc,
            link: None,
        },
    };
    Ok(outcome)
}

/// Returns whether the operation belongs to the ALU class executed by
/// [`alu::execute`], and its operands given the register values.
///
/// Constant shifts take the shift amount from the instruction and operate on
/// `rt`; immediate forms extend the immediate by their own rule.
pub fn alu_operands(inst: &Instruction, rs_val: u32, rt_val: u32) -> Option<(u32, u32)> {
    use Operation as Op;
    let operands = match inst.op {
        Op::Add
        | Op::Addu
        | Op::Sub
        | Op::Subu
        | Op::And
        | Op::Or
        | Op::Xor
        | Op::Nor
        | Op::Slt
        | Op::Sltu
        | Op::Sllv
        | Op::Srlv
        | Op::Srav => (rs_val, rt_val),
        Op::Sll | Op::Srl | Op::Sra => (0, rt_val),
        Op::Addi | Op::Addiu | Op::Slti | Op::Sltiu => (rs_val, inst.imm_se() as u32),
        Op::Andi | Op::Ori | Op::Xori => (rs_val, inst.imm_ze()),
        Op::Lui => (0, inst.imm_ze()),
        _ => return None,
    };
    Some(operands)
}
