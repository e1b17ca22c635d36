//! Arithmetic-logic unit.
//!
//! Pure combinational execution of the ALU-class operations shared by both
//! cores. Trapping variants (ADD, ADDI, SUB) raise an overflow trap carrying
//! the faulting PC; an operation outside the ALU class reaching this unit is
//! an unsupported-ALU trap.

use crate::common::{Address, Trap};
use crate::isa::instruction::{Instruction, Operation};

/// Executes an ALU-class operation.
///
/// # Arguments
///
/// * `inst` - The instruction being executed (operation, shift amount, PC context).
/// * `a` - First operand (`rs` value, or `rt` for constant shifts).
/// * `b` - Second operand (`rt` value or extended immediate).
/// * `pc` - Address of the instruction, for overflow trap reporting.
///
/// # Errors
///
/// [`Trap::Overflow`] on signed overflow of a trapping variant,
/// [`Trap::UnsupportedAlu`] when the operation is not ALU-class.
pub fn execute(inst: &Instruction, a: u32, b: u32, pc: Address) -> Result<u32, Trap> {
    use Operation as Op;
    let result = match inst.op {
        Op::Add | Op::Addi => (a as i32)
            .checked_add(b as i32)
            .ok_or(Trap::Overflow(pc))? as u32,
        Op::Sub => (a as i32)
            .checked_sub(b as i32)
            .ok_or(Trap::Overflow(pc))? as u32,
        Op::Addu | Op::Addiu => a.wrapping_add(b),
        Op::Subu => a.wrapping_sub(b),
        Op::And | Op::Andi => a & b,
        Op::Or | Op::Ori => a | b,
        Op::Xor | Op::Xori => a ^ b,
        Op::Nor => !(a | b),
        Op::Slt | Op::Slti => u32::from((a as i32) < (b as i32)),
        Op::Sltu | Op::Sltiu => u32::from(a < b),
        Op::Sll => b << inst.shamt,
        Op::Srl => b >> inst.shamt,
        Op::Sra => ((b as i32) >> inst.shamt) as u32,
        Op::Sllv => b << (a & 31),
        Op::Srlv => b >> (a & 31),
        Op::Srav => ((b as i32) >> (a & 31)) as u32,
        Op::Lui => b << 16,
        _ => return Err(Trap::UnsupportedAlu(inst.raw)),
    };
    Ok(result)
}

/// Executes a multiply or divide, returning `(hi, lo)`.
///
/// Division by zero follows the R-series convention the tooling expects:
/// the quotient saturates (`-1` unsigned view, `±1` signed by dividend sign)
/// and the remainder is the dividend. `i32::MIN / -1` wraps.
pub fn mult_div(op: Operation, a: u32, b: u32) -> (u32, u32) {
    use Operation as Op;
    match op {
        Op::Mult => {
            let product = i64::from(a as i32) * i64::from(b as i32);
            ((product >> 32) as u32, product as u32)
        }
        Op::Multu => {
            let product = u64::from(a) * u64::from(b);
            ((product >> 32) as u32, product as u32)
        }
        Op::Div => {
            let (a, b) = (a as i32, b as i32);
            if b == 0 {
                (a as u32, if a >= 0 { u32::MAX } else { 1 })
            } else {
                (a.wrapping_rem(b) as u32, a.wrapping_div(b) as u32)
            }
        }
        Op::Divu => {
            if b == 0 {
                (a, u32::MAX)
            } else {
                (a % b, a / b)
            }
        }
        // Only the four multiply/divide operations route here.
        _ => (0, 0),
    }
}

/// Evaluates a branch condition.
pub const fn branch_taken(op: Operation, a: u32, b: u32) -> bool {
    use Operation as Op;
    let sa = a as i32;
    match op {
        Op::Beq => a == b,
        Op::Bne => a != b,
        Op::Blez => sa <= 0,
        Op::Bgtz => sa > 0,
        Op::Bltz | Op::Bltzal => sa < 0,
        Op::Bgez | Op::Bgezal => sa >= 0,
        _ => false,
    }
}
