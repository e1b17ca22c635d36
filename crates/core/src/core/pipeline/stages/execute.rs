//! Execute (EX) stage.
//!
//! Computes ALU results, effective addresses, and link values, resolves
//! control flow, and performs the HI/LO and coprocessor moves. Branches and
//! jumps resolve here under predict-not-taken; a taken redirect is returned
//! to the pipeline driver, which flushes the younger slots.
//!
//! HI/LO and CP0 are written at execute rather than writeback: the stages
//! run strictly in order one instruction at a time, so a younger reader's
//! execute always follows the writer's, and no separate forwarding network
//! for the special registers is needed.

use tracing::trace;

use crate::common::Address;
use crate::config::HazardUnit;
use crate::core::pipeline::hazards;
use crate::core::pipeline::latches::{DecodeEntry, ExecuteEntry, MemoryEntry, Stage};
use crate::core::{CoreCtx, TrapInfo, TrapPhase, alu, exec};
use crate::isa::instruction::Operation;

/// Output of the execute stage.
#[derive(Debug)]
pub struct ExecOutput {
    /// New EX/MEM latch.
    pub stage: Stage<ExecuteEntry>,
    /// PC redirect from a taken branch or jump.
    pub redirect: Option<Address>,
}

/// Executes the execute stage.
///
/// # Arguments
///
/// * `ctx` - Cycle context.
/// * `input` - The ID/EX latch.
/// * `ex_mem` - Previous EX/MEM latch (forwarding source, one ahead).
/// * `mem_wb` - Previous MEM/WB latch (forwarding source, two ahead).
/// * `hazard` - Configured hazard unit; forwarding applies only in
///   [`HazardUnit::Forward`].
/// * `delay_slot` - Whether branch delay slots are architectural.
pub fn execute_stage(
    ctx: &mut CoreCtx<'_>,
    input: &Stage<DecodeEntry>,
    ex_mem: &Stage<ExecuteEntry>,
    mem_wb: &Stage<MemoryEntry>,
    hazard: HazardUnit,
    delay_slot: bool,
) -> ExecOutput {
    use Operation as Op;

    let Some(entry) = input.entry() else {
        return ExecOutput {
            stage: Stage::Bubble,
            redirect: None,
        };
    };

    if let Some(trap) = &entry.trap {
        return ExecOutput {
            stage: Stage::Valid(ExecuteEntry {
                pc: entry.pc,
                inst: entry.inst,
                value: 0,
                store_val: 0,
                trap: Some(trap.clone()),
            }),
            redirect: None,
        };
    }

    let (a, b) = if hazard == HazardUnit::Forward {
        hazards::forward_operands(entry, ex_mem, mem_wb)
    } else {
        (entry.rv_s, entry.rv_t)
    };

    let inst = entry.inst;
    let pc = entry.pc;
    let mut value = 0;
    let mut trap = None;
    let mut redirect = None;

    if let Some((x, y)) = exec::alu_operands(&inst, a, b) {
        match alu::execute(&inst, x, y, pc) {
            Ok(result) => value = result,
            Err(t) => {
                trap = Some(TrapInfo {
                    trap: t,
                    pc,
                    phase: TrapPhase::Execute,
                });
            }
        }
    } else if inst.op.is_load() || inst.op.is_store() {
        value = exec::effective_addr(&inst, a).val();
    } else if inst.op.is_control() {
        match exec::resolve_control(&inst, pc, a, b, delay_slot) {
            Ok(outcome) => {
                if let Some((_, link)) = outcome.link {
                    value = link;
                }
                if outcome.taken {
                    redirect = Some(outcome.target);
                }
            }
            Err(t) => {
                trap = Some(TrapInfo {
                    trap: t,
                    pc,
                    phase: TrapPhase::Execute,
                });
            }
        }
    } else {
        match inst.op {
            Op::Mult | Op::Multu | Op::Div | Op::Divu => {
                let (hi, lo) = alu::mult_div(inst.op, a, b);
                ctx.regs.write_hi(hi);
                ctx.regs.write_lo(lo);
            }
            Op::Mfhi => value = ctx.regs.read_hi(),
            Op::Mflo => value = ctx.regs.read_lo(),
            Op::Mthi => ctx.regs.write_hi(a),
            Op::Mtlo => ctx.regs.write_lo(a),
            Op::Mfc0 => value = ctx.regs.read_cp0(inst.rd),
            Op::Mtc0 => ctx.regs.write_cp0(inst.rd, b),
            // Syscall and Break act at writeback.
            _ => {}
        }
    }

    trace!(
        target: "mipsim::execute",
        pc = %pc,
        value = %format_args!("{value:#010x}"),
        taken = redirect.is_some(),
    );

    ExecOutput {
        stage: Stage::Valid(ExecuteEntry {
            pc,
            inst,
            value,
            store_val: b,
            trap,
        }),
        redirect,
    }
}
