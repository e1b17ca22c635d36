//! Instruction Decode (ID) stage.
//!
//! Decodes the fetched word and reads the register operands. Decode faults
//! replace the instruction with a NOP and carry the trap down the pipeline;
//! the faulting word's address stays attached for EPC reporting.

use tracing::trace;

use crate::core::pipeline::latches::{DecodeEntry, FetchEntry, Stage};
use crate::core::{CoreCtx, TrapInfo, TrapPhase};
use crate::isa::{Instruction, decode, disassemble};

/// Executes the decode stage.
pub fn decode_stage(ctx: &mut CoreCtx<'_>, input: &Stage<FetchEntry>) -> Stage<DecodeEntry> {
    let Some(fetched) = input.entry() else {
        return Stage::Bubble;
    };

    if let Some(trap) = &fetched.trap {
        return Stage::Valid(DecodeEntry {
            pc: fetched.pc,
            inst: Instruction::nop(),
            rv_s: 0,
            rv_t: 0,
            trap: Some(trap.clone()),
        });
    }

    match decode(fetched.word) {
        Ok(inst) => {
            trace!(target: "mipsim::decode", pc = %fetched.pc, inst = %disassemble(&inst, fetched.pc));
            Stage::Valid(DecodeEntry {
                pc: fetched.pc,
                inst,
                rv_s: ctx.regs.read_gp(inst.rs),
                rv_t: ctx.regs.read_gp(inst.rt),
                trap: None,
            })
        }
        Err(trap) => Stage::Valid(DecodeEntry {
            pc: fetched.pc,
            inst: Instruction::nop(),
            rv_s: 0,
            rv_t: 0,
            trap: Some(TrapInfo {
                trap,
                pc: fetched.pc,
                phase: TrapPhase::Execute,
            }),
        }),
    }
}
