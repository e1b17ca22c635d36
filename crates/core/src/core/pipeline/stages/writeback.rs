//! Writeback (WB) stage.
//!
//! Commits the register write, retires the instruction, and surfaces halt
//! conditions and traps. The register file is write-first: writeback runs
//! before decode within a cycle, so a value written back is visible to the
//! instruction being decoded in the same cycle.

use tracing::trace;

use crate::core::pipeline::latches::{MemoryEntry, Stage};
use crate::core::{CoreCtx, TrapInfo};
use crate::isa::abi;
use crate::isa::instruction::Operation;

/// Exit code of the OS-call that halts the machine.
const SYSCALL_EXIT: u32 = 10;

/// Outcome of the writeback stage.
#[derive(Debug, Default)]
pub struct WbOutput {
    /// A halt condition retired (exit call or breakpoint).
    pub halt: bool,
    /// A non-exit system call retired (code from `$v0`).
    pub syscall: Option<u32>,
    /// A trapped entry reached writeback; the machine stops.
    pub trap: Option<TrapInfo>,
}

/// Executes the writeback stage.
pub fn writeback_stage(ctx: &mut CoreCtx<'_>, input: &Stage<MemoryEntry>) -> WbOutput {
    let Some(entry) = input.entry() else {
        return WbOutput::default();
    };

    if let Some(trap) = &entry.trap {
        return WbOutput {
            trap: Some(trap.clone()),
            ..WbOutput::default()
        };
    }

    if let Some(dest) = entry.inst.dest_gp() {
        ctx.regs.write_gp(dest, entry.value);
    }
    trace!(target: "mipsim::writeback", pc = %entry.pc, value = %format_args!("{:#010x}", entry.value));

    ctx.stats.instructions += 1;

    match entry.inst.op {
        Operation::Syscall => {
            let code = ctx.regs.read_gp(abi::REG_V0);
            if code == SYSCALL_EXIT {
                WbOutput {
                    halt: true,
                    ..WbOutput::default()
                }
            } else {
                WbOutput {
                    syscall: Some(code),
                    ..WbOutput::default()
                }
            }
        }
        Operation::Break => WbOutput {
            halt: true,
            ..WbOutput::default()
        },
        _ => WbOutput::default(),
    }
}
