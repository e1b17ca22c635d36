//! Memory Access (MEM) stage.
//!
//! Performs the data-side access through the D-cache: loads read and extend,
//! stores write and record a memory event. Non-memory instructions pass
//! their execute value through; entries already carrying a trap skip the
//! access entirely.

use tracing::trace;

use crate::common::{AccessSource, Address};
use crate::core::events::MachineEvent;
use crate::core::pipeline::latches::{ExecuteEntry, MemoryEntry, Stage};
use crate::core::{CoreCtx, TrapInfo, TrapPhase, exec};

/// Executes the memory stage.
pub fn memory_stage(ctx: &mut CoreCtx<'_>, input: &Stage<ExecuteEntry>) -> Stage<MemoryEntry> {
    let Some(entry) = input.entry() else {
        return Stage::Bubble;
    };

    let mut value = entry.value;
    let mut trap = entry.trap.clone();

    if trap.is_none() && entry.inst.op.is_load() {
        let addr = Address::new(entry.value);
        let width = exec::mem_width(entry.inst.op);
        match ctx.dcache.read(ctx.space, addr, width, AccessSource::Cpu) {
            Ok(raw) => {
                value = exec::load_extend(entry.inst.op, raw);
                trace!(target: "mipsim::memory", pc = %entry.pc, addr = %addr, value = %format_args!("{value:#010x}"), "load");
            }
            Err(t) => {
                trap = Some(TrapInfo {
                    trap: t,
                    pc: entry.pc,
                    phase: TrapPhase::Memory,
                });
            }
        }
    } else if trap.is_none() && entry.inst.op.is_store() {
        let addr = Address::new(entry.value);
        let width = exec::mem_width(entry.inst.op);
        match ctx
            .dcache
            .write(ctx.space, addr, width, entry.store_val, AccessSource::Cpu)
        {
            Ok(()) => {
                ctx.events.push(MachineEvent::MemoryWrite {
                    addr,
                    width,
                    value: entry.store_val,
                });
                trace!(target: "mipsim::memory", pc = %entry.pc, addr = %addr, value = %format_args!("{:#010x}", entry.store_val), "store");
            }
            Err(t) => {
                trap = Some(TrapInfo {
                    trap: t,
                    pc: entry.pc,
                    phase: TrapPhase::Memory,
                });
            }
        }
    }

    Stage::Valid(MemoryEntry {
        pc: entry.pc,
        inst: entry.inst,
        value,
        trap,
    })
}
