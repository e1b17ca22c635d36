//! Five-stage pipelined core.
//!
//! The classic IF/ID/EX/MEM/WB pipeline with hazard detection, forwarding,
//! and stall/flush control. Per cycle all stages advance in parallel from
//! the previous cycle's latches: the driver snapshots the latch state,
//! evaluates writeback through fetch against the snapshot, applies hazard
//! and control decisions, and installs the new latches.
//!
//! Control flow resolves in the execute stage under predict-not-taken. With
//! the delay slot enabled a taken branch squashes only the slot behind the
//! delay slot (one flushed fetch); without it both younger slots are
//! squashed. The pipeline preserves single-cycle semantics: final register
//! and memory state agree for any program without undefined behaviour.

/// Hazard detection and forwarding.
pub mod hazards;
/// Inter-stage latch structures.
pub mod latches;
/// Stage implementations.
pub mod stages;

use crate::config::HazardUnit;
use crate::core::events::MachineEvent;
use crate::core::{CoreCtx, StepOutcome};
use self::latches::{Latches, Stage};
use self::stages::{decode_stage, execute_stage, fetch_stage, memory_stage, writeback_stage};

/// Buffers one stage's notifications: anything the stage pushed into the
/// cycle buffer past `mark`, plus the register changes it recorded.
fn drain_stage(ctx: &mut CoreCtx<'_>, mark: usize) -> Vec<MachineEvent> {
    let mut events = ctx.events.split_off(mark);
    events.append(&mut ctx.regs.take_events());
    events
}

/// The pipelined execution core.
#[derive(Debug)]
pub struct PipelineCore {
    delay_slot: bool,
    hazard: HazardUnit,
    latches: Latches,
    /// Set when fetch has stopped (halt address seen or fetch fault); the
    /// machine halts once the remaining instructions drain.
    draining: bool,
}

impl PipelineCore {
    /// Creates a pipelined core.
    ///
    /// # Arguments
    ///
    /// * `delay_slot` - Execute branch delay slots.
    /// * `hazard` - Hazard handling strategy.
    pub fn new(delay_slot: bool, hazard: HazardUnit) -> Self {
        Self {
            delay_slot,
            hazard,
            latches: Latches::default(),
            draining: false,
        }
    }

    /// Clears the latches and the draining flag.
    pub fn reset(&mut self) {
        self.latches.flush();
        self.draining = false;
    }

    /// Returns a read-only view of the latches (inspectors, tests).
    pub const fn latches(&self) -> &Latches {
        &self.latches
    }

    /// Advances the pipeline by one cycle.
    ///
    /// Stages are evaluated writeback-first against a snapshot of the
    /// latches, but their notifications are buffered per stage and flushed
    /// in architectural order (IF, ID, EX, MEM, WB), so observers see the
    /// cycle the way the hardware stages it.
    pub fn step(&mut self, ctx: &mut CoreCtx<'_>) -> StepOutcome {
        let old = self.latches.clone();
        let mark = ctx.events.len();

        // Writeback first: write-first register file, and an older trap or
        // halt must stop the cycle before younger stores commit.
        let wb = writeback_stage(ctx, &old.mem_wb);
        let wb_events = drain_stage(ctx, mark);
        if let Some(trap) = wb.trap {
            ctx.events.extend(wb_events);
            self.latches.flush();
            self.draining = false;
            return StepOutcome {
                trap: Some(trap),
                ..StepOutcome::default()
            };
        }
        if wb.halt {
            ctx.events.extend(wb_events);
            return StepOutcome {
                halted: true,
                syscall: None,
                trap: None,
            };
        }

        let new_mem_wb = memory_stage(ctx, &old.ex_mem);
        let mem_events = drain_stage(ctx, mark);

        let ex = execute_stage(
            ctx,
            &old.id_ex,
            &old.ex_mem,
            &old.mem_wb,
            self.hazard,
            self.delay_slot,
        );
        let mut ex_events = drain_stage(ctx, mark);
        let new_ex_mem = ex.stage;

        let mut new_id_ex = decode_stage(ctx, &old.if_id);
        let id_events = drain_stage(ctx, mark);

        let stall = match self.hazard {
            HazardUnit::Forward => hazards::need_stall_load_use(&old.id_ex, &old.if_id),
            HazardUnit::Stall => hazards::need_stall_raw(&old.if_id, &old.id_ex, &old.ex_mem),
            HazardUnit::None => false,
        };

        // Single-ported memory: an uncached data access blocks the fetch port.
        let structural = !ctx.icache.enabled()
            && !ctx.dcache.enabled()
            && old.ex_mem.entry().is_some_and(|e| {
                e.trap.is_none() && (e.inst.op.is_load() || e.inst.op.is_store())
            });

        let mut new_if_id;
        if stall {
            // Bubble into ID/EX; IF and ID hold (PC and IF/ID unchanged).
            new_id_ex = Stage::Bubble;
            new_if_id = old.if_id;
            ctx.stats.stalls_data += 1;
        } else if structural {
            new_if_id = Stage::Bubble;
            ctx.stats.stalls_memory += 1;
        } else {
            let (fetched, draining) = fetch_stage(ctx, self.draining);
            new_if_id = fetched;
            self.draining = draining;
        }
        let if_events = drain_stage(ctx, mark);

        if let Some(target) = ex.redirect {
            ctx.regs.write_pc(target);
            self.draining = false;
            if self.delay_slot {
                // The delay slot (in ID this cycle) proceeds; only a fetch
                // performed this cycle is wrong-path. Under a stall no fetch
                // happened and IF/ID still holds the delay slot itself.
                if !stall {
                    new_if_id = Stage::Bubble;
                    ctx.stats.stalls_control += 1;
                }
            } else {
                new_if_id = Stage::Bubble;
                new_id_ex = Stage::Bubble;
                ctx.stats.stalls_control += 2;
            }
            // The redirect is the execute stage's PC resolution.
            ex_events.append(&mut ctx.regs.take_events());
        }

        self.latches = Latches {
            if_id: new_if_id,
            id_ex: new_id_ex,
            ex_mem: new_ex_mem,
            mem_wb: new_mem_wb,
        };

        // Flush notifications in stage order: IF, ID, EX, MEM, WB.
        ctx.events.extend(if_events);
        ctx.events.extend(id_events);
        ctx.events.extend(ex_events);
        ctx.events.extend(mem_events);
        ctx.events.extend(wb_events);

        StepOutcome {
            halted: self.draining && self.latches.drained(),
            trap: None,
            syscall: wb.syscall,
        }
    }
}
