//! Single-cycle core.
//!
//! Executes one instruction per cycle in two phases: fetch-and-execute, which
//! computes all side effects into an end-of-cycle latch, and commit, which
//! applies register and memory writes and installs the next PC. A separate
//! fetch step keeps fetch-side bus errors distinguishable from execute-side
//! traps.
//!
//! With the delay slot enabled, a taken branch defers its PC change by one
//! instruction: the instruction after the branch executes unconditionally
//! before the target is installed.

use tracing::trace;

use crate::common::{AccessSource, Address, MemWidth, Trap};
use crate::core::events::MachineEvent;
use crate::core::exec;
use crate::core::{CoreCtx, StepOutcome, TrapInfo, TrapPhase, alu};
use crate::isa::abi;
use crate::isa::instruction::{Instruction, Operation};
use crate::isa::{decode, disassemble};

/// Exit code of the OS-call that halts the machine.
const SYSCALL_EXIT: u32 = 10;

/// Side effects of one instruction, applied at commit.
#[derive(Default)]
struct CommitLatch {
    gp: Option<(usize, u32)>,
    hi_lo: Option<(u32, u32)>,
    cp0: Option<(usize, u32)>,
    store: Option<(Address, MemWidth, u32)>,
    taken: Option<Address>,
    halt: bool,
    syscall: Option<u32>,
}

/// The single-cycle execution core.
#[derive(Debug, Default)]
pub struct SingleCycle {
    delay_slot: bool,
    /// Branch target awaiting its delay slot.
    pending_branch: Option<Address>,
}

impl SingleCycle {
    /// Creates a single-cycle core.
    ///
    /// # Arguments
    ///
    /// * `delay_slot` - Execute branch delay slots (fixed for the machine's
    ///   lifetime; changing it requires a reset).
    pub fn new(delay_slot: bool) -> Self {
        Self {
            delay_slot,
            pending_branch: None,
        }
    }

    /// Clears the pending branch state.
    pub fn reset(&mut self) {
        self.pending_branch = None;
    }

    /// Advances the core by one cycle.
    pub fn step(&mut self, ctx: &mut CoreCtx<'_>) -> StepOutcome {
        let pc = ctx.regs.read_pc();

        if ctx.halt_addr == Some(pc) {
            return StepOutcome {
                halted: true,
                ..StepOutcome::default()
            };
        }

        // Fetch phase.
        let word = match self.fetch(ctx, pc) {
            Ok(word) => word,
            Err(trap) => {
                return StepOutcome {
                    trap: Some(TrapInfo {
                        trap,
                        pc,
                        phase: TrapPhase::Fetch,
                    }),
                    ..StepOutcome::default()
                };
            }
        };

        // Execute phase: all side effects go into the latch.
        let latch = match self.execute(ctx, pc, word) {
            Ok(latch) => latch,
            Err((trap, phase)) => {
                return StepOutcome {
                    trap: Some(TrapInfo { trap, pc, phase }),
                    ..StepOutcome::default()
                };
            }
        };

        // Commit phase.
        self.commit(ctx, pc, latch)
    }

    /// Fetches the instruction word at `pc`.
    fn fetch(&self, ctx: &mut CoreCtx<'_>, pc: Address) -> Result<u32, Trap> {
        if !pc.is_word_aligned() {
            return Err(Trap::UnalignedJump(pc));
        }
        let word = ctx
            .icache
            .read(ctx.space, pc, MemWidth::Word, AccessSource::Cpu)?;
        trace!(target: "mipsim::fetch", pc = %pc, word = %format_args!("{word:#010x}"));
        Ok(word)
    }

    /// Decodes and executes, producing the end-of-cycle latch.
    fn execute(
        &self,
        ctx: &mut CoreCtx<'_>,
        pc: Address,
        word: u32,
    ) -> Result<CommitLatch, (Trap, TrapPhase)> {
        use Operation as Op;

        let inst = decode(word).map_err(|trap| (trap, TrapPhase::Execute))?;
        trace!(target: "mipsim::decode", pc = %pc, inst = %disassemble(&inst, pc));

        let rs_val = ctx.regs.read_gp(inst.rs);
        let rt_val = ctx.regs.read_gp(inst.rt);
        let mut latch = CommitLatch::default();

        if let Some((a, b)) = exec::alu_operands(&inst, rs_val, rt_val) {
            let value = alu::execute(&inst, a, b, pc).map_err(|t| (t, TrapPhase::Execute))?;
            latch.gp = inst.dest_gp().map(|dest| (dest, value));
            trace!(target: "mipsim::execute", pc = %pc, result = %format_args!("{value:#010x}"));
        } else if inst.op.is_load() {
            let addr = exec::effective_addr(&inst, rs_val);
            let raw = ctx
                .dcache
                .read(ctx.space, addr, exec::mem_width(inst.op), AccessSource::Cpu)
                .map_err(|t| (t, TrapPhase::Memory))?;
            let value = exec::load_extend(inst.op, raw);
            latch.gp = inst.dest_gp().map(|dest| (dest, value));
            trace!(target: "mipsim::memory", pc = %pc, addr = %addr, value = %format_args!("{value:#010x}"));
        } else if inst.op.is_store() {
            let addr = exec::effective_addr(&inst, rs_val);
            latch.store = Some((addr, exec::mem_width(inst.op), rt_val));
        } else if inst.op.is_control() {
            let outcome = exec::resolve_control(&inst, pc, rs_val, rt_val, self.delay_slot)
                .map_err(|t| (t, TrapPhase::Execute))?;
            latch.gp = outcome.link;
            if outcome.taken {
                latch.taken = Some(outcome.target);
            }
        } else {
            match inst.op {
                Op::Mult | Op::Multu | Op::Div | Op::Divu => {
                    latch.hi_lo = Some(alu::mult_div(inst.op, rs_val, rt_val));
                }
                Op::Mfhi => latch.gp = dest_write(&inst, ctx.regs.read_hi()),
                Op::Mflo => latch.gp = dest_write(&inst, ctx.regs.read_lo()),
                Op::Mthi => latch.hi_lo = Some((rs_val, ctx.regs.read_lo())),
                Op::Mtlo => latch.hi_lo = Some((ctx.regs.read_hi(), rs_val)),
                Op::Mfc0 => latch.gp = dest_write(&inst, ctx.regs.read_cp0(inst.rd)),
                Op::Mtc0 => latch.cp0 = Some((inst.rd, rt_val)),
                Op::Syscall => {
                    let code = ctx.regs.read_gp(abi::REG_V0);
                    if code == SYSCALL_EXIT {
                        latch.halt = true;
                    } else {
                        latch.syscall = Some(code);
                    }
                }
                Op::Break => latch.halt = true,
                // All other operations were handled by the classes above.
                _ => return Err((Trap::UnsupportedAlu(inst.raw), TrapPhase::Execute)),
            }
        }

        Ok(latch)
    }

    /// Applies the latch: register and memory writes, then the next PC.
    ///
    /// Effects apply in stage order so notifications fire the way the
    /// stages would: special-register writes (execute), the store (memory),
    /// the register write-back, then the PC commit.
    fn commit(&mut self, ctx: &mut CoreCtx<'_>, pc: Address, latch: CommitLatch) -> StepOutcome {
        if let Some((hi, lo)) = latch.hi_lo {
            ctx.regs.write_hi(hi);
            ctx.regs.write_lo(lo);
        }
        if let Some((sel, value)) = latch.cp0 {
            ctx.regs.write_cp0(sel, value);
        }
        ctx.events.append(&mut ctx.regs.take_events());

        if let Some((addr, width, value)) = latch.store {
            if let Err(trap) = ctx
                .dcache
                .write(ctx.space, addr, width, value, AccessSource::Cpu)
            {
                return StepOutcome {
                    trap: Some(TrapInfo {
                        trap,
                        pc,
                        phase: TrapPhase::Memory,
                    }),
                    ..StepOutcome::default()
                };
            }
            ctx.events.push(MachineEvent::MemoryWrite { addr, width, value });
            trace!(target: "mipsim::memory", pc = %pc, addr = %addr, value = %format_args!("{value:#010x}"), "store");
        }

        if let Some((dest, value)) = latch.gp {
            ctx.regs.write_gp(dest, value);
        }

        // PC update; a pending branch from the previous cycle wins.
        let fallthrough = self.pending_branch.take().unwrap_or_else(|| pc.wrapping_add(4));
        let next = if self.delay_slot {
            if let Some(target) = latch.taken {
                self.pending_branch = Some(target);
            }
            fallthrough
        } else {
            latch.taken.unwrap_or(fallthrough)
        };
        ctx.regs.write_pc(next);
        trace!(target: "mipsim::writeback", pc = %pc, next = %next);
        ctx.events.append(&mut ctx.regs.take_events());

        ctx.stats.instructions += 1;

        StepOutcome {
            halted: latch.halt,
            trap: None,
            syscall: latch.syscall,
        }
    }
}

/// Pairs an instruction's destination with a value, skipping `$zero`.
fn dest_write(inst: &Instruction, value: u32) -> Option<(usize, u32)> {
    inst.dest_gp().map(|dest| (dest, value))
}
