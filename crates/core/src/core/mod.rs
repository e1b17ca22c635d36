//! CPU cores.
//!
//! Architectural state, the ALU, and the two execution cores: single-cycle
//! (optional branch-delay slot) and the classic five-stage pipeline. Both
//! cores execute instructions through the shared semantics in [`exec`], so
//! for any program with no undefined behaviour their final register and
//! memory states agree.

/// Arithmetic-logic unit.
pub mod alu;
/// Register files and coprocessor 0.
pub mod arch;
/// Machine events and observer dispatch.
pub mod events;
/// Shared operation semantics.
pub mod exec;
/// Five-stage pipelined core.
pub mod pipeline;
/// Single-cycle core.
pub mod single;

use crate::common::{Address, Trap};
use crate::core::arch::Registers;
use crate::core::events::MachineEvent;
use crate::mem::{AddressSpace, Cache};
use crate::stats::SimStats;

pub use self::pipeline::PipelineCore;
pub use self::single::SingleCycle;

/// Which phase of a cycle raised a trap.
///
/// Fetch-side faults (bus error on the instruction stream) are
/// distinguishable from execute- and memory-side faults.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapPhase {
    /// Raised while fetching the instruction word.
    Fetch,
    /// Raised while decoding or executing.
    Execute,
    /// Raised during the data memory access.
    Memory,
}

/// A trap together with its reporting context.
#[derive(Clone, Debug, PartialEq)]
pub struct TrapInfo {
    /// The trap itself.
    pub trap: Trap,
    /// Address of the faulting instruction (latched into EPC).
    pub pc: Address,
    /// Phase that raised the trap.
    pub phase: TrapPhase,
}

/// Result of advancing a core by one cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepOutcome {
    /// The machine reached a halt condition this cycle.
    pub halted: bool,
    /// A trap was raised this cycle; the machine stops and reports it.
    pub trap: Option<TrapInfo>,
    /// A non-exit system call retired this cycle (code from `$v0`).
    pub syscall: Option<u32>,
}

/// Everything a core needs for one cycle, borrowed from the machine.
///
/// The cores hold no long-lived borrows: all memory operations are scoped to
/// a single `step`.
pub struct CoreCtx<'a> {
    /// Physical address space.
    pub space: &'a mut AddressSpace,
    /// Instruction-side L1 cache.
    pub icache: &'a mut Cache,
    /// Data-side L1 cache.
    pub dcache: &'a mut Cache,
    /// Architectural registers.
    pub regs: &'a mut Registers,
    /// Run statistics.
    pub stats: &'a mut SimStats,
    /// Cycle event buffer (memory writes and other non-register events).
    pub events: &'a mut Vec<MachineEvent>,
    /// Address of the `_halt` symbol, when the program defines one.
    pub halt_addr: Option<Address>,
}

impl std::fmt::Debug for CoreCtx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreCtx")
            .field("halt_addr", &self.halt_addr)
            .finish_non_exhaustive()
    }
}

/// Static dispatch over the two core implementations.
#[derive(Debug)]
pub enum CoreDispatch {
    /// Single-cycle core.
    Single(SingleCycle),
    /// Five-stage pipelined core.
    Pipelined(PipelineCore),
}

impl CoreDispatch {
    /// Advances the core by one cycle.
    pub fn step(&mut self, ctx: &mut CoreCtx<'_>) -> StepOutcome {
        match self {
            Self::Single(core) => core.step(ctx),
            Self::Pipelined(core) => core.step(ctx),
        }
    }

    /// Clears all internal core state (latches, pending branches).
    pub fn reset(&mut self) {
        match self {
            Self::Single(core) => core.reset(),
            Self::Pipelined(core) => core.reset(),
        }
    }
}
