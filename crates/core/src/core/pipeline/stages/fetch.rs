//! Instruction Fetch (IF) stage.
//!
//! Fetches the word at the current PC through the instruction cache and
//! advances the PC by one word (predict not-taken; taken control flow
//! redirects from the execute stage). Fetching stops at the `_halt` symbol
//! and after any fetch-side fault, which rides its entry down the pipeline.

use tracing::trace;

use crate::common::{AccessSource, MemWidth, Trap};
use crate::core::pipeline::latches::{FetchEntry, Stage};
use crate::core::{CoreCtx, TrapInfo, TrapPhase};

/// Executes the fetch stage.
///
/// # Arguments
///
/// * `ctx` - Cycle context.
/// * `draining` - Whether fetch has already stopped (halt seen or fault).
///
/// # Returns
///
/// The new IF/ID latch and the updated draining flag.
pub fn fetch_stage(ctx: &mut CoreCtx<'_>, draining: bool) -> (Stage<FetchEntry>, bool) {
    if draining {
        return (Stage::Bubble, true);
    }

    let pc = ctx.regs.read_pc();
    if ctx.halt_addr == Some(pc) {
        return (Stage::Bubble, true);
    }

    if !pc.is_word_aligned() {
        return (
            Stage::Valid(FetchEntry {
                pc,
                word: 0,
                trap: Some(TrapInfo {
                    trap: Trap::UnalignedJump(pc),
                    pc,
                    phase: TrapPhase::Fetch,
                }),
            }),
            true,
        );
    }

    match ctx
        .icache
        .read(ctx.space, pc, MemWidth::Word, AccessSource::Cpu)
    {
        Ok(word) => {
            trace!(target: "mipsim::fetch", pc = %pc, word = %format_args!("{word:#010x}"));
            ctx.regs.write_pc(pc.wrapping_add(4));
            (
                Stage::Valid(FetchEntry {
                    pc,
                    word,
                    trap: None,
                }),
                false,
            )
        }
        Err(trap) => {
            trace!(target: "mipsim::fetch", pc = %pc, %trap, "fetch fault");
            (
                Stage::Valid(FetchEntry {
                    pc,
                    word: 0,
                    trap: Some(TrapInfo {
                        trap,
                        pc,
                        phase: TrapPhase::Fetch,
                    }),
                }),
                true,
            )
        }
    }
}
