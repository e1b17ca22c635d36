//! Hazard detection and operand forwarding.
//!
//! This module implements the logic keeping the pipeline consistent under
//! data dependencies. It provides:
//! 1. **Load-use detection:** One bubble when a load's consumer sits in
//!    IF/ID while the load is in ID/EX.
//! 2. **Forwarding:** EX/MEM and MEM/WB results bypass the register file
//!    into EX inputs, EX/MEM taking priority.
//! 3. **Stall-only mode:** Full RAW stalls for the configuration without a
//!    forwarding unit.

use crate::core::pipeline::latches::{DecodeEntry, ExecuteEntry, FetchEntry, MemoryEntry, Stage};
use crate::isa::Instruction;
use crate::isa::decode;

/// Returns the source registers the fetched word will read, decoded early
/// for hazard checks. Undecodable words read nothing (they trap in ID).
fn consumer_sources(word: u32) -> Option<(Instruction, bool, bool)> {
    let inst = decode(word).ok()?;
    let (uses_rs, uses_rt) = inst.reads_gp();
    Some((inst, uses_rs, uses_rt))
}

/// Checks for a load-use hazard between ID/EX and IF/ID.
///
/// A load's value is not available until the end of its memory stage, so a
/// dependent instruction one slot behind must wait a cycle even with full
/// forwarding.
pub fn need_stall_load_use(id_ex: &Stage<DecodeEntry>, if_id: &Stage<FetchEntry>) -> bool {
    let Some(producer) = id_ex.entry() else {
        return false;
    };
    if !producer.inst.op.is_load() || producer.trap.is_some() {
        return false;
    }
    let Some(dest) = producer.inst.dest_gp() else {
        return false;
    };
    let Some(consumer) = if_id.entry() else {
        return false;
    };
    let Some((inst, uses_rs, uses_rt)) = consumer_sources(consumer.word) else {
        return false;
    };
    (uses_rs && inst.rs == dest) || (uses_rt && inst.rt == dest)
}

/// Checks for any RAW hazard when no forwarding unit is configured.
///
/// Producers in ID/EX or EX/MEM force a stall; a producer in MEM/WB writes
/// the register file before decode reads it (write-first register file), so
/// it never stalls.
pub fn need_stall_raw(
    if_id: &Stage<FetchEntry>,
    id_ex: &Stage<DecodeEntry>,
    ex_mem: &Stage<ExecuteEntry>,
) -> bool {
    let Some(consumer) = if_id.entry() else {
        return false;
    };
    let Some((inst, uses_rs, uses_rt)) = consumer_sources(consumer.word) else {
        return false;
    };

    let conflicts = |dest: Option<usize>| {
        dest.is_some_and(|d| (uses_rs && inst.rs == d) || (uses_rt && inst.rt == d))
    };

    if let Some(entry) = id_ex.entry() {
        if entry.trap.is_none() && conflicts(entry.inst.dest_gp()) {
            return true;
        }
    }
    if let Some(entry) = ex_mem.entry() {
        if entry.trap.is_none() && conflicts(entry.inst.dest_gp()) {
            return true;
        }
    }
    false
}

/// Forwards EX/MEM and MEM/WB results into the EX operand values.
///
/// MEM/WB is applied first so the newer EX/MEM result wins when both carry
/// the register. Loads never forward from EX/MEM: their value does not exist
/// until the end of the memory stage (the load-use stall guarantees no
/// consumer needs it there).
pub fn forward_operands(
    entry: &DecodeEntry,
    ex_mem: &Stage<ExecuteEntry>,
    mem_wb: &Stage<MemoryEntry>,
) -> (u32, u32) {
    let mut a = entry.rv_s;
    let mut b = entry.rv_t;
    let (uses_rs, uses_rt) = entry.inst.reads_gp();

    if let Some(producer) = mem_wb.entry() {
        if producer.trap.is_none() {
            if let Some(dest) = producer.inst.dest_gp() {
                if uses_rs && entry.inst.rs == dest {
                    a = producer.value;
                }
                if uses_rt && entry.inst.rt == dest {
                    b = producer.value;
                }
            }
        }
    }

    if let Some(producer) = ex_mem.entry() {
        if producer.trap.is_none() && !producer.inst.op.is_load() {
            if let Some(dest) = producer.inst.dest_gp() {
                if uses_rs && entry.inst.rs == dest {
                    a = producer.value;
                }
                if uses_rt && entry.inst.rt == dest {
                    b = producer.value;
                }
            }
        }
    }

    (a, b)
}
