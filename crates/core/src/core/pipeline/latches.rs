//! Pipeline latch structures.
//!
//! The four latches between the five stages. Each latch is a tagged variant:
//! either a bubble or a valid entry carrying the instruction and the values
//! computed so far, so that flushes and forwarding are total functions. A
//! trap raised in any stage rides its entry down the pipeline and surfaces
//! at writeback.

use crate::common::Address;
use crate::core::TrapInfo;
use crate::isa::Instruction;

/// A pipeline latch payload: bubble or a stage entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Stage<T> {
    /// No instruction in this slot.
    Bubble,
    /// An in-flight instruction.
    Valid(T),
}

impl<T> Default for Stage<T> {
    /// A fresh latch holds a bubble.
    fn default() -> Self {
        Self::Bubble
    }
}

impl<T> Stage<T> {
    /// Returns whether this latch holds a bubble.
    pub const fn is_bubble(&self) -> bool {
        matches!(self, Self::Bubble)
    }

    /// Returns the entry when the latch is valid.
    pub const fn entry(&self) -> Option<&T> {
        match self {
            Self::Bubble => None,
            Self::Valid(entry) => Some(entry),
        }
    }
}

/// IF/ID entry: the fetched word, not yet decoded.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchEntry {
    /// Address of the instruction.
    pub pc: Address,
    /// Raw instruction word.
    pub word: u32,
    /// Trap raised during fetch, with phase context.
    pub trap: Option<TrapInfo>,
}

/// ID/EX entry: decoded instruction with register operands.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodeEntry {
    /// Address of the instruction.
    pub pc: Address,
    /// Decoded instruction.
    pub inst: Instruction,
    /// Value of `rs` read at decode.
    pub rv_s: u32,
    /// Value of `rt` read at decode.
    pub rv_t: u32,
    /// Trap carried from fetch or raised during decode.
    pub trap: Option<TrapInfo>,
}

/// EX/MEM entry: computed value and store data.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecuteEntry {
    /// Address of the instruction.
    pub pc: Address,
    /// Decoded instruction.
    pub inst: Instruction,
    /// ALU result, effective address, or link value.
    pub value: u32,
    /// Data for store instructions (forwarded `rt`).
    pub store_val: u32,
    /// Trap carried or raised up to execute.
    pub trap: Option<TrapInfo>,
}

/// MEM/WB entry: final write-back value.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryEntry {
    /// Address of the instruction.
    pub pc: Address,
    /// Decoded instruction.
    pub inst: Instruction,
    /// Value to write back (load data or passed-through result).
    pub value: u32,
    /// Trap carried or raised up to memory.
    pub trap: Option<TrapInfo>,
}

/// The four inter-stage latches.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Latches {
    /// Fetch to decode.
    pub if_id: Stage<FetchEntry>,
    /// Decode to execute.
    pub id_ex: Stage<DecodeEntry>,
    /// Execute to memory.
    pub ex_mem: Stage<ExecuteEntry>,
    /// Memory to writeback.
    pub mem_wb: Stage<MemoryEntry>,
}

impl Latches {
    /// Returns whether every latch is a bubble (pipeline drained).
    pub const fn drained(&self) -> bool {
        self.if_id.is_bubble()
            && self.id_ex.is_bubble()
            && self.ex_mem.is_bubble()
            && self.mem_wb.is_bubble()
    }

    /// Replaces every latch with a bubble.
    pub fn flush(&mut self) {
        *self = Self::default();
    }
}
