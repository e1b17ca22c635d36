//! Architectural register state.
//!
//! The `Registers` facade unifies the general-purpose bank, the program
//! counter, the multiplier HI/LO pair, and the coprocessor 0 block behind a
//! single interface. Every mutation records exactly one change notification
//! `(bank, index, old, new)`; the machine drains the queue after each cycle
//! and forwards it to subscribed observers in order. Reads are
//! side-effect-free.

/// Coprocessor 0 register block.
pub mod cp0;
/// General-purpose register bank.
pub mod gpr;

use crate::common::{Address, Trap};
use crate::core::events::{MachineEvent, RegKind};
pub use cp0::Cp0;
pub use gpr::Gpr;

/// Unified architectural register state with change notifications.
#[derive(Clone, Debug, Default)]
pub struct Registers {
    gpr: Gpr,
    cp0: Cp0,
    pc: u32,
    hi: u32,
    lo: u32,
    pending: Vec<MachineEvent>,
}

impl Registers {
    /// Creates a register file with everything zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a change notification.
    fn note(&mut self, kind: RegKind, index: usize, old: u32, new: u32) {
        self.pending.push(MachineEvent::RegisterChange {
            kind,
            index,
            old,
            new,
        });
    }

    /// Reads a general-purpose register.
    #[inline(always)]
    pub fn read_gp(&self, index: usize) -> u32 {
        self.gpr.read(index)
    }

    /// Writes a general-purpose register.
    ///
    /// A write to register 0 is an architectural no-op and emits nothing;
    /// every other write emits exactly one change notification.
    pub fn write_gp(&mut self, index: usize, value: u32) {
        if let Some(old) = self.gpr.write(index, value) {
            self.note(RegKind::Gp, index & 31, old, value);
        }
    }

    /// Reads the program counter.
    #[inline(always)]
    pub const fn read_pc(&self) -> Address {
        Address::new(self.pc)
    }

    /// Writes the program counter.
    pub fn write_pc(&mut self, value: Address) {
        let old = self.pc;
        self.pc = value.val();
        self.note(RegKind::Pc, 0, old, self.pc);
    }

    /// Reads the HI register.
    #[inline(always)]
    pub const fn read_hi(&self) -> u32 {
        self.hi
    }

    /// Reads the LO register.
    #[inline(always)]
    pub const fn read_lo(&self) -> u32 {
        self.lo
    }

    /// Writes the HI register.
    pub fn write_hi(&mut self, value: u32) {
        let old = self.hi;
        self.hi = value;
        self.note(RegKind::Hi, 0, old, value);
    }

    /// Writes the LO register.
    pub fn write_lo(&mut self, value: u32) {
        let old = self.lo;
        self.lo = value;
        self.note(RegKind::Lo, 0, old, value);
    }

    /// Reads a coprocessor 0 register by architectural number.
    #[inline(always)]
    pub const fn read_cp0(&self, sel: usize) -> u32 {
        self.cp0.read(sel)
    }

    /// Writes a coprocessor 0 register by architectural number.
    pub fn write_cp0(&mut self, sel: usize, value: u32) {
        if let Some(old) = self.cp0.write(sel, value) {
            self.note(RegKind::Cp0, sel, old, value);
        }
    }

    /// Latches trap state into coprocessor 0 and records the notifications.
    pub fn take_trap(&mut self, trap: &Trap, pc: Address) {
        let old_epc = self.cp0.read(cp0::EPC);
        let old_cause = self.cp0.read(cp0::CAUSE);
        self.cp0.record_trap(trap, pc);
        self.note(RegKind::Cp0, cp0::EPC, old_epc, self.cp0.read(cp0::EPC));
        self.note(RegKind::Cp0, cp0::CAUSE, old_cause, self.cp0.read(cp0::CAUSE));
    }

    /// Drains the change notifications recorded since the last call.
    pub fn take_events(&mut self) -> Vec<MachineEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Resets every register to zero, dropping pending notifications.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
