//! Coprocessor 0 register block.
//!
//! The small system-control set the machine models: Status, Cause, EPC, and
//! BadVAddr, addressed by their architectural register numbers. Taking a
//! trap latches the faulting PC into EPC, the exception code into Cause, and
//! the bad address (when the trap carries one) into BadVAddr.

use crate::common::{Address, Trap};

/// Register number of BadVAddr.
pub const BAD_VADDR: usize = 8;
/// Register number of Status.
pub const STATUS: usize = 12;
/// Register number of Cause.
pub const CAUSE: usize = 13;
/// Register number of EPC.
pub const EPC: usize = 14;

/// Bit position of the exception code within Cause.
const CAUSE_CODE_SHIFT: u32 = 2;

/// The coprocessor 0 register block.
#[derive(Clone, Debug, Default)]
pub struct Cp0 {
    status: u32,
    cause: u32,
    epc: u32,
    bad_vaddr: u32,
}

impl Cp0 {
    /// Creates the block with all registers zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a coprocessor register by its architectural number.
    ///
    /// Unimplemented selections read as zero.
    pub const fn read(&self, sel: usize) -> u32 {
        match sel {
            BAD_VADDR => self.bad_vaddr,
            STATUS => self.status,
            CAUSE => self.cause,
            EPC => self.epc,
            _ => 0,
        }
    }

    /// Writes a coprocessor register by its architectural number.
    ///
    /// Returns the previous value when the selection is implemented.
    pub fn write(&mut self, sel: usize, value: u32) -> Option<u32> {
        let slot = match sel {
            BAD_VADDR => &mut self.bad_vaddr,
            STATUS => &mut self.status,
            CAUSE => &mut self.cause,
            EPC => &mut self.epc,
            _ => return None,
        };
        let old = *slot;
        *slot = value;
        Some(old)
    }

    /// Latches trap state: EPC, Cause code, and BadVAddr when applicable.
    ///
    /// # Arguments
    ///
    /// * `trap` - The trap being taken.
    /// * `pc` - Address of the faulting instruction.
    pub fn record_trap(&mut self, trap: &Trap, pc: Address) {
        self.epc = pc.val();
        self.cause = trap.cause_code() << CAUSE_CODE_SHIFT;
        if let Some(bad) = trap.bad_addr() {
            self.bad_vaddr = bad.val();
        }
    }
}
