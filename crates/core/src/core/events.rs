//! Machine events and observer dispatch.
//!
//! External collaborators (GUI, tracer, reporter) observe the machine through
//! typed change events. The hub is a dispatch table keyed by event kind;
//! subscribers are plain callbacks registered through the machine facade and
//! hold no pointers back into the model. Notifications for a cycle fire in
//! stage order, after which subscribers may mutate machine state, never
//! during a cycle.

use std::collections::HashMap;

use crate::common::{Address, MemWidth, Trap};

/// Which architectural register bank a change belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegKind {
    /// General-purpose register.
    Gp,
    /// Program counter.
    Pc,
    /// Multiplier HI register.
    Hi,
    /// Multiplier LO register.
    Lo,
    /// Coprocessor 0 register.
    Cp0,
}

/// A typed machine event.
#[derive(Clone, Debug, PartialEq)]
pub enum MachineEvent {
    /// A register changed: `(bank, index, old, new)`.
    RegisterChange {
        /// Register bank.
        kind: RegKind,
        /// Index within the bank (0 for PC/HI/LO).
        index: usize,
        /// Value before the write.
        old: u32,
        /// Value after the write.
        new: u32,
    },
    /// A store reached the memory hierarchy.
    MemoryWrite {
        /// Absolute address.
        addr: Address,
        /// Access width.
        width: MemWidth,
        /// Value stored.
        value: u32,
    },
    /// A trap was taken.
    TrapTaken {
        /// The trap.
        trap: Trap,
        /// Address of the faulting instruction.
        pc: Address,
    },
    /// The machine reached a halt condition.
    Halted {
        /// PC at halt.
        pc: Address,
    },
    /// The program transmitted a byte on the serial port.
    SerialOutput {
        /// Transmitted byte.
        byte: u8,
    },
    /// The frame buffer changed within the given byte span.
    DisplayUpdate {
        /// First dirty byte offset.
        lo: u32,
        /// One past the last dirty byte offset.
        hi: u32,
    },
    /// The assembler encountered a `#pragma` hint (opaque to the core).
    Pragma {
        /// Source line number.
        line: usize,
        /// Pragma text after the keyword.
        text: String,
    },
}

/// Event kinds used as dispatch keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Register changes.
    Register,
    /// Memory writes.
    Memory,
    /// Traps.
    Trap,
    /// Halt.
    Halt,
    /// Serial output.
    Serial,
    /// Display updates.
    Display,
    /// Assembler pragmas.
    Pragma,
}

impl MachineEvent {
    /// Returns the dispatch key of this event.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::RegisterChange { .. } => EventKind::Register,
            Self::MemoryWrite { .. } => EventKind::Memory,
            Self::TrapTaken { .. } => EventKind::Trap,
            Self::Halted { .. } => EventKind::Halt,
            Self::SerialOutput { .. } => EventKind::Serial,
            Self::DisplayUpdate { .. } => EventKind::Display,
            Self::Pragma { .. } => EventKind::Pragma,
        }
    }
}

/// Subscriber callback type.
type Callback = Box<dyn FnMut(&MachineEvent)>;

/// Dispatch table from event kind to subscribers.
#[derive(Default)]
pub struct EventHub {
    subscribers: HashMap<EventKind, Vec<Callback>>,
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: Vec<(EventKind, usize)> = self
            .subscribers
            .iter()
            .map(|(kind, subs)| (*kind, subs.len()))
            .collect();
        f.debug_struct("EventHub").field("subscribers", &counts).finish()
    }
}

impl EventHub {
    /// Creates a hub with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a callback to one event kind.
    pub fn subscribe(&mut self, kind: EventKind, callback: impl FnMut(&MachineEvent) + 'static) {
        self.subscribers
            .entry(kind)
            .or_default()
            .push(Box::new(callback));
    }

    /// Delivers an event to every subscriber of its kind.
    pub fn emit(&mut self, event: &MachineEvent) {
        if let Some(subs) = self.subscribers.get_mut(&event.kind()) {
            for callback in subs.iter_mut() {
                callback(event);
            }
        }
    }
}
