//! Educational MIPS-I system simulator library.
//!
//! This crate implements a cycle-level simulator for a 32-bit MIPS-I-like
//! instruction set with the following:
//! 1. **Cores:** a single-cycle core (optional branch-delay slot) and a classic
//!    five-stage pipeline (IF/ID/EX/MEM/WB) with hazard detection and forwarding.
//! 2. **Memory:** a physical address space of RAM and memory-mapped peripherals,
//!    fronted by configurable split L1 caches with accurate hit/miss statistics.
//! 3. **ISA:** decoding, encoding, and disassembly of the MIPS-I integer subset.
//! 4. **Assembler:** an integrated two-pass assembler producing words in
//!    simulated memory, with expressions, directives, and pseudo-instructions.
//! 5. **Simulation:** `Machine` (lifecycle, clock, observers), ELF and text
//!    loaders, OS-call emulation, and statistics.

/// Integrated assembler (lexer, expressions, fix-ups, encoder, directives).
pub mod asm;
/// Common types (addresses, access metadata, traps).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// CPU cores (register files, ALU, single-cycle and pipelined execution).
pub mod core;
/// Instruction set (decode, encode, disassembly, operation tables).
pub mod isa;
/// Memory hierarchy (address space, RAM, caches, symbol table, peripherals).
pub mod mem;
/// Simulation: `Machine` facade, loaders, and OS-call emulation.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `MachineConfig::default()` or deserialize from JSON.
pub use crate::config::MachineConfig;
/// CPU trap type shared by cores, memory, and the reporter.
pub use crate::common::Trap;
/// Top-level machine; owns the cores, address space, and caches.
pub use crate::sim::machine::Machine;
