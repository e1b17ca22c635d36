//! Machine facade.
//!
//! The `Machine` owns every component (address space, caches, register
//! file, core, symbol table, event hub) and is their sole creator and
//! destroyer. It drives the logical clock: `step()` advances exactly one
//! cycle, `run()` repeats until halt, breakpoint, cancellation, or a cycle
//! budget. Between cycles the machine yields to the host, which may deliver
//! peripheral input, mutate registers, or inspect memory; mutating during a
//! cycle is forbidden by contract.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::asm::provider::SourceProvider;
use crate::asm::{AsmResult, Assembler};
use crate::common::{AccessSource, Address, MemWidth, Trap};
use crate::config::MachineConfig;
use crate::core::arch::Registers;
use crate::core::events::{EventHub, EventKind, MachineEvent};
use crate::core::{CoreCtx, CoreDispatch, PipelineCore, SingleCycle, TrapInfo};
use crate::mem::peripherals::{Knobs, Lcd, SerialPort};
use crate::mem::{
    AddressSpace, Cache, KNOBS_BASE, LCD_BASE, MemTiming, RAM_BASE, RAM_SIZE, Ram, SERIAL_BASE,
    SymbolTable,
};
use crate::sim::loader::{self, LoadedImage, LoaderError};
use crate::sim::osemu;
use crate::stats::SimStats;

/// Why `run()` returned.
#[derive(Clone, Debug, PartialEq)]
pub enum RunStatus {
    /// The machine reached a halt condition.
    Halted,
    /// A trap stopped execution; details are latched in CP0 and here.
    Trapped(TrapInfo),
    /// Execution paused at a breakpoint.
    Breakpoint(Address),
    /// The cancellation flag was observed between cycles.
    Cancelled,
    /// The cycle budget ran out.
    BudgetExhausted,
}

/// The simulated machine.
pub struct Machine {
    config: MachineConfig,
    space: AddressSpace,
    icache: Cache,
    dcache: Cache,
    regs: Registers,
    core: CoreDispatch,
    symtab: SymbolTable,
    hub: EventHub,
    stats: SimStats,
    cycle_events: Vec<MachineEvent>,
    breakpoints: BTreeSet<u32>,
    cancel: Arc<AtomicBool>,
    halted: bool,
    trap: Option<TrapInfo>,
    entry: Address,
    /// True while a cycle is in flight; guards the mutate-between-cycles
    /// contract in debug builds.
    in_cycle: bool,
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("pc", &self.regs.read_pc())
            .field("cycles", &self.stats.cycles)
            .field("halted", &self.halted)
            .finish_non_exhaustive()
    }
}

impl Machine {
    /// Builds a machine from its configuration.
    ///
    /// Backends register into the address map here and only here: RAM at the
    /// bottom of the space, the peripherals in the uncached window.
    pub fn new(config: MachineConfig) -> Self {
        let mut space = AddressSpace::new();
        // The map is built from constants over disjoint ranges; registration
        // cannot fail.
        let _ = space.register(Address::new(RAM_BASE), Box::new(Ram::new(RAM_SIZE)));
        let _ = space.register(Address::new(LCD_BASE), Box::new(Lcd::default()));
        let _ = space.register(Address::new(SERIAL_BASE), Box::new(SerialPort::new()));
        let _ = space.register(Address::new(KNOBS_BASE), Box::new(Knobs::new()));

        let timing = MemTiming {
            read_time: config.mem_read_time,
            write_time: config.mem_write_time,
            burst_time: config.mem_burst_time,
        };
        let icache = Cache::new(config.i_cache.clone(), timing);
        let dcache = Cache::new(config.d_cache.clone(), timing);

        let core = if config.pipelined {
            CoreDispatch::Pipelined(PipelineCore::new(config.delay_slot, config.hazard_unit))
        } else {
            CoreDispatch::Single(SingleCycle::new(config.delay_slot))
        };

        Self {
            config,
            space,
            icache,
            dcache,
            regs: Registers::new(),
            core,
            symtab: SymbolTable::new(),
            hub: EventHub::new(),
            stats: SimStats::default(),
            cycle_events: Vec::new(),
            breakpoints: BTreeSet::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            halted: false,
            trap: None,
            entry: Address::new(crate::asm::TEXT_BASE),
            in_cycle: false,
        }
    }

    /// Debug-build check of the suspension contract: external state
    /// mutation is only legal between cycles. Mutating mid-cycle would
    /// corrupt forwarding decisions.
    fn assert_between_cycles(&self) {
        debug_assert!(
            !self.in_cycle,
            "machine state may only be mutated between cycles"
        );
    }

    /// Returns the machine configuration.
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Returns the run statistics.
    pub const fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Returns the symbol table.
    pub const fn symtab(&self) -> &SymbolTable {
        &self.symtab
    }

    /// Returns the architectural registers (read access).
    pub const fn regs(&self) -> &Registers {
        &self.regs
    }

    /// Returns mutable register access for use between cycles.
    pub fn regs_mut(&mut self) -> &mut Registers {
        self.assert_between_cycles();
        &mut self.regs
    }

    /// Returns whether the machine has halted.
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Returns the trap that stopped the machine, if one did.
    pub const fn trap(&self) -> Option<&TrapInfo> {
        self.trap.as_ref()
    }

    /// Subscribes an observer callback to one event kind.
    pub fn observe(&mut self, kind: EventKind, callback: impl FnMut(&MachineEvent) + 'static) {
        self.hub.subscribe(kind, callback);
    }

    /// Returns a handle that cancels `run()` when set.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Adds a breakpoint at an address.
    pub fn add_breakpoint(&mut self, addr: Address) {
        let _ = self.breakpoints.insert(addr.val());
    }

    /// Removes a breakpoint.
    pub fn remove_breakpoint(&mut self, addr: Address) {
        let _ = self.breakpoints.remove(&addr.val());
    }

    /// Resets the machine: registers, cores, caches, statistics.
    ///
    /// Memory contents and symbols survive a reset; the PC returns to the
    /// program entry point. The delay-slot setting is part of construction
    /// and cannot change here.
    pub fn reset(&mut self) {
        self.assert_between_cycles();
        self.regs.reset();
        self.core.reset();
        self.icache.invalidate();
        self.dcache.invalidate();
        self.stats = SimStats::default();
        self.halted = false;
        self.trap = None;
        self.cancel.store(false, Ordering::Relaxed);
        self.regs.write_pc(self.entry);
        let _ = self.regs.take_events();
        info!(target: "mipsim::machine", entry = %self.entry, "reset");
    }

    /// Assembles a source file into memory.
    ///
    /// Honours `reset_at_assembly`; invalidates cached copies of the
    /// rewritten memory; resolves the entry point from `main`, `_start`, or
    /// the text base; surfaces `#pragma` statements as events.
    pub fn assemble_source(
        &mut self,
        source: &str,
        file: &str,
        provider: &dyn SourceProvider,
    ) -> AsmResult {
        self.assert_between_cycles();
        if self.config.reset_at_assembly {
            self.symtab.clear();
        }

        let mut assembler = Assembler::new(&mut self.space, &mut self.symtab, provider);
        assembler.assemble(source, file);
        let result = assembler.finish();

        for (line, text) in &result.pragmas {
            self.hub.emit(&MachineEvent::Pragma {
                line: *line,
                text: text.clone(),
            });
        }

        // The assembler mutated memory behind the caches.
        self.cache_sync();

        self.entry = self
            .symtab
            .get("main")
            .or_else(|| self.symtab.get("_start"))
            .map_or(Address::new(crate::asm::TEXT_BASE), Address::new);

        if self.config.reset_at_assembly {
            self.reset();
        } else {
            self.regs.write_pc(self.entry);
            let _ = self.regs.take_events();
        }

        result
    }

    /// Loads an ELF image from disk.
    ///
    /// # Errors
    ///
    /// [`LoaderError`] on unreadable or malformed images.
    pub fn load_elf_file(&mut self, path: &str) -> Result<LoadedImage, LoaderError> {
        self.assert_between_cycles();
        let image = loader::load_elf_file(&mut self.space, &mut self.symtab, path)?;
        self.entry = image.entry;
        self.cache_sync();
        self.reset();
        Ok(image)
    }

    /// Invalidates cached copies after memory was mutated externally.
    pub fn cache_sync(&mut self) {
        self.assert_between_cycles();
        self.icache.invalidate();
        self.dcache.invalidate();
    }

    /// Writes back all dirty cache lines and invalidates both caches.
    pub fn cache_flush(&mut self) {
        self.assert_between_cycles();
        let _ = self.icache.flush(&mut self.space);
        let _ = self.dcache.flush(&mut self.space);
    }

    /// Reads memory as a debugger probe: cache-coherent, side-effect free.
    ///
    /// # Errors
    ///
    /// [`Trap`] for misaligned or unmapped access.
    pub fn read_debug(&mut self, addr: Address, width: MemWidth) -> Result<u32, Trap> {
        self.dcache
            .read(&mut self.space, addr, width, AccessSource::Debugger)
    }

    /// Writes memory as a debugger probe.
    ///
    /// # Errors
    ///
    /// [`Trap`] for misaligned or unmapped access.
    pub fn write_debug(&mut self, addr: Address, width: MemWidth, value: u32) -> Result<(), Trap> {
        self.assert_between_cycles();
        self.dcache
            .write(&mut self.space, addr, width, value, AccessSource::Debugger)
    }

    /// Writes words sequentially starting at `start` rounded down to a word.
    ///
    /// # Errors
    ///
    /// [`LoaderError::Unmapped`] when a word falls outside memory.
    pub fn load_words(&mut self, start: Address, words: &[u32]) -> Result<(), LoaderError> {
        let base = start.word_aligned();
        for (i, word) in words.iter().enumerate() {
            let addr = base.wrapping_add(i as u32 * 4);
            self.write_debug(addr, MemWidth::Word, *word)
                .map_err(|_| LoaderError::Unmapped(addr.val()))?;
        }
        self.cache_sync();
        Ok(())
    }

    /// Reads `count` words starting at `start` (debugger probe).
    ///
    /// # Errors
    ///
    /// [`Trap`] for unmapped addresses.
    pub fn dump_words(&mut self, start: Address, count: u32) -> Result<Vec<u32>, Trap> {
        let base = start.word_aligned();
        let mut words = Vec::with_capacity(count as usize);
        for i in 0..count {
            words.push(self.read_debug(base.wrapping_add(i * 4), MemWidth::Word)?);
        }
        Ok(words)
    }

    /// Queues bytes on the serial input (between cycles only).
    pub fn queue_serial_input(&mut self, bytes: &[u8]) {
        self.assert_between_cycles();
        let _ = self.space.with_serial(|serial| serial.queue_input(bytes));
    }

    /// Sets a dial position (between cycles only).
    pub fn set_dial(&mut self, index: usize, value: u32) {
        self.assert_between_cycles();
        let _ = self.space.with_knobs(|knobs| knobs.set_dial(index, value));
    }

    /// Advances the machine by exactly one cycle.
    ///
    /// A no-op once the machine has halted or trapped.
    pub fn step(&mut self) {
        if self.halted {
            return;
        }

        self.cycle_events.clear();
        let halt_addr = self.symtab.get("_halt").map(Address::new);

        self.in_cycle = true;
        let outcome = {
            let mut ctx = CoreCtx {
                space: &mut self.space,
                icache: &mut self.icache,
                dcache: &mut self.dcache,
                regs: &mut self.regs,
                stats: &mut self.stats,
                events: &mut self.cycle_events,
                halt_addr,
            };
            self.core.step(&mut ctx)
        };
        self.in_cycle = false;

        self.stats.cycles += 1;
        self.stats.i_cache = self.icache.stats();
        self.stats.d_cache = self.dcache.stats();

        // Observer notifications: the cores buffer the cycle's events in
        // stage order (IF, ID, EX, MEM, WB), then peripheral activity
        // follows. Anything still queued on the register file (machine-level
        // writes) trails the stage stream.
        let cycle_events = std::mem::take(&mut self.cycle_events);
        for event in &cycle_events {
            self.hub.emit(event);
        }
        self.cycle_events = cycle_events;
        for event in self.regs.take_events() {
            self.hub.emit(&event);
        }

        if let Some(output) = self.space.with_serial(SerialPort::take_output) {
            for byte in output {
                self.hub.emit(&MachineEvent::SerialOutput { byte });
            }
        }
        if let Some(Some((lo, hi))) = self.space.with_lcd(Lcd::take_dirty) {
            self.hub.emit(&MachineEvent::DisplayUpdate { lo, hi });
        }

        if let Some(info) = outcome.trap {
            self.regs.take_trap(&info.trap, info.pc);
            for event in self.regs.take_events() {
                self.hub.emit(&event);
            }
            self.stats.traps += 1;
            self.hub.emit(&MachineEvent::TrapTaken {
                trap: info.trap.clone(),
                pc: info.pc,
            });
            debug!(target: "mipsim::machine", trap = %info.trap, pc = %info.pc, "trapped");
            self.trap = Some(info);
            self.halted = true;
            return;
        }

        if let Some(code) = outcome.syscall {
            if self.config.osemu_enable {
                osemu::handle(code, &mut self.regs, &mut self.space, &mut self.dcache);
                for event in self.regs.take_events() {
                    self.hub.emit(&event);
                }
                if let Some(output) = self.space.with_serial(SerialPort::take_output) {
                    for byte in output {
                        self.hub.emit(&MachineEvent::SerialOutput { byte });
                    }
                }
            }
        }

        if outcome.halted {
            self.halted = true;
            let pc = self.regs.read_pc();
            self.hub.emit(&MachineEvent::Halted { pc });
            debug!(target: "mipsim::machine", %pc, cycles = self.stats.cycles, "halted");
        }
    }

    /// Runs until halt, breakpoint, cancellation, or budget exhaustion.
    ///
    /// The cancellation flag is checked between cycles; after observing it
    /// the machine stops cleanly and stays inspectable.
    pub fn run(&mut self, budget: Option<u64>) -> RunStatus {
        let mut remaining = budget;
        loop {
            if self.halted {
                return self
                    .trap
                    .clone()
                    .map_or(RunStatus::Halted, RunStatus::Trapped);
            }
            if self.cancel.load(Ordering::Relaxed) {
                return RunStatus::Cancelled;
            }
            if let Some(left) = remaining.as_mut() {
                if *left == 0 {
                    return RunStatus::BudgetExhausted;
                }
                *left -= 1;
            }

            self.step();

            if !self.halted {
                let pc = self.regs.read_pc();
                if self.breakpoints.contains(&pc.val()) {
                    return RunStatus::Breakpoint(pc);
                }
            }
        }
    }
}
