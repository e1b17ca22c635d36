//! Test harness.
//!
//! Builders and runners shared by the unit tests: machine construction per
//! core flavour, assembly of inline programs (panicking on diagnostics so
//! tests read linearly), runs with a safety budget, and an in-memory include
//! provider for assembler tests.

use std::collections::HashMap;

use mipsim_core::asm::provider::{ProviderError, SourceProvider};
use mipsim_core::config::{CacheConfig, HazardUnit, MachineConfig};
use mipsim_core::sim::machine::{Machine, RunStatus};

/// Safety budget for test runs; no test program needs more cycles.
pub const TEST_BUDGET: u64 = 100_000;

/// A baseline single-cycle configuration with delay slots on.
pub fn single_config() -> MachineConfig {
    MachineConfig::default()
}

/// A pipelined configuration with the given hazard unit.
pub fn pipelined_config(hazard: HazardUnit) -> MachineConfig {
    MachineConfig {
        pipelined: true,
        hazard_unit: hazard,
        ..MachineConfig::default()
    }
}

/// An enabled cache configuration with the given geometry.
pub fn cache_config(sets: u32, block_words: u32, ways: u32) -> CacheConfig {
    CacheConfig {
        enabled: true,
        sets,
        block_words,
        ways,
        ..CacheConfig::default()
    }
}

/// Assembles a program into a fresh machine, panicking on any diagnostic.
pub fn assemble_into(config: MachineConfig, source: &str) -> Machine {
    let mut machine = Machine::new(config);
    let result = machine.assemble_source(source, "test.S", &NoIncludes);
    assert!(
        result.ok,
        "assembly failed:\n{}",
        result
            .diagnostics
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    );
    machine
}

/// Assembles and runs a program to its halt condition.
///
/// Panics when the run ends any other way (trap, budget), so tests that
/// expect traps drive the machine themselves.
pub fn run_to_halt(config: MachineConfig, source: &str) -> Machine {
    let mut machine = assemble_into(config, source);
    let status = machine.run(Some(TEST_BUDGET));
    assert_eq!(status, RunStatus::Halted, "program did not halt cleanly");
    machine
}

/// Runs a program expecting a trap; returns the machine for inspection.
pub fn run_to_trap(config: MachineConfig, source: &str) -> Machine {
    let mut machine = assemble_into(config, source);
    match machine.run(Some(TEST_BUDGET)) {
        RunStatus::Trapped(_) => machine,
        other => panic!("expected a trap, got {other:?}"),
    }
}

/// The standard exit sequence appended to most test programs.
pub const EXIT: &str = "
    addiu $v0, $zero, 10
    syscall
";

/// Include provider that resolves nothing.
pub struct NoIncludes;

impl SourceProvider for NoIncludes {
    fn resolve(&self, path: &str) -> Result<String, ProviderError> {
        Err(ProviderError::NotFound(path.to_string()))
    }
}

/// In-memory include provider for `.include` tests.
#[derive(Default)]
pub struct MapProvider {
    files: HashMap<String, String>,
}

impl MapProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file under the given path.
    #[must_use]
    pub fn with(mut self, path: &str, content: &str) -> Self {
        let _ = self.files.insert(path.to_string(), content.to_string());
        self
    }
}

impl SourceProvider for MapProvider {
    fn resolve(&self, path: &str) -> Result<String, ProviderError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(path.to_string()))
    }
}

/// Compares the full architectural state of two machines.
pub fn assert_same_arch_state(a: &Machine, b: &Machine, what: &str) {
    for i in 0..32 {
        assert_eq!(
            a.regs().read_gp(i),
            b.regs().read_gp(i),
            "{what}: GP {i} differs"
        );
    }
    assert_eq!(a.regs().read_hi(), b.regs().read_hi(), "{what}: HI differs");
    assert_eq!(a.regs().read_lo(), b.regs().read_lo(), "{what}: LO differs");
}
