//! Configuration system for the simulator.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the machine. It provides:
//! 1. **Defaults:** Baseline constants (memory timing, cache geometry).
//! 2. **Structures:** Hierarchical config for the core, caches, and memory.
//! 3. **Enums:** Hazard unit, cache replacement, and write policy types.
//!
//! Configuration is supplied via JSON (`serde_json`) or assembled by the CLI
//! from command-line flags; use `MachineConfig::default()` for the baseline
//! single-cycle machine with caches disabled.

use serde::Deserialize;

/// Default configuration constants for the simulator.
///
/// These values define the baseline machine when not explicitly overridden.
mod defaults {
    /// Cycles charged for the first word of a memory read burst.
    pub const MEM_READ_TIME: u32 = 10;

    /// Cycles charged for the first word of a memory write burst.
    pub const MEM_WRITE_TIME: u32 = 10;

    /// Cycles charged for each subsequent word of a burst.
    pub const MEM_BURST_TIME: u32 = 2;

    /// Default number of cache sets.
    pub const CACHE_SETS: u32 = 1;

    /// Default number of data words per cache block.
    pub const CACHE_BLOCK_WORDS: u32 = 1;

    /// Default cache associativity (1 way = direct-mapped).
    pub const CACHE_WAYS: u32 = 1;
}

/// Hazard handling strategy for the pipelined core.
///
/// Selects how the pipeline deals with read-after-write dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardUnit {
    /// No hazard handling; programs must schedule their own dependencies.
    None,
    /// Stall until the producing instruction has written back.
    Stall,
    /// Forward EX/MEM and MEM/WB results; stall only on load-use.
    #[default]
    #[serde(alias = "stall_forward")]
    Forward,
}

/// Cache replacement policy algorithms.
///
/// Selects which way of a full set is evicted on a miss. Ties are broken by
/// the lowest way index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Random replacement (xorshift generator seeded from the cycle count).
    #[serde(alias = "Rand")]
    Rand,
    /// Least Recently Used; per-line last-access tick.
    #[default]
    #[serde(alias = "Lru")]
    Lru,
    /// Least Frequently Used; per-line access counter, reset on fill.
    #[serde(alias = "Lfu")]
    Lfu,
}

/// Cache write policy.
///
/// Determines when stores reach backing memory and whether a store miss
/// allocates a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Write-back with write-allocate; dirty lines flushed on eviction.
    #[default]
    #[serde(alias = "wb")]
    WriteBack,
    /// Write-through without allocation; store misses bypass the cache.
    #[serde(alias = "wt", alias = "wtna")]
    WriteThroughNoalloc,
    /// Write-through with allocation; store misses fill the line first.
    #[serde(alias = "wta")]
    WriteThroughAlloc,
}

/// Configuration of one L1 cache (instruction or data side).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Enable this cache; when false, accesses pass straight to memory.
    #[serde(default)]
    pub enabled: bool,

    /// Number of sets.
    #[serde(default = "CacheConfig::default_sets")]
    pub sets: u32,

    /// Data words per block.
    #[serde(default = "CacheConfig::default_block_words")]
    pub block_words: u32,

    /// Associativity (ways per set).
    #[serde(default = "CacheConfig::default_ways")]
    pub ways: u32,

    /// Replacement policy.
    #[serde(default)]
    pub replacement: ReplacementPolicy,

    /// Write policy.
    #[serde(default)]
    pub write_policy: WritePolicy,
}

impl CacheConfig {
    /// Returns the default number of sets.
    fn default_sets() -> u32 {
        defaults::CACHE_SETS
    }

    /// Returns the default block size in words.
    fn default_block_words() -> u32 {
        defaults::CACHE_BLOCK_WORDS
    }

    /// Returns the default associativity.
    fn default_ways() -> u32 {
        defaults::CACHE_WAYS
    }

    /// Parses the command-line cache syntax `POLICY,SETS,WORDS,ASSOC[,WRITE]`.
    ///
    /// `POLICY` is one of `rand`, `lru`, `lfu`; the optional `WRITE` field is
    /// `wb`, `wt`/`wtna`, or `wta`. A parsed cache is always enabled.
    ///
    /// # Errors
    ///
    /// Returns a description of the offending field when the argument does
    /// not parse or a geometry field is zero.
    pub fn parse_cli(spec: &str) -> Result<Self, String> {
        let fields: Vec<&str> = spec.split(',').collect();
        if fields.len() != 4 && fields.len() != 5 {
            return Err(format!(
                "cache spec '{spec}' must be POLICY,SETS,WORDS,ASSOC[,WRITE]"
            ));
        }

        let replacement = match fields[0].to_ascii_lowercase().as_str() {
            "rand" | "random" => ReplacementPolicy::Rand,
            "lru" => ReplacementPolicy::Lru,
            "lfu" => ReplacementPolicy::Lfu,
            other => return Err(format!("unknown replacement policy '{other}'")),
        };

        let parse_dim = |name: &str, text: &str| -> Result<u32, String> {
            let value: u32 = text
                .parse()
                .map_err(|_| format!("cache {name} '{text}' is not a number"))?;
            if value == 0 {
                return Err(format!("cache {name} must be non-zero"));
            }
            Ok(value)
        };

        let sets = parse_dim("sets", fields[1])?;
        let block_words = parse_dim("words", fields[2])?;
        let ways = parse_dim("assoc", fields[3])?;

        let write_policy = match fields.get(4) {
            None => WritePolicy::default(),
            Some(text) => match text.to_ascii_lowercase().as_str() {
                "wb" => WritePolicy::WriteBack,
                "wt" | "wtna" => WritePolicy::WriteThroughNoalloc,
                "wta" => WritePolicy::WriteThroughAlloc,
                other => return Err(format!("unknown write policy '{other}'")),
            },
        };

        Ok(Self {
            enabled: true,
            sets,
            block_words,
            ways,
            replacement,
            write_policy,
        })
    }
}

impl Default for CacheConfig {
    /// Creates a disabled direct-mapped single-word cache configuration.
    fn default() -> Self {
        Self {
            enabled: false,
            sets: defaults::CACHE_SETS,
            block_words: defaults::CACHE_BLOCK_WORDS,
            ways: defaults::CACHE_WAYS,
            replacement: ReplacementPolicy::default(),
            write_policy: WritePolicy::default(),
        }
    }
}

/// Root configuration structure for one machine.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use mipsim_core::config::MachineConfig;
///
/// let config = MachineConfig::default();
/// assert!(!config.pipelined);
/// assert!(config.delay_slot);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use mipsim_core::config::{HazardUnit, MachineConfig};
///
/// let json = r#"{
///     "pipelined": true,
///     "hazard_unit": "forward",
///     "d_cache": {
///         "enabled": true,
///         "sets": 4,
///         "block_words": 2,
///         "ways": 2,
///         "replacement": "LRU",
///         "write_policy": "write_back"
///     }
/// }"#;
///
/// let config: MachineConfig = serde_json::from_str(json).unwrap();
/// assert!(config.pipelined);
/// assert_eq!(config.hazard_unit, HazardUnit::Forward);
/// assert_eq!(config.d_cache.sets, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MachineConfig {
    /// Use the five-stage pipelined core instead of the single-cycle core.
    #[serde(default)]
    pub pipelined: bool,

    /// Execute the instruction after a branch unconditionally (MIPS classic).
    ///
    /// Changing this requires a machine reset; it is not a run-time mode.
    #[serde(default = "MachineConfig::default_delay_slot")]
    pub delay_slot: bool,

    /// Hazard handling strategy (pipelined core only).
    #[serde(default)]
    pub hazard_unit: HazardUnit,

    /// L1 instruction cache configuration.
    #[serde(default)]
    pub i_cache: CacheConfig,

    /// L1 data cache configuration.
    #[serde(default)]
    pub d_cache: CacheConfig,

    /// Cycles for the first word of a memory read.
    #[serde(default = "MachineConfig::default_read_time")]
    pub mem_read_time: u32,

    /// Cycles for the first word of a memory write.
    #[serde(default = "MachineConfig::default_write_time")]
    pub mem_write_time: u32,

    /// Cycles for each subsequent word of a burst transfer.
    #[serde(default = "MachineConfig::default_burst_time")]
    pub mem_burst_time: u32,

    /// Reset the machine state whenever a new program is assembled.
    #[serde(default = "MachineConfig::default_reset_at_assembly")]
    pub reset_at_assembly: bool,

    /// Emulate a small SPIM-style operating-system call set.
    #[serde(default)]
    pub osemu_enable: bool,
}

impl MachineConfig {
    /// Delay slots are the architectural default.
    fn default_delay_slot() -> bool {
        true
    }

    /// Returns the default memory read time in cycles.
    fn default_read_time() -> u32 {
        defaults::MEM_READ_TIME
    }

    /// Returns the default memory write time in cycles.
    fn default_write_time() -> u32 {
        defaults::MEM_WRITE_TIME
    }

    /// Returns the default burst word time in cycles.
    fn default_burst_time() -> u32 {
        defaults::MEM_BURST_TIME
    }

    /// Re-assembly resets the machine by default.
    fn default_reset_at_assembly() -> bool {
        true
    }
}

impl Default for MachineConfig {
    /// Creates the baseline configuration: single-cycle core with delay slot,
    /// both caches disabled, default memory timing.
    fn default() -> Self {
        Self {
            pipelined: false,
            delay_slot: true,
            hazard_unit: HazardUnit::default(),
            i_cache: CacheConfig::default(),
            d_cache: CacheConfig::default(),
            mem_read_time: defaults::MEM_READ_TIME,
            mem_write_time: defaults::MEM_WRITE_TIME,
            mem_burst_time: defaults::MEM_BURST_TIME,
            reset_at_assembly: true,
            osemu_enable: false,
        }
    }
}
