//! Simulation statistics collection and reporting.
//!
//! This module tracks performance counters for the simulator. It provides:
//! 1. **Cycle counts:** Total cycles and retired instructions.
//! 2. **Stalls:** Data-hazard bubbles, control flushes, and memory stalls.
//! 3. **Cache statistics:** Per-cache hit/miss/traffic counters and the
//!    derived speed improvement over an uncached baseline.
//!
//! All counters are monotonic; external observers get read-only snapshots.

/// Counters for one cache (instruction or data side).
///
/// `stall_cycles` accumulates the modelled miss penalty; `mem_reads` and
/// `mem_writes` count burst transfers as a single transaction each.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Accesses satisfied without touching memory.
    pub hits: u64,
    /// Accesses that required a memory transaction.
    pub misses: u64,
    /// Burst reads issued to backing memory.
    pub mem_reads: u64,
    /// Burst writes issued to backing memory (write-through or write-back).
    pub mem_writes: u64,
    /// Cycles the core would stall waiting on this cache.
    pub stall_cycles: u64,
}

impl CacheStats {
    /// Returns the total number of accesses (hits plus misses).
    pub const fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Returns the hit rate in percent, or 0 when no access happened.
    pub fn hit_rate(&self) -> f64 {
        let total = self.accesses();
        if total == 0 {
            return 0.0;
        }
        (self.hits as f64 / total as f64) * 100.0
    }

    /// Returns the emulated speed ratio versus running without a cache.
    ///
    /// The baseline charges every access the full memory latency; the cached
    /// run charges one cycle per hit plus the accumulated stall cycles.
    ///
    /// # Arguments
    ///
    /// * `mem_access_time` - Cycles one uncached access would cost.
    pub fn speed_improvement(&self, mem_access_time: u32) -> f64 {
        let total = self.accesses();
        if total == 0 {
            return 1.0;
        }
        let uncached = total * u64::from(mem_access_time.max(1));
        let cached = total + self.stall_cycles;
        uncached as f64 / cached.max(1) as f64
    }
}

/// Machine-level statistics for one run.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimStats {
    /// Total cycles elapsed on the machine clock.
    pub cycles: u64,
    /// Instructions retired (bubbles and squashed slots excluded).
    pub instructions: u64,
    /// Bubbles inserted for load-use hazards.
    pub stalls_data: u64,
    /// Slots flushed for taken branches and jumps.
    pub stalls_control: u64,
    /// Cycles the fetch stage waited on the memory port or I-cache.
    pub stalls_memory: u64,
    /// Traps taken.
    pub traps: u64,
    /// Instruction-side cache counters.
    pub i_cache: CacheStats,
    /// Data-side cache counters.
    pub d_cache: CacheStats,
}

impl SimStats {
    /// Returns cycles per instruction, guarding against empty runs.
    pub fn cpi(&self) -> f64 {
        if self.instructions == 0 {
            return 0.0;
        }
        self.cycles as f64 / self.instructions as f64
    }

    /// Prints the statistics report to stdout.
    ///
    /// # Arguments
    ///
    /// * `mem_read_time` - Uncached read latency used for the speed ratio.
    pub fn print(&self, mem_read_time: u32) {
        println!("==========================================");
        println!("SIMULATION STATISTICS");
        println!("==========================================");
        println!("cycles             {}", self.cycles);
        println!("instructions       {}", self.instructions);
        println!("cpi                {:.4}", self.cpi());
        println!("stalls.data        {}", self.stalls_data);
        println!("stalls.control     {}", self.stalls_control);
        println!("stalls.memory      {}", self.stalls_memory);
        println!("traps              {}", self.traps);
        println!("------------------------------------------");

        let print_cache = |name: &str, stats: &CacheStats| {
            println!(
                "  {:<4} accesses: {:<9} hits: {:<9} miss_rate: {:.2}%",
                name,
                stats.accesses(),
                stats.hits,
                100.0 - stats.hit_rate()
            );
            println!(
                "       mem_reads: {:<8} mem_writes: {:<7} stalls: {}",
                stats.mem_reads, stats.mem_writes, stats.stall_cycles
            );
            println!(
                "       speedup vs no cache: {:.2}x",
                stats.speed_improvement(mem_read_time)
            );
        };
        println!("CACHES");
        print_cache("I", &self.i_cache);
        print_cache("D", &self.d_cache);
        println!("==========================================");
    }
}
