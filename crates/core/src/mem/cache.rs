//! Set-associative L1 cache.
//!
//! This module implements the configurable cache fronting the physical
//! address space. It provides:
//! 1. **Geometry:** `S` sets of `A` ways, `W` data words per block, with the
//!    spec addressing `offset = (a/4) mod W`, `set = (a/(4W)) mod S`,
//!    `tag = a/(4WS)`.
//! 2. **Policies:** RAND/LRU/LFU replacement (lowest way wins ties) and the
//!    three write policies (write-back, write-through with and without
//!    allocation).
//! 3. **Statistics:** Monotonic hit/miss/traffic counters and the modelled
//!    stall cycles; a burst transfer counts as one memory transaction.
//!
//! Lines carry their data words, so the cache is functionally transparent:
//! the CPU observes identical values with the cache enabled or disabled.

use crate::common::{AccessSource, Address, MemWidth, Trap};
use crate::config::{CacheConfig, ReplacementPolicy, WritePolicy};
use crate::mem::MMIO_BASE;
use crate::mem::map::AddressSpace;
use crate::stats::CacheStats;

/// Memory timing parameters shared by both caches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemTiming {
    /// Cycles for the first word of a read burst.
    pub read_time: u32,
    /// Cycles for the first word of a write burst.
    pub write_time: u32,
    /// Cycles for each subsequent burst word.
    pub burst_time: u32,
}

impl MemTiming {
    /// Returns the cost of a full-block read burst.
    const fn read_burst(&self, block_words: u32) -> u64 {
        self.read_time as u64 + (block_words as u64 - 1) * self.burst_time as u64
    }

    /// Returns the cost of a full-block write burst.
    const fn write_burst(&self, block_words: u32) -> u64 {
        self.write_time as u64 + (block_words as u64 - 1) * self.burst_time as u64
    }
}

/// One cache line: tag, state bits, replacement metadata, and data words.
#[derive(Clone, Debug, Default)]
struct CacheLine {
    tag: u32,
    valid: bool,
    dirty: bool,
    last_tick: u64,
    uses: u64,
    data: Vec<u32>,
}

/// A set-associative L1 cache with configurable policies.
#[derive(Debug)]
pub struct Cache {
    cfg: CacheConfig,
    timing: MemTiming,
    /// Lines stored set-major: set `s`, way `w` lives at `s * ways + w`.
    lines: Vec<CacheLine>,
    stats: CacheStats,
    tick: u64,
    rng: u32,
}

impl Cache {
    /// Creates a cache from its configuration and the memory timing.
    pub fn new(cfg: CacheConfig, timing: MemTiming) -> Self {
        let sets = cfg.sets.max(1) as usize;
        let ways = cfg.ways.max(1) as usize;
        let words = cfg.block_words.max(1) as usize;
        let line = CacheLine {
            data: vec![0; words],
            ..CacheLine::default()
        };
        Self {
            cfg,
            timing,
            lines: vec![line; sets * ways],
            stats: CacheStats::default(),
            tick: 0,
            rng: 0,
        }
    }

    /// Returns a read-only snapshot of the statistics counters.
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Returns whether this cache is enabled.
    pub const fn enabled(&self) -> bool {
        self.cfg.enabled
    }

    /// Returns whether an address goes through the cache at all.
    ///
    /// The peripheral window is never cached; a cached serial-port read would
    /// swallow input characters into a stale line.
    fn cacheable(&self, addr: Address) -> bool {
        self.cfg.enabled && addr.val() < MMIO_BASE
    }

    /// Decomposes an address into `(set, tag, word offset)`.
    fn locate(&self, addr: Address) -> (usize, u32, usize) {
        let word = addr.word_index();
        let w = self.cfg.block_words.max(1);
        let s = self.cfg.sets.max(1);
        let offset = (word % w) as usize;
        let set = ((word / w) % s) as usize;
        let tag = word / (w * s);
        (set, tag, offset)
    }

    /// Returns the base address of the block with the given tag and set.
    fn block_addr(&self, tag: u32, set: usize) -> Address {
        let w = self.cfg.block_words.max(1);
        let s = self.cfg.sets.max(1);
        Address::new((tag * s + set as u32) * w * 4)
    }

    /// Probes a set for the tag; returns the hit way.
    fn probe(&self, set: usize, tag: u32) -> Option<usize> {
        let ways = self.cfg.ways.max(1) as usize;
        let base = set * ways;
        (0..ways).find(|&way| {
            let line = &self.lines[base + way];
            line.valid && line.tag == tag
        })
    }

    /// Updates replacement metadata for an accessed way.
    fn touch(&mut self, set: usize, way: usize) {
        let ways = self.cfg.ways.max(1) as usize;
        let line = &mut self.lines[set * ways + way];
        line.last_tick = self.tick;
        line.uses += 1;
    }

    /// Advances the xorshift generator used by random replacement.
    fn next_random(&mut self) -> u32 {
        // Seeded from the access tick so runs are reproducible per cycle count.
        if self.rng == 0 {
            self.rng = (self.tick as u32) | 1;
        }
        self.rng ^= self.rng << 13;
        self.rng ^= self.rng >> 17;
        self.rng ^= self.rng << 5;
        self.rng
    }

    /// Selects the victim way for a fill into the given set.
    ///
    /// Invalid ways are used first; among valid candidates the configured
    /// policy decides, with the lowest way index winning metadata ties.
    fn select_victim(&mut self, set: usize) -> usize {
        let ways = self.cfg.ways.max(1) as usize;
        let base = set * ways;

        if let Some(way) = (0..ways).find(|&way| !self.lines[base + way].valid) {
            return way;
        }

        match self.cfg.replacement {
            ReplacementPolicy::Rand => (self.next_random() as usize) % ways,
            ReplacementPolicy::Lru => (0..ways)
                .min_by_key(|&way| self.lines[base + way].last_tick)
                .unwrap_or(0),
            ReplacementPolicy::Lfu => (0..ways)
                .min_by_key(|&way| self.lines[base + way].uses)
                .unwrap_or(0),
        }
    }

    /// Writes the victim's block back to memory (write-back policy only).
    fn write_back(&mut self, space: &mut AddressSpace, set: usize, way: usize) -> Result<(), Trap> {
        let ways = self.cfg.ways.max(1) as usize;
        let words = self.cfg.block_words.max(1);
        let (tag, data) = {
            let line = &self.lines[set * ways + way];
            (line.tag, line.data.clone())
        };
        let base = self.block_addr(tag, set);
        for (i, word) in data.iter().enumerate() {
            space.write(
                base.wrapping_add(i as u32 * 4),
                MemWidth::Word,
                *word,
                AccessSource::Burst,
            )?;
        }
        self.stats.mem_writes += 1;
        self.stats.stall_cycles += self.timing.write_burst(words);
        self.lines[set * ways + way].dirty = false;
        Ok(())
    }

    /// Fills a line from memory and installs tag/state.
    ///
    /// Replacement metadata is reset; LFU starts counting again from the
    /// access that caused the fill.
    fn fill(
        &mut self,
        space: &mut AddressSpace,
        set: usize,
        way: usize,
        tag: u32,
    ) -> Result<(), Trap> {
        let ways = self.cfg.ways.max(1) as usize;
        let words = self.cfg.block_words.max(1);
        let base = self.block_addr(tag, set);

        let mut data = vec![0u32; words as usize];
        for (i, slot) in data.iter_mut().enumerate() {
            *slot = space.read(
                base.wrapping_add(i as u32 * 4),
                MemWidth::Word,
                AccessSource::Burst,
            )?;
        }

        let line = &mut self.lines[set * ways + way];
        line.tag = tag;
        line.valid = true;
        line.dirty = false;
        line.uses = 0;
        line.last_tick = self.tick;
        line.data = data;

        self.stats.mem_reads += 1;
        self.stats.stall_cycles += self.timing.read_burst(words);
        Ok(())
    }

    /// Extracts a sub-word lane from a cached word (big-endian view).
    const fn extract_lane(word: u32, addr: Address, width: MemWidth) -> u32 {
        match width {
            MemWidth::Word => word,
            MemWidth::Half => (word >> (8 * (2 - (addr.val() & 2)))) & 0xFFFF,
            MemWidth::Byte => (word >> (8 * (3 - (addr.val() & 3)))) & 0xFF,
        }
    }

    /// Merges a sub-word lane into a cached word (big-endian view).
    const fn merge_lane(word: u32, addr: Address, width: MemWidth, value: u32) -> u32 {
        match width {
            MemWidth::Word => value,
            MemWidth::Half => {
                let shift = 8 * (2 - (addr.val() & 2));
                (word & !(0xFFFF << shift)) | ((value & 0xFFFF) << shift)
            }
            MemWidth::Byte => {
                let shift = 8 * (3 - (addr.val() & 3));
                (word & !(0xFF << shift)) | ((value & 0xFF) << shift)
            }
        }
    }

    /// Reads through the cache.
    ///
    /// Hits update replacement metadata; misses select a victim, write it
    /// back when dirty under write-back, and fill the block as one burst.
    /// Debugger probes see the coherent value without perturbing metadata,
    /// statistics, or line contents.
    ///
    /// # Errors
    ///
    /// Alignment and bus errors propagate from the address space.
    pub fn read(
        &mut self,
        space: &mut AddressSpace,
        addr: Address,
        width: MemWidth,
        source: AccessSource,
    ) -> Result<u32, Trap> {
        if addr.val() & width.align_mask() != 0 {
            return Err(Trap::UnalignedAccess(addr));
        }
        if !self.cacheable(addr) {
            return space.read(addr, width, source);
        }

        let (set, tag, offset) = self.locate(addr);

        if source == AccessSource::Debugger {
            let ways = self.cfg.ways.max(1) as usize;
            if let Some(way) = self.probe(set, tag) {
                let word = self.lines[set * ways + way].data[offset];
                return Ok(Self::extract_lane(word, addr, width));
            }
            return space.read(addr, width, source);
        }

        self.tick += 1;

        let way = match self.probe(set, tag) {
            Some(way) => {
                self.stats.hits += 1;
                way
            }
            None => {
                self.stats.misses += 1;
                let way = self.select_victim(set);
                let ways = self.cfg.ways.max(1) as usize;
                if self.cfg.write_policy == WritePolicy::WriteBack
                    && self.lines[set * ways + way].valid
                    && self.lines[set * ways + way].dirty
                {
                    self.write_back(space, set, way)?;
                }
                self.fill(space, set, way, tag)?;
                way
            }
        };

        self.touch(set, way);
        let ways = self.cfg.ways.max(1) as usize;
        let word = self.lines[set * ways + way].data[offset];
        Ok(Self::extract_lane(word, addr, width))
    }

    /// Writes through the cache according to the configured write policy.
    ///
    /// Write-back allocates on miss and defers memory traffic to eviction;
    /// write-through always stores to memory, allocating on miss only in the
    /// allocate variant. Under write-through the dirty bit is never set.
    ///
    /// # Errors
    ///
    /// Alignment and bus errors propagate from the address space.
    pub fn write(
        &mut self,
        space: &mut AddressSpace,
        addr: Address,
        width: MemWidth,
        value: u32,
        source: AccessSource,
    ) -> Result<(), Trap> {
        if addr.val() & width.align_mask() != 0 {
            return Err(Trap::UnalignedAccess(addr));
        }
        if !self.cacheable(addr) {
            return space.write(addr, width, value, source);
        }

        let (set, tag, offset) = self.locate(addr);
        let ways = self.cfg.ways.max(1) as usize;

        if source == AccessSource::Debugger {
            // Keep any resident copy coherent, then write memory.
            if let Some(way) = self.probe(set, tag) {
                let line = &mut self.lines[set * ways + way];
                line.data[offset] = Self::merge_lane(line.data[offset], addr, width, value);
            }
            return space.write(addr, width, value, source);
        }

        self.tick += 1;

        match self.cfg.write_policy {
            WritePolicy::WriteBack => {
                let way = match self.probe(set, tag) {
                    Some(way) => {
                        self.stats.hits += 1;
                        way
                    }
                    None => {
                        self.stats.misses += 1;
                        let way = self.select_victim(set);
                        if self.lines[set * ways + way].valid
                            && self.lines[set * ways + way].dirty
                        {
                            self.write_back(space, set, way)?;
                        }
                        self.fill(space, set, way, tag)?;
                        way
                    }
                };
                let line = &mut self.lines[set * ways + way];
                line.data[offset] = Self::merge_lane(line.data[offset], addr, width, value);
                line.dirty = true;
                self.touch(set, way);
            }

            WritePolicy::WriteThroughNoalloc => {
                space.write(addr, width, value, source)?;
                self.stats.mem_writes += 1;
                self.stats.stall_cycles += u64::from(self.timing.write_time);
                if let Some(way) = self.probe(set, tag) {
                    self.stats.hits += 1;
                    let line = &mut self.lines[set * ways + way];
                    line.data[offset] = Self::merge_lane(line.data[offset], addr, width, value);
                    self.touch(set, way);
                } else {
                    self.stats.misses += 1;
                }
            }

            WritePolicy::WriteThroughAlloc => {
                space.write(addr, width, value, source)?;
                self.stats.mem_writes += 1;
                self.stats.stall_cycles += u64::from(self.timing.write_time);
                let way = match self.probe(set, tag) {
                    Some(way) => {
                        self.stats.hits += 1;
                        way
                    }
                    None => {
                        self.stats.misses += 1;
                        let way = self.select_victim(set);
                        // Dirty lines cannot exist under write-through.
                        self.fill(space, set, way, tag)?;
                        way
                    }
                };
                let line = &mut self.lines[set * ways + way];
                line.data[offset] = Self::merge_lane(line.data[offset], addr, width, value);
                self.touch(set, way);
            }
        }
        Ok(())
    }

    /// Writes back every dirty line and invalidates the whole cache.
    ///
    /// After a flush no dirty line remains and memory equals the pre-flush
    /// cached view.
    ///
    /// # Errors
    ///
    /// Bus errors propagate from the address space during write-back.
    pub fn flush(&mut self, space: &mut AddressSpace) -> Result<(), Trap> {
        if !self.cfg.enabled {
            return Ok(());
        }
        let sets = self.cfg.sets.max(1) as usize;
        let ways = self.cfg.ways.max(1) as usize;
        for set in 0..sets {
            for way in 0..ways {
                let index = set * ways + way;
                if self.lines[index].valid && self.lines[index].dirty {
                    self.write_back(space, set, way)?;
                }
                self.lines[index].valid = false;
            }
        }
        Ok(())
    }

    /// Drops every line without writing back.
    ///
    /// Used when memory was mutated behind the cache's back (assembler
    /// rewriting code, loaders); cached copies are stale by definition.
    pub fn invalidate(&mut self) {
        for line in &mut self.lines {
            line.valid = false;
            line.dirty = false;
        }
    }
}
