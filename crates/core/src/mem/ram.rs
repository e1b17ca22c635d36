//! Paged RAM backend.
//!
//! This module implements the main memory of the machine as a page table of
//! fixed-size pages allocated on first write. It provides:
//! 1. **Sparse storage:** Reads from never-written pages return zero without
//!    allocating; a 512 MiB range costs nothing until touched.
//! 2. **Word layout:** Pages hold words; byte access extracts the big-endian
//!    lane so the architectural view round-trips through byte reads.
//! 3. **Generation counter:** Incremented on every external mutation so the
//!    machine knows when cached copies must be synced.

use std::collections::HashMap;

use crate::common::AccessSource;
use crate::mem::traits::Backend;

/// Words per RAM page.
pub const PAGE_WORDS: u32 = 256;
/// Bytes per RAM page.
pub const PAGE_BYTES: u32 = PAGE_WORDS * 4;

/// Main memory: a demand-allocated page table over a fixed-size range.
#[derive(Debug)]
pub struct Ram {
    size: u32,
    pages: HashMap<u32, Box<[u32; PAGE_WORDS as usize]>>,
    generation: u64,
}

impl Ram {
    /// Creates a RAM backend covering `size` bytes.
    ///
    /// # Arguments
    ///
    /// * `size` - Range size in bytes; rounded up to a whole page.
    pub fn new(size: u32) -> Self {
        let size = size.div_ceil(PAGE_BYTES).saturating_mul(PAGE_BYTES);
        Self {
            size,
            pages: HashMap::new(),
            generation: 0,
        }
    }

    /// Returns the mutation generation; bumped on every write.
    ///
    /// The machine compares generations to decide when externally mutated
    /// memory (assembler output, loaders) requires a cache sync.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the number of pages currently allocated.
    pub fn allocated_pages(&self) -> usize {
        self.pages.len()
    }

    /// Reads the aligned word containing the given byte offset.
    fn word_at(&self, offset: u32) -> u32 {
        let page = offset / PAGE_BYTES;
        self.pages.get(&page).map_or(0, |words| {
            words[((offset % PAGE_BYTES) / 4) as usize]
        })
    }

    /// Returns the word slot for the given byte offset, allocating its page.
    fn word_mut(&mut self, offset: u32) -> &mut u32 {
        let page = offset / PAGE_BYTES;
        let words = self
            .pages
            .entry(page)
            .or_insert_with(|| Box::new([0u32; PAGE_WORDS as usize]));
        &mut words[((offset % PAGE_BYTES) / 4) as usize]
    }
}

impl Backend for Ram {
    fn name(&self) -> &'static str {
        "ram"
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn read_byte(&mut self, offset: u32, _source: AccessSource) -> u8 {
        let word = self.word_at(offset);
        // Big-endian lane select: offset 0 is bits 31..24.
        (word >> (8 * (3 - (offset & 3)))) as u8
    }

    fn write_byte(&mut self, offset: u32, value: u8, _source: AccessSource) {
        let shift = 8 * (3 - (offset & 3));
        let slot = self.word_mut(offset);
        *slot = (*slot & !(0xFF << shift)) | (u32::from(value) << shift);
        self.generation += 1;
    }

    fn read(&mut self, offset: u32, width: crate::common::MemWidth, _source: AccessSource) -> u32 {
        use crate::common::MemWidth;
        let word = self.word_at(offset);
        match width {
            MemWidth::Word => word,
            MemWidth::Half => (word >> (8 * (2 - (offset & 2)))) & 0xFFFF,
            MemWidth::Byte => (word >> (8 * (3 - (offset & 3)))) & 0xFF,
        }
    }

    fn write(
        &mut self,
        offset: u32,
        width: crate::common::MemWidth,
        value: u32,
        _source: AccessSource,
    ) {
        use crate::common::MemWidth;
        let slot = self.word_mut(offset);
        match width {
            MemWidth::Word => *slot = value,
            MemWidth::Half => {
                let shift = 8 * (2 - (offset & 2));
                *slot = (*slot & !(0xFFFF << shift)) | ((value & 0xFFFF) << shift);
            }
            MemWidth::Byte => {
                let shift = 8 * (3 - (offset & 3));
                *slot = (*slot & !(0xFF << shift)) | ((value & 0xFF) << shift);
            }
        }
        self.generation += 1;
    }
}
