//! Program loaders.
//!
//! This module populates the simulated memory from the outside world:
//! 1. **ELF images:** 32-bit big-endian MIPS executables; program segments
//!    land in memory, the symbol table (including `_halt`) lands in the
//!    machine symbol table, and the entry point becomes the initial PC.
//! 2. **Load-range files:** ASCII, one unsigned integer per non-empty line
//!    (decimal, `0x` hex, `0` octal, or `0b` binary), written sequentially
//!    as words.
//! 3. **Dump-range output:** text hex dump, one word per line, addresses
//!    ascending.

use object::{Architecture, Object, ObjectSegment, ObjectSymbol};
use thiserror::Error;
use tracing::debug;

use crate::common::{AccessSource, Address};
use crate::mem::{AddressSpace, SymbolTable};

/// Errors raised while loading a program image.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The file could not be read.
    #[error("cannot read '{0}': {1}")]
    Io(String, std::io::Error),

    /// The image is not a valid object file.
    #[error("malformed image: {0}")]
    Parse(String),

    /// The image is not 32-bit big-endian MIPS.
    #[error("unsupported image: expected 32-bit big-endian MIPS")]
    WrongArchitecture,

    /// A segment or word landed outside mapped memory.
    #[error("image data at {0:#010x} falls outside mapped memory")]
    Unmapped(u32),

    /// A line of a load-range file is not an integer.
    #[error("line {0}: bad integer '{1}'")]
    BadInteger(usize, String),
}

/// Result of a successful ELF load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadedImage {
    /// Entry point from the ELF header.
    pub entry: Address,
    /// Number of symbols added to the symbol table.
    pub symbols: usize,
}

/// Loads an ELF image into memory and its symbols into the symbol table.
///
/// The ELF loading contract is deliberately small: populate memory, populate
/// the symbol table, report the entry point.
///
/// # Errors
///
/// [`LoaderError`] on malformed images, wrong architecture, or segments
/// outside mapped memory.
pub fn load_elf(
    space: &mut AddressSpace,
    symtab: &mut SymbolTable,
    bytes: &[u8],
) -> Result<LoadedImage, LoaderError> {
    let file = object::File::parse(bytes).map_err(|e| LoaderError::Parse(e.to_string()))?;

    if file.architecture() != Architecture::Mips || file.is_little_endian() || file.is_64() {
        return Err(LoaderError::WrongArchitecture);
    }

    for segment in file.segments() {
        let addr = segment.address() as u32;
        let data = segment
            .data()
            .map_err(|e| LoaderError::Parse(e.to_string()))?;
        if data.is_empty() {
            continue;
        }
        space
            .write_range(Address::new(addr), data, AccessSource::Debugger)
            .map_err(|_| LoaderError::Unmapped(addr))?;
        debug!(target: "mipsim::loader", addr = %format_args!("{addr:#010x}"), len = data.len(), "segment");
    }

    let mut symbols = 0;
    for symbol in file.symbols() {
        let Ok(name) = symbol.name() else { continue };
        if name.is_empty() {
            continue;
        }
        symtab.set(name, symbol.address() as u32);
        symbols += 1;
    }

    let entry = Address::new(file.entry() as u32);
    debug!(target: "mipsim::loader", entry = %entry, symbols, "loaded");
    Ok(LoadedImage { entry, symbols })
}

/// Reads an ELF image from disk and loads it.
///
/// # Errors
///
/// Same contract as [`load_elf`], plus I/O failures.
pub fn load_elf_file(
    space: &mut AddressSpace,
    symtab: &mut SymbolTable,
    path: &str,
) -> Result<LoadedImage, LoaderError> {
    let bytes = std::fs::read(path).map_err(|e| LoaderError::Io(path.to_string(), e))?;
    load_elf(space, symtab, &bytes)
}

/// Parses load-range file content into words.
///
/// One unsigned integer per non-empty line, any standard base.
///
/// # Errors
///
/// [`LoaderError::BadInteger`] naming the offending line.
pub fn parse_load_file(text: &str) -> Result<Vec<u32>, LoaderError> {
    let mut words = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parsed = if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            u32::from_str_radix(hex, 16)
        } else if let Some(bin) = trimmed
            .strip_prefix("0b")
            .or_else(|| trimmed.strip_prefix("0B"))
        {
            u32::from_str_radix(bin, 2)
        } else if trimmed.len() > 1 && trimmed.starts_with('0') {
            u32::from_str_radix(&trimmed[1..], 8)
        } else {
            trimmed.parse::<u32>()
        };
        match parsed {
            Ok(word) => words.push(word),
            Err(_) => return Err(LoaderError::BadInteger(index + 1, trimmed.to_string())),
        }
    }
    Ok(words)
}

/// Formats words as a dump-range hex listing.
pub fn format_dump(words: &[u32]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(words.len() * 9);
    for word in words {
        let _ = writeln!(out, "{word:08x}");
    }
    out
}
