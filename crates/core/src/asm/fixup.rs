//! Assembler fix-ups.
//!
//! A fix-up is a deferred write whose value depends on symbols not yet
//! defined when the statement was assembled. Records live until `finish()`,
//! which evaluates each expression against the final symbol table and
//! patches the affected field of the already-emitted word.

use crate::asm::error::{AsmErrorKind, SourceLoc};
use crate::asm::expr::{EvalError, Expr};
use crate::common::{AccessSource, Address, MemWidth, Trap};
use crate::isa::Relocation;
use crate::mem::{AddressSpace, SymbolTable};

/// A deferred patch of one emitted word.
#[derive(Clone, Debug, PartialEq)]
pub struct Fixup {
    /// Address of the word to patch.
    pub addr: Address,
    /// Which field of the word the value lands in.
    pub kind: Relocation,
    /// The unresolved expression.
    pub expr: Expr,
    /// Value of the location cursor where the statement appeared.
    pub dot: u32,
    /// Source location for diagnostics.
    pub loc: SourceLoc,
}

impl Fixup {
    /// Resolves this fix-up and patches the emitted word.
    ///
    /// # Errors
    ///
    /// Undefined-symbol, range, and reachability diagnostics.
    pub fn apply(&self, space: &mut AddressSpace, symtab: &SymbolTable) -> Result<(), AsmErrorKind> {
        let value = self.expr.eval(symtab, self.dot).map_err(|err| match err {
            EvalError::Unresolved(name) => AsmErrorKind::UndefinedSymbol(name),
            EvalError::DivisionByZero => AsmErrorKind::DivisionByZero,
        })?;

        let patched = if self.kind == Relocation::Word32 {
            value as u32
        } else {
            let word = space
                .read(self.addr, MemWidth::Word, AccessSource::Debugger)
                .map_err(|trap| trap_to_kind(&trap))?;
            self.patch_field(word, value)?
        };

        space
            .write(self.addr, MemWidth::Word, patched, AccessSource::Debugger)
            .map_err(|trap| trap_to_kind(&trap))
    }

    /// Splices the resolved value into the word's relocated field.
    fn patch_field(&self, word: u32, value: i64) -> Result<u32, AsmErrorKind> {
        let patched = match self.kind {
            // Word32 is handled by the caller; it replaces the whole word.
            Relocation::Word32 => value as u32,
            Relocation::Hi16 => (word & 0xFFFF_0000) | (((value as u32) >> 16) & 0xFFFF),
            Relocation::Lo16 => (word & 0xFFFF_0000) | ((value as u32) & 0xFFFF),
            Relocation::PcRel16 => {
                let target = value as u32;
                if target & 3 != 0 {
                    return Err(AsmErrorKind::OutOfRange(value, "branch target alignment"));
                }
                let base = self.addr.wrapping_add(4).val();
                let disp = i64::from(target.wrapping_sub(base) as i32) >> 2;
                if !(-32768..=32767).contains(&disp) {
                    return Err(AsmErrorKind::OutOfRange(disp, "16-bit branch offset"));
                }
                (word & 0xFFFF_0000) | ((disp as u32) & 0xFFFF)
            }
            Relocation::Abs26 => {
                let target = value as u32;
                if target & 3 != 0 {
                    return Err(AsmErrorKind::OutOfRange(value, "jump target alignment"));
                }
                let base = self.addr.wrapping_add(4).val();
                if target & 0xF000_0000 != base & 0xF000_0000 {
                    return Err(AsmErrorKind::Unreachable(target, self.addr.val()));
                }
                (word & 0xFC00_0000) | ((target >> 2) & 0x03FF_FFFF)
            }
        };
        Ok(patched)
    }
}

/// Maps a memory trap during patching to a diagnostic kind.
fn trap_to_kind(trap: &Trap) -> AsmErrorKind {
    match trap {
        Trap::BusError(addr) => AsmErrorKind::UnmappedWrite(addr.val()),
        other => AsmErrorKind::Syntax(other.to_string()),
    }
}
