//! Integrated assembler.
//!
//! A single-pass assembler with fix-ups: pass 1 tokenizes statements,
//! assigns addresses per section (`.` is the current address), emits words
//! into the simulated memory, and records symbol definitions plus fix-up
//! records for forward references. `finish()` is the second pass: it
//! evaluates every fix-up against the final symbol table, patches the
//! memory image, and reports whether any diagnostic was emitted; only then
//! is the result valid.
//!
//! Diagnostics are collected rather than fail-fast, so one run surfaces
//! every problem in the source.

/// Statement encoder and pseudo-instruction expansion.
pub mod encoder;
/// Diagnostics.
pub mod error;
/// Expression trees and evaluation.
pub mod expr;
/// Deferred fix-up records.
pub mod fixup;
/// Line tokenizer.
pub mod lexer;
/// Include content providers.
pub mod provider;

use std::collections::BTreeSet;

use tracing::debug;

use crate::common::{AccessSource, Address, MemWidth};
use crate::mem::{AddressSpace, SymbolTable};
use self::encoder::Context;
use self::error::{AsmErrorKind, Diagnostic, SourceLoc};
use self::expr::EvalError;
use self::fixup::Fixup;
use self::lexer::{Line, Token};
use self::provider::SourceProvider;

pub use self::error::{AsmErrorKind as ErrorKind, Diagnostic as AsmDiagnostic};
pub use self::provider::{FileProvider, NullProvider, ProviderError};

/// Default origin of the text section.
pub const TEXT_BASE: u32 = 0x0040_0000;
/// Default origin of the data section.
pub const DATA_BASE: u32 = 0x1001_0000;
/// Maximum `.include` nesting before a cycle is assumed.
const MAX_INCLUDE_DEPTH: usize = 16;

/// Which section the location cursor is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Text,
    Data,
}

/// Result of `finish()`.
#[derive(Clone, Debug, Default)]
pub struct AsmResult {
    /// True when no diagnostic was emitted; only then is the image valid.
    pub ok: bool,
    /// Every collected diagnostic, in source order.
    pub diagnostics: Vec<Diagnostic>,
    /// `#pragma` statements encountered, as `(line, text)` pairs.
    pub pragmas: Vec<(usize, String)>,
}

/// The integrated assembler.
///
/// Borrows the machine's address space and symbol table for the duration of
/// one assembly; all state is released by [`Assembler::finish`].
pub struct Assembler<'a> {
    space: &'a mut AddressSpace,
    symtab: &'a mut SymbolTable,
    provider: &'a dyn SourceProvider,
    diagnostics: Vec<Diagnostic>,
    fixups: Vec<Fixup>,
    pragmas: Vec<(usize, String)>,
    globals: BTreeSet<String>,
    text_dot: u32,
    data_dot: u32,
    section: Section,
    include_depth: usize,
}

impl std::fmt::Debug for Assembler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assembler")
            .field("text_dot", &self.text_dot)
            .field("data_dot", &self.data_dot)
            .field("diagnostics", &self.diagnostics.len())
            .field("fixups", &self.fixups.len())
            .finish_non_exhaustive()
    }
}

impl<'a> Assembler<'a> {
    /// Creates an assembler over the machine's memory and symbols.
    pub fn new(
        space: &'a mut AddressSpace,
        symtab: &'a mut SymbolTable,
        provider: &'a dyn SourceProvider,
    ) -> Self {
        Self {
            space,
            symtab,
            provider,
            diagnostics: Vec::new(),
            fixups: Vec::new(),
            pragmas: Vec::new(),
            globals: BTreeSet::new(),
            text_dot: TEXT_BASE,
            data_dot: DATA_BASE,
            section: Section::Text,
            include_depth: 0,
        }
    }

    /// Assembles one source text (pass 1).
    ///
    /// May be called repeatedly before `finish()`; sections continue where
    /// the previous source left them.
    pub fn assemble(&mut self, source: &str, file: &str) {
        debug!(target: "mipsim::asm", file, "pass 1");
        for (index, text) in source.lines().enumerate() {
            let loc = SourceLoc {
                file: file.to_string(),
                line: index + 1,
            };
            self.process_line(text, &loc);
        }
    }

    /// Resolves fix-ups (pass 2) and reports the outcome.
    pub fn finish(mut self) -> AsmResult {
        debug!(target: "mipsim::asm", fixups = self.fixups.len(), "pass 2");
        let fixups = std::mem::take(&mut self.fixups);
        for fixup in fixups {
            if let Err(kind) = fixup.apply(self.space, self.symtab) {
                self.diagnostics.push(Diagnostic {
                    kind,
                    loc: fixup.loc.clone(),
                });
            }
        }
        AsmResult {
            ok: self.diagnostics.is_empty(),
            diagnostics: self.diagnostics,
            pragmas: self.pragmas,
        }
    }

    /// Returns the current location cursor.
    const fn dot(&self) -> u32 {
        match self.section {
            Section::Text => self.text_dot,
            Section::Data => self.data_dot,
        }
    }

    /// Sets the current location cursor.
    fn set_dot(&mut self, value: u32) {
        match self.section {
            Section::Text => self.text_dot = value,
            Section::Data => self.data_dot = value,
        }
    }

    /// Aligns the cursor up to a power-of-two byte boundary.
    fn align(&mut self, bytes: u32) {
        let mask = bytes - 1;
        self.set_dot((self.dot() + mask) & !mask);
    }

    fn report(&mut self, kind: AsmErrorKind, loc: &SourceLoc) {
        self.diagnostics.push(Diagnostic {
            kind,
            loc: loc.clone(),
        });
    }

    /// Emits one value of the given width at the cursor and advances it.
    fn emit(&mut self, width: MemWidth, value: u32, loc: &SourceLoc) {
        let addr = Address::new(self.dot());
        if let Err(trap) = self.space.write(addr, width, value, AccessSource::Debugger) {
            self.report(AsmErrorKind::UnmappedWrite(trap.bad_addr().map_or(addr.val(), Address::val)), loc);
        }
        self.set_dot(self.dot() + width.bytes());
    }

    /// Processes one source line.
    fn process_line(&mut self, text: &str, loc: &SourceLoc) {
        let line = match lexer::tokenize(text) {
            Ok(line) => line,
            Err(kind) => {
                self.report(kind, loc);
                return;
            }
        };

        let mut tokens = match line {
            Line::Empty => return,
            Line::Pragma(text) => {
                self.pragmas.push((loc.line, text));
                return;
            }
            Line::Tokens(tokens) => tokens,
        };

        // Leading labels: `name:` pairs, any number.
        while tokens.len() >= 2
            && matches!(tokens[0], Token::Ident(_))
            && matches!(tokens[1], Token::Colon)
        {
            if let Token::Ident(name) = &tokens[0] {
                if let Err(previous) = self.symtab.define(name, self.dot()) {
                    self.report(AsmErrorKind::DuplicateSymbol(name.clone(), previous), loc);
                }
            }
            let _ = tokens.drain(..2);
        }

        match tokens.first().cloned() {
            None => {}
            Some(Token::Directive(name)) => self.handle_directive(&name, &tokens[1..], loc),
            Some(Token::Ident(name)) => {
                self.handle_instruction(&name.to_ascii_lowercase(), &tokens[1..], loc);
            }
            Some(other) => {
                self.report(
                    AsmErrorKind::Syntax(format!("expected statement, found {other:?}")),
                    loc,
                );
            }
        }
    }

    /// Evaluates an expression that must resolve during pass 1.
    fn eval_now(&mut self, e: &expr::Expr, loc: &SourceLoc) -> Option<i64> {
        match e.eval(self.symtab, self.dot()) {
            Ok(value) => Some(value),
            Err(EvalError::Unresolved(name)) => {
                self.report(AsmErrorKind::UndefinedSymbol(name), loc);
                None
            }
            Err(EvalError::DivisionByZero) => {
                self.report(AsmErrorKind::DivisionByZero, loc);
                None
            }
        }
    }

    /// Parses comma-separated expressions from the operand tokens.
    fn expr_list(&mut self, tokens: &[Token], loc: &SourceLoc) -> Vec<expr::Expr> {
        let mut out = Vec::new();
        let mut rest = tokens;
        loop {
            match expr::parse(rest) {
                Ok((parsed, used)) => {
                    out.push(parsed);
                    rest = &rest[used..];
                }
                Err(kind) => {
                    self.report(kind, loc);
                    return out;
                }
            }
            match rest.first() {
                None => return out,
                Some(Token::Comma) => rest = &rest[1..],
                Some(other) => {
                    self.report(
                        AsmErrorKind::Syntax(format!("expected ',', found {other:?}")),
                        loc,
                    );
                    return out;
                }
            }
        }
    }

    /// Handles one directive.
    fn handle_directive(&mut self, name: &str, operands: &[Token], loc: &SourceLoc) {
        match name {
            "text" => self.section = Section::Text,
            "data" => self.section = Section::Data,

            "org" => {
                let exprs = self.expr_list(operands, loc);
                if let Some(e) = exprs.first() {
                    if let Some(value) = self.eval_now(e, loc) {
                        self.set_dot(value as u32);
                    }
                } else {
                    self.report(AsmErrorKind::Syntax(".org needs an address".to_string()), loc);
                }
            }

            "word" => {
                self.align(4);
                for e in self.expr_list(operands, loc) {
                    match e.eval(self.symtab, self.dot()) {
                        Ok(value) => self.emit(MemWidth::Word, value as u32, loc),
                        Err(EvalError::Unresolved(_)) => {
                            self.fixups.push(Fixup {
                                addr: Address::new(self.dot()),
                                kind: crate::isa::Relocation::Word32,
                                expr: e,
                                dot: self.dot(),
                                loc: loc.clone(),
                            });
                            self.emit(MemWidth::Word, 0, loc);
                        }
                        Err(EvalError::DivisionByZero) => {
                            self.report(AsmErrorKind::DivisionByZero, loc);
                        }
                    }
                }
            }

            "half" => {
                self.align(2);
                for e in self.expr_list(operands, loc) {
                    if let Some(value) = self.eval_now(&e, loc) {
                        if !(-32768..=65535).contains(&value) {
                            self.report(AsmErrorKind::OutOfRange(value, "16-bit datum"), loc);
                        } else {
                            self.emit(MemWidth::Half, value as u32, loc);
                        }
                    }
                }
            }

            "byte" => {
                for e in self.expr_list(operands, loc) {
                    if let Some(value) = self.eval_now(&e, loc) {
                        if !(-128..=255).contains(&value) {
                            self.report(AsmErrorKind::OutOfRange(value, "8-bit datum"), loc);
                        } else {
                            self.emit(MemWidth::Byte, value as u32, loc);
                        }
                    }
                }
            }

            "ascii" | "asciz" => {
                let mut any = false;
                for token in operands {
                    match token {
                        Token::Str(text) => {
                            any = true;
                            for byte in text.bytes() {
                                self.emit(MemWidth::Byte, u32::from(byte), loc);
                            }
                            if name == "asciz" {
                                self.emit(MemWidth::Byte, 0, loc);
                            }
                        }
                        Token::Comma => {}
                        other => {
                            self.report(
                                AsmErrorKind::Syntax(format!("expected string, found {other:?}")),
                                loc,
                            );
                            return;
                        }
                    }
                }
                if !any {
                    self.report(AsmErrorKind::Syntax(format!(".{name} needs a string")), loc);
                }
            }

            "space" | "skip" => {
                let exprs = self.expr_list(operands, loc);
                let Some(count) = exprs.first().and_then(|e| self.eval_now(&e.clone(), loc)) else {
                    self.report(AsmErrorKind::Syntax(format!(".{name} needs a size")), loc);
                    return;
                };
                if count < 0 {
                    self.report(AsmErrorKind::OutOfRange(count, "space size"), loc);
                    return;
                }
                let fill = exprs
                    .get(1)
                    .and_then(|e| self.eval_now(&e.clone(), loc))
                    .unwrap_or(0) as u32;
                for _ in 0..count {
                    self.emit(MemWidth::Byte, fill & 0xFF, loc);
                }
            }

            "set" | "equ" => {
                let Some(Token::Ident(symbol)) = operands.first().cloned() else {
                    self.report(AsmErrorKind::Syntax(format!(".{name} needs a name")), loc);
                    return;
                };
                if !matches!(operands.get(1), Some(Token::Comma)) {
                    self.report(AsmErrorKind::Syntax("expected ','".to_string()), loc);
                    return;
                }
                match expr::parse(&operands[2..]) {
                    Ok((e, _)) => {
                        if let Some(value) = self.eval_now(&e, loc) {
                            self.symtab.set(&symbol, value as u32);
                        }
                    }
                    Err(kind) => self.report(kind, loc),
                }
            }

            "globl" | "global" => {
                for token in operands {
                    match token {
                        Token::Ident(symbol) => {
                            let _ = self.globals.insert(symbol.clone());
                        }
                        Token::Comma => {}
                        other => {
                            self.report(
                                AsmErrorKind::Syntax(format!("expected symbol, found {other:?}")),
                                loc,
                            );
                            return;
                        }
                    }
                }
            }

            "include" => {
                let Some(Token::Str(path)) = operands.first().cloned() else {
                    self.report(
                        AsmErrorKind::Syntax(".include needs a quoted path".to_string()),
                        loc,
                    );
                    return;
                };
                if self.include_depth >= MAX_INCLUDE_DEPTH {
                    self.report(AsmErrorKind::IncludeDepth(MAX_INCLUDE_DEPTH), loc);
                    return;
                }
                match self.provider.resolve(&path) {
                    Ok(source) => {
                        self.include_depth += 1;
                        self.assemble(&source, &path);
                        self.include_depth -= 1;
                    }
                    Err(_) => self.report(AsmErrorKind::IncludeNotFound(path), loc),
                }
            }

            other => self.report(AsmErrorKind::UnknownDirective(other.to_string()), loc),
        }
    }

    /// Handles one instruction statement.
    fn handle_instruction(&mut self, mnemonic: &str, operands: &[Token], loc: &SourceLoc) {
        self.align(4);
        let ctx = Context {
            symtab: self.symtab,
            dot: self.dot(),
        };
        match encoder::encode_statement(mnemonic, operands, &ctx) {
            Ok(words) => {
                for encoded in words {
                    if let Some((kind, e)) = encoded.fixup {
                        self.fixups.push(Fixup {
                            addr: Address::new(self.dot()),
                            kind,
                            expr: e,
                            dot: self.dot(),
                            loc: loc.clone(),
                        });
                    }
                    self.emit(MemWidth::Word, encoded.word, loc);
                }
            }
            Err(kind) => self.report(kind, loc),
        }
    }
}
