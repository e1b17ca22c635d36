//! Assembler diagnostics.
//!
//! Errors are collected, not fail-fast: the assembler keeps going after a
//! diagnostic so one run reports every problem in the source, and `finish()`
//! only succeeds when the collection stayed empty.

use thiserror::Error;

/// Location of a diagnostic in the assembled source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLoc {
    /// File name (or the synthetic name of editor-provided content).
    pub file: String,
    /// 1-based line number.
    pub line: usize,
}

impl std::fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// The kinds of assembler diagnostics.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AsmErrorKind {
    /// Malformed statement or expression.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A referenced symbol is never defined.
    #[error("undefined symbol '{0}'")]
    UndefinedSymbol(String),

    /// A symbol is defined more than once.
    #[error("duplicate symbol '{0}' (previously {1:#x})")]
    DuplicateSymbol(String, u32),

    /// A value does not fit its field.
    #[error("value {0} out of range for {1}")]
    OutOfRange(i64, &'static str),

    /// A jump target lies outside the reachable region.
    #[error("target {0:#x} unreachable from {1:#x}")]
    Unreachable(u32, u32),

    /// `.include` could not be resolved.
    #[error("include not found: '{0}'")]
    IncludeNotFound(String),

    /// Includes nested too deep (cycle suspected).
    #[error("includes nested deeper than {0} levels")]
    IncludeDepth(usize),

    /// Unknown directive.
    #[error("unknown directive '{0}'")]
    UnknownDirective(String),

    /// Unknown instruction mnemonic.
    #[error("unknown instruction '{0}'")]
    UnknownInstruction(String),

    /// Division by zero in a constant expression.
    #[error("division by zero in expression")]
    DivisionByZero,

    /// Emission outside any mapped memory range.
    #[error("write to unmapped address {0:#x}")]
    UnmappedWrite(u32),
}

/// One collected diagnostic with its source location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: AsmErrorKind,
    /// Where it happened.
    pub loc: SourceLoc,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.loc, self.kind)
    }
}

impl std::error::Error for Diagnostic {}
