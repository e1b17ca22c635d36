//! Expression grammar tests.
//!
//! Precedence, literal bases, unary operators, the location cursor, and the
//! unresolved-symbol marker.

use mipsim_core::asm::expr::{self, EvalError};
use mipsim_core::asm::lexer::{self, Line};
use mipsim_core::mem::SymbolTable;

/// Parses and evaluates an expression with the given symbols and cursor.
fn eval_with(text: &str, symtab: &SymbolTable, dot: u32) -> Result<i64, EvalError> {
    let Line::Tokens(tokens) = lexer::tokenize(text).unwrap_or_else(|e| panic!("{e}")) else {
        panic!("'{text}' did not tokenize to a statement");
    };
    let (parsed, used) = expr::parse(&tokens).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(used, tokens.len(), "'{text}' left trailing tokens");
    parsed.eval(symtab, dot)
}

/// Evaluates with an empty symbol table.
fn eval(text: &str) -> i64 {
    eval_with(text, &SymbolTable::new(), 0).unwrap_or_else(|e| panic!("'{text}': {e:?}"))
}

/// Multiplicative operators bind tighter than additive.
#[test]
fn precedence() {
    assert_eq!(eval("2 + 3 * 4"), 14);
    assert_eq!(eval("(2 + 3) * 4"), 20);
    assert_eq!(eval("20 - 16 / 4"), 16);
    assert_eq!(eval("1 << 4 + 1"), 17, "shift sits at term level");
    assert_eq!(eval("3 * (1 << 4)"), 48);
}

/// All four literal bases parse.
#[test]
fn literal_bases() {
    assert_eq!(eval("42"), 42);
    assert_eq!(eval("0x2A"), 42);
    assert_eq!(eval("052"), 42);
    assert_eq!(eval("0b101010"), 42);
}

/// Unary minus, complement, and plus.
#[test]
fn unary_operators() {
    assert_eq!(eval("-5 + 7"), 2);
    assert_eq!(eval("~0 & 0xFF"), 0xFF);
    assert_eq!(eval("+9"), 9);
    assert_eq!(eval("--4"), 4);
}

/// Bitwise operators at term level.
#[test]
fn bitwise() {
    assert_eq!(eval("0xF0 | 0x0F"), 0xFF);
    assert_eq!(eval("0xFF ^ 0x0F"), 0xF0);
    assert_eq!(eval("0xFF & 0x3C"), 0x3C);
    assert_eq!(eval("0x100 >> 4"), 0x10);
    assert_eq!(eval("13 % 5"), 3);
}

/// The cursor `.` evaluates to the statement address.
#[test]
fn location_cursor() {
    let table = SymbolTable::new();
    assert_eq!(eval_with(". + 8", &table, 0x2000), Ok(0x2008));
    assert_eq!(eval_with(".", &table, 0x44), Ok(0x44));
}

/// Symbols resolve from the table; missing ones report themselves.
#[test]
fn symbols() {
    let mut table = SymbolTable::new();
    table.set("base", 0x1000);
    assert_eq!(eval_with("base + 4", &table, 0), Ok(0x1004));
    assert_eq!(
        eval_with("base + missing", &table, 0),
        Err(EvalError::Unresolved("missing".to_string()))
    );
}

/// Division by zero is reported, not panicked on.
#[test]
fn division_by_zero() {
    let table = SymbolTable::new();
    assert_eq!(eval_with("1 / 0", &table, 0), Err(EvalError::DivisionByZero));
    assert_eq!(eval_with("1 % 0", &table, 0), Err(EvalError::DivisionByZero));
}

/// The symbol collector names every referenced symbol.
#[test]
fn symbol_collection() {
    let Line::Tokens(tokens) = lexer::tokenize("a + b * 2 - a").unwrap_or_else(|e| panic!("{e}"))
    else {
        panic!("bad tokenization");
    };
    let (parsed, _) = expr::parse(&tokens).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(parsed.symbols(), vec!["a", "b", "a"]);
}
