//! Statement encoder.
//!
//! Translates a mnemonic and its operand tokens into machine words, expanding
//! pseudo-instructions and attaching relocations for operands that reference
//! not-yet-defined symbols. Documented pseudo expansions:
//!
//! | pseudo | expansion |
//! |--------|-----------|
//! | `la rd, sym`  | `lui rd, hi(sym)` ; `ori rd, rd, lo(sym)` |
//! | `li rd, imm`  | shortest of `addiu rd, $0, imm` / `ori rd, $0, imm` / `lui rd, imm>>16` / `lui`+`ori` pair; unresolved operands assemble as `la` |
//! | `b label`     | `beq $0, $0, label` |
//! | `nop`         | `sll $0, $0, 0` |
//! | `move rd, rs` | `addu rd, $0, rs` |
//! | `beqz rs, l`  | `beq rs, $0, l` |
//! | `bnez rs, l`  | `bne rs, $0, l` |
//! | `neg rd, rs`  | `sub rd, $0, rs` |
//! | `not rd, rs`  | `nor rd, rs, $0` |

use crate::asm::error::AsmErrorKind;
use crate::asm::expr::{self, EvalError, Expr};
use crate::asm::lexer::Token;
use crate::isa::encode::{cop0, i_type, j_type, r_type, regimm};
use crate::isa::{Relocation, funct, opcodes};
use crate::mem::SymbolTable;

/// One emitted word with its optional relocation.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedWord {
    /// The machine word (placeholder field bits zero when relocated).
    pub word: u32,
    /// Relocation to patch at `finish()`.
    pub fixup: Option<(Relocation, Expr)>,
}

impl EncodedWord {
    /// A fully resolved word.
    const fn done(word: u32) -> Self {
        Self { word, fixup: None }
    }

    /// A word awaiting a fix-up.
    const fn patched(word: u32, kind: Relocation, expr: Expr) -> Self {
        Self {
            word,
            fixup: Some((kind, expr)),
        }
    }
}

/// Operand cursor over the statement's tokens.
struct Operands<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Operands<'a> {
    const fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn reg(&mut self) -> Result<usize, AsmErrorKind> {
        match self.tokens.get(self.pos) {
            Some(Token::Reg(index)) => {
                self.pos += 1;
                Ok(*index)
            }
            other => Err(AsmErrorKind::Syntax(format!(
                "expected register, found {other:?}"
            ))),
        }
    }

    fn comma(&mut self) -> Result<(), AsmErrorKind> {
        match self.tokens.get(self.pos) {
            Some(Token::Comma) => {
                self.pos += 1;
                Ok(())
            }
            other => Err(AsmErrorKind::Syntax(format!(
                "expected ',', found {other:?}"
            ))),
        }
    }

    fn expr(&mut self) -> Result<Expr, AsmErrorKind> {
        let (parsed, used) = expr::parse(&self.tokens[self.pos..])?;
        self.pos += used;
        Ok(parsed)
    }

    /// Parses `expr($reg)`, `($reg)`, or a bare `expr` (base `$0`).
    fn mem_operand(&mut self) -> Result<(Expr, usize), AsmErrorKind> {
        let offset = if matches!(self.peek(), Some(Token::LParen)) {
            Expr::Int(0)
        } else {
            self.expr()?
        };
        if matches!(self.peek(), Some(Token::LParen)) {
            self.pos += 1;
            let base = self.reg()?;
            match self.tokens.get(self.pos) {
                Some(Token::RParen) => {
                    self.pos += 1;
                    Ok((offset, base))
                }
                other => Err(AsmErrorKind::Syntax(format!(
                    "expected ')', found {other:?}"
                ))),
            }
        } else {
            Ok((offset, 0))
        }
    }

    fn end(&self) -> Result<(), AsmErrorKind> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(AsmErrorKind::Syntax(format!(
                "trailing operands {:?}",
                &self.tokens[self.pos..]
            )))
        }
    }
}

/// Encoding context: symbols and the statement's address.
pub struct Context<'a> {
    /// Symbol table as of pass 1.
    pub symtab: &'a SymbolTable,
    /// Address of the first emitted word (`.` for the statement).
    pub dot: u32,
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").field("dot", &self.dot).finish()
    }
}

impl Context<'_> {
    /// Evaluates an expression, distinguishing unresolved from hard errors.
    fn eval(&self, e: &Expr) -> Result<Option<i64>, AsmErrorKind> {
        match e.eval(self.symtab, self.dot) {
            Ok(value) => Ok(Some(value)),
            Err(EvalError::Unresolved(_)) => Ok(None),
            Err(EvalError::DivisionByZero) => Err(AsmErrorKind::DivisionByZero),
        }
    }

    /// Evaluates an expression that must resolve in pass 1.
    fn eval_now(&self, e: &Expr) -> Result<i64, AsmErrorKind> {
        match e.eval(self.symtab, self.dot) {
            Ok(value) => Ok(value),
            Err(EvalError::Unresolved(name)) => Err(AsmErrorKind::UndefinedSymbol(name)),
            Err(EvalError::DivisionByZero) => Err(AsmErrorKind::DivisionByZero),
        }
    }
}

/// Checks a signed-or-unsigned 16-bit immediate.
fn check_imm16(value: i64) -> Result<u16, AsmErrorKind> {
    if !(-32768..=65535).contains(&value) {
        return Err(AsmErrorKind::OutOfRange(value, "16-bit immediate"));
    }
    Ok(value as u16)
}

/// Checks an unsigned 5-bit shift amount.
fn check_shamt(value: i64) -> Result<u32, AsmErrorKind> {
    if !(0..=31).contains(&value) {
        return Err(AsmErrorKind::OutOfRange(value, "5-bit shift amount"));
    }
    Ok(value as u32)
}

/// Encodes an I-format word whose immediate may need a fix-up.
fn imm_word(
    ctx: &Context<'_>,
    opcode: u32,
    rs: usize,
    rt: usize,
    e: &Expr,
) -> Result<EncodedWord, AsmErrorKind> {
    match ctx.eval(e)? {
        Some(value) => Ok(EncodedWord::done(i_type(opcode, rs, rt, check_imm16(value)?))),
        None => Ok(EncodedWord::patched(
            i_type(opcode, rs, rt, 0),
            Relocation::Lo16,
            e.clone(),
        )),
    }
}

/// Encodes a conditional branch word (opcode form).
fn branch_word(
    ctx: &Context<'_>,
    word: u32,
    target: &Expr,
) -> Result<EncodedWord, AsmErrorKind> {
    match ctx.eval(target)? {
        Some(value) => {
            let target = value as u32;
            if target & 3 != 0 {
                return Err(AsmErrorKind::OutOfRange(value, "branch target alignment"));
            }
            let base = ctx.dot.wrapping_add(4);
            let disp = i64::from(target.wrapping_sub(base) as i32) >> 2;
            if !(-32768..=32767).contains(&disp) {
                return Err(AsmErrorKind::OutOfRange(disp, "16-bit branch offset"));
            }
            Ok(EncodedWord::done(word | ((disp as u32) & 0xFFFF)))
        }
        None => Ok(EncodedWord::patched(
            word,
            Relocation::PcRel16,
            target.clone(),
        )),
    }
}

/// Encodes a J-format word.
fn jump_word(ctx: &Context<'_>, opcode: u32, target: &Expr) -> Result<EncodedWord, AsmErrorKind> {
    match ctx.eval(target)? {
        Some(value) => {
            let target_addr = value as u32;
            if target_addr & 3 != 0 {
                return Err(AsmErrorKind::OutOfRange(value, "jump target alignment"));
            }
            let base = ctx.dot.wrapping_add(4);
            if target_addr & 0xF000_0000 != base & 0xF000_0000 {
                return Err(AsmErrorKind::Unreachable(target_addr, ctx.dot));
            }
            Ok(EncodedWord::done(j_type(opcode, target_addr >> 2)))
        }
        None => Ok(EncodedWord::patched(
            j_type(opcode, 0),
            Relocation::Abs26,
            target.clone(),
        )),
    }
}

/// Expands `la rd, expr` into a `lui`/`ori` pair.
fn expand_la(ctx: &Context<'_>, rd: usize, e: &Expr) -> Result<Vec<EncodedWord>, AsmErrorKind> {
    match ctx.eval(e)? {
        Some(value) => {
            let value = value as u32;
            Ok(vec![
                EncodedWord::done(i_type(opcodes::OP_LUI, 0, rd, (value >> 16) as u16)),
                EncodedWord::done(i_type(opcodes::OP_ORI, rd, rd, value as u16)),
            ])
        }
        None => Ok(vec![
            EncodedWord::patched(i_type(opcodes::OP_LUI, 0, rd, 0), Relocation::Hi16, e.clone()),
            EncodedWord::patched(
                i_type(opcodes::OP_ORI, rd, rd, 0),
                Relocation::Lo16,
                e.clone(),
            ),
        ]),
    }
}

/// Expands `li rd, expr`, choosing the shortest encoding for known values.
fn expand_li(ctx: &Context<'_>, rd: usize, e: &Expr) -> Result<Vec<EncodedWord>, AsmErrorKind> {
    let Some(value) = ctx.eval(e)? else {
        // Unknown value: assemble the full address pair, like `la`.
        return expand_la(ctx, rd, e);
    };
    if !(-0x8000_0000..=0xFFFF_FFFF).contains(&value) {
        return Err(AsmErrorKind::OutOfRange(value, "32-bit immediate"));
    }
    let bits = value as u32;

    if (-32768..=32767).contains(&value) {
        return Ok(vec![EncodedWord::done(i_type(
            opcodes::OP_ADDIU,
            0,
            rd,
            bits as u16,
        ))]);
    }
    if (0..=65535).contains(&value) {
        return Ok(vec![EncodedWord::done(i_type(
            opcodes::OP_ORI,
            0,
            rd,
            bits as u16,
        ))]);
    }
    if bits & 0xFFFF == 0 {
        return Ok(vec![EncodedWord::done(i_type(
            opcodes::OP_LUI,
            0,
            rd,
            (bits >> 16) as u16,
        ))]);
    }
    Ok(vec![
        EncodedWord::done(i_type(opcodes::OP_LUI, 0, rd, (bits >> 16) as u16)),
        EncodedWord::done(i_type(opcodes::OP_ORI, rd, rd, bits as u16)),
    ])
}

/// Encodes one instruction statement into machine words.
///
/// # Arguments
///
/// * `mnemonic` - Lower-cased instruction name.
/// * `tokens` - The operand tokens after the mnemonic.
/// * `ctx` - Symbols and statement address.
///
/// # Errors
///
/// Diagnostic kinds for unknown mnemonics, malformed operands, and range
/// violations.
pub fn encode_statement(
    mnemonic: &str,
    tokens: &[Token],
    ctx: &Context<'_>,
) -> Result<Vec<EncodedWord>, AsmErrorKind> {
    let mut ops = Operands::new(tokens);

    let words = match mnemonic {
        // Three-register arithmetic and logic.
        "add" | "addu" | "sub" | "subu" | "and" | "or" | "xor" | "nor" | "slt" | "sltu" => {
            let fn_code = match mnemonic {
                "add" => funct::FN_ADD,
                "addu" => funct::FN_ADDU,
                "sub" => funct::FN_SUB,
                "subu" => funct::FN_SUBU,
                "and" => funct::FN_AND,
                "or" => funct::FN_OR,
                "xor" => funct::FN_XOR,
                "nor" => funct::FN_NOR,
                "slt" => funct::FN_SLT,
                _ => funct::FN_SLTU,
            };
            let rd = ops.reg()?;
            ops.comma()?;
            let rs = ops.reg()?;
            ops.comma()?;
            let rt = ops.reg()?;
            vec![EncodedWord::done(r_type(fn_code, rs, rt, rd, 0))]
        }

        // Constant shifts.
        "sll" | "srl" | "sra" => {
            let fn_code = match mnemonic {
                "sll" => funct::FN_SLL,
                "srl" => funct::FN_SRL,
                _ => funct::FN_SRA,
            };
            let rd = ops.reg()?;
            ops.comma()?;
            let rt = ops.reg()?;
            ops.comma()?;
            let shamt = check_shamt(ctx.eval_now(&ops.expr()?)?)?;
            vec![EncodedWord::done(r_type(fn_code, 0, rt, rd, shamt))]
        }

        // Variable shifts.
        "sllv" | "srlv" | "srav" => {
            let fn_code = match mnemonic {
                "sllv" => funct::FN_SLLV,
                "srlv" => funct::FN_SRLV,
                _ => funct::FN_SRAV,
            };
            let rd = ops.reg()?;
            ops.comma()?;
            let rt = ops.reg()?;
            ops.comma()?;
            let rs = ops.reg()?;
            vec![EncodedWord::done(r_type(fn_code, rs, rt, rd, 0))]
        }

        // Multiply and divide.
        "mult" | "multu" | "div" | "divu" => {
            let fn_code = match mnemonic {
                "mult" => funct::FN_MULT,
                "multu" => funct::FN_MULTU,
                "div" => funct::FN_DIV,
                _ => funct::FN_DIVU,
            };
            let rs = ops.reg()?;
            ops.comma()?;
            let rt = ops.reg()?;
            vec![EncodedWord::done(r_type(fn_code, rs, rt, 0, 0))]
        }

        "mfhi" | "mflo" => {
            let fn_code = if mnemonic == "mfhi" {
                funct::FN_MFHI
            } else {
                funct::FN_MFLO
            };
            let rd = ops.reg()?;
            vec![EncodedWord::done(r_type(fn_code, 0, 0, rd, 0))]
        }

        "mthi" | "mtlo" => {
            let fn_code = if mnemonic == "mthi" {
                funct::FN_MTHI
            } else {
                funct::FN_MTLO
            };
            let rs = ops.reg()?;
            vec![EncodedWord::done(r_type(fn_code, rs, 0, 0, 0))]
        }

        "jr" => {
            let rs = ops.reg()?;
            vec![EncodedWord::done(r_type(funct::FN_JR, rs, 0, 0, 0))]
        }

        "jalr" => {
            // One-operand form links into $ra.
            let first = ops.reg()?;
            let (rd, rs) = if matches!(ops.peek(), Some(Token::Comma)) {
                ops.comma()?;
                (first, ops.reg()?)
            } else {
                (31, first)
            };
            vec![EncodedWord::done(r_type(funct::FN_JALR, rs, 0, rd, 0))]
        }

        "syscall" | "break" => {
            let fn_code = if mnemonic == "syscall" {
                funct::FN_SYSCALL
            } else {
                funct::FN_BREAK
            };
            let code = if ops.peek().is_some() {
                let value = ctx.eval_now(&ops.expr()?)?;
                if !(0..=0xF_FFFF).contains(&value) {
                    return Err(AsmErrorKind::OutOfRange(value, "20-bit code"));
                }
                value as u32
            } else {
                0
            };
            vec![EncodedWord::done((code << 6) | fn_code)]
        }

        // Immediate arithmetic and logic.
        "addi" | "addiu" | "slti" | "sltiu" | "andi" | "ori" | "xori" => {
            let opcode = match mnemonic {
                "addi" => opcodes::OP_ADDI,
                "addiu" => opcodes::OP_ADDIU,
                "slti" => opcodes::OP_SLTI,
                "sltiu" => opcodes::OP_SLTIU,
                "andi" => opcodes::OP_ANDI,
                "ori" => opcodes::OP_ORI,
                _ => opcodes::OP_XORI,
            };
            let rt = ops.reg()?;
            ops.comma()?;
            let rs = ops.reg()?;
            ops.comma()?;
            let e = ops.expr()?;
            vec![imm_word(ctx, opcode, rs, rt, &e)?]
        }

        "lui" => {
            let rt = ops.reg()?;
            ops.comma()?;
            let e = ops.expr()?;
            vec![imm_word(ctx, opcodes::OP_LUI, 0, rt, &e)?]
        }

        // Loads and stores.
        "lb" | "lbu" | "lh" | "lhu" | "lw" | "sb" | "sh" | "sw" => {
            let opcode = match mnemonic {
                "lb" => opcodes::OP_LB,
                "lbu" => opcodes::OP_LBU,
                "lh" => opcodes::OP_LH,
                "lhu" => opcodes::OP_LHU,
                "lw" => opcodes::OP_LW,
                "sb" => opcodes::OP_SB,
                "sh" => opcodes::OP_SH,
                _ => opcodes::OP_SW,
            };
            let rt = ops.reg()?;
            ops.comma()?;
            let (offset, base) = ops.mem_operand()?;
            vec![imm_word(ctx, opcode, base, rt, &offset)?]
        }

        // Branches.
        "beq" | "bne" => {
            let opcode = if mnemonic == "beq" {
                opcodes::OP_BEQ
            } else {
                opcodes::OP_BNE
            };
            let rs = ops.reg()?;
            ops.comma()?;
            let rt = ops.reg()?;
            ops.comma()?;
            let target = ops.expr()?;
            vec![branch_word(ctx, i_type(opcode, rs, rt, 0), &target)?]
        }

        "blez" | "bgtz" => {
            let opcode = if mnemonic == "blez" {
                opcodes::OP_BLEZ
            } else {
                opcodes::OP_BGTZ
            };
            let rs = ops.reg()?;
            ops.comma()?;
            let target = ops.expr()?;
            vec![branch_word(ctx, i_type(opcode, rs, 0, 0), &target)?]
        }

        "bltz" | "bgez" | "bltzal" | "bgezal" => {
            let rt_code = match mnemonic {
                "bltz" => funct::RI_BLTZ,
                "bgez" => funct::RI_BGEZ,
                "bltzal" => funct::RI_BLTZAL,
                _ => funct::RI_BGEZAL,
            };
            let rs = ops.reg()?;
            ops.comma()?;
            let target = ops.expr()?;
            vec![branch_word(ctx, regimm(rt_code, rs, 0), &target)?]
        }

        // Jumps.
        "j" | "jal" => {
            let opcode = if mnemonic == "j" {
                opcodes::OP_J
            } else {
                opcodes::OP_JAL
            };
            let target = ops.expr()?;
            vec![jump_word(ctx, opcode, &target)?]
        }

        // Coprocessor 0 moves: the CP0 register is named by number.
        "mfc0" | "mtc0" => {
            let rs_code = if mnemonic == "mfc0" {
                funct::C0_MFC0
            } else {
                funct::C0_MTC0
            };
            let rt = ops.reg()?;
            ops.comma()?;
            let sel = match ops.peek() {
                Some(Token::Reg(index)) => {
                    let index = *index;
                    let _ = ops.reg()?;
                    index
                }
                _ => {
                    let value = ctx.eval_now(&ops.expr()?)?;
                    if !(0..=31).contains(&value) {
                        return Err(AsmErrorKind::OutOfRange(value, "CP0 register number"));
                    }
                    value as usize
                }
            };
            vec![EncodedWord::done(cop0(rs_code, rt, sel))]
        }

        // Pseudo-instructions.
        "nop" => vec![EncodedWord::done(0)],

        "la" => {
            let rd = ops.reg()?;
            ops.comma()?;
            let e = ops.expr()?;
            expand_la(ctx, rd, &e)?
        }

        "li" => {
            let rd = ops.reg()?;
            ops.comma()?;
            let e = ops.expr()?;
            expand_li(ctx, rd, &e)?
        }

        "b" => {
            let target = ops.expr()?;
            vec![branch_word(ctx, i_type(opcodes::OP_BEQ, 0, 0, 0), &target)?]
        }

        "move" => {
            let rd = ops.reg()?;
            ops.comma()?;
            let rs = ops.reg()?;
            vec![EncodedWord::done(r_type(funct::FN_ADDU, 0, rs, rd, 0))]
        }

        "beqz" | "bnez" => {
            let opcode = if mnemonic == "beqz" {
                opcodes::OP_BEQ
            } else {
                opcodes::OP_BNE
            };
            let rs = ops.reg()?;
            ops.comma()?;
            let target = ops.expr()?;
            vec![branch_word(ctx, i_type(opcode, rs, 0, 0), &target)?]
        }

        "neg" => {
            let rd = ops.reg()?;
            ops.comma()?;
            let rs = ops.reg()?;
            vec![EncodedWord::done(r_type(funct::FN_SUB, 0, rs, rd, 0))]
        }

        "not" => {
            let rd = ops.reg()?;
            ops.comma()?;
            let rs = ops.reg()?;
            vec![EncodedWord::done(r_type(funct::FN_NOR, rs, 0, rd, 0))]
        }

        other => return Err(AsmErrorKind::UnknownInstruction(other.to_string())),
    };

    ops.end()?;
    Ok(words)
}
