//! Source-level operations and line parsing.
//!
//! A source line is a mnemonic followed by comma-separated operands.
//! Blank lines and `#` comments are skipped. The parser resolves nothing:
//! branch targets stay symbolic and pseudo instructions stay folded until
//! the assembler passes run.

use core::str::FromStr;

use thiserror::Error;

use crate::assembler::AsmError;
use crate::field::{
    BitSel, Cmpop, FieldError, Funct, Off14, Off9, Opcode, Reg, Simm, StoreOff16, Uimm,
};
use crate::instruction::Instruction;
use irisc_types::{
    parse_number, Immediate09, Immediate11, Immediate14, Immediate16, RegisterId, Word,
};

/// Errors produced while parsing a single source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The mnemonic is not in the instruction table.
    #[error("unknown instruction: `{0}`")]
    UnknownMnemonic(String),

    /// The operand list has the wrong length.
    #[error("`{mnemonic}` expects {expected} operands, found {found}")]
    WrongOperandCount {
        /// The mnemonic being parsed.
        mnemonic: String,
        /// How many operands the mnemonic takes.
        expected: usize,
        /// How many operands the line carried.
        found: usize,
    },

    /// An operand failed to parse.
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// A named anchor in the instruction stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    /// The label name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl FromStr for Label {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(FieldError::EmptyLabel);
        }
        Ok(Self(s.to_string()))
    }
}

/// A branch or jump destination: a label, or a literal signed word
/// offset relative to the instruction itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// Resolve through the label table.
    Label(Label),
    /// Use the offset as encoded.
    Offset(i64),
}

impl FromStr for Target {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(FieldError::EmptyLabel);
        }
        match parse_number(s) {
            Ok(value) => Ok(Target::Offset(value as i64)),
            Err(_) => Ok(Target::Label(Label(s.to_string()))),
        }
    }
}

/// One source-level operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Bind a label to the current address.
    Label(Label),
    /// A machine instruction with fully numeric operands.
    Inst(Instruction),
    /// Load a 32-bit constant through `set2`/`set3`.
    Set32(RegisterId, u32),
    /// Load a 64-bit constant through `set0`..`set3`.
    Set64(RegisterId, Word),
    /// Relative call.
    Call(Target),
    /// Relative jump.
    Jump(Target),
    /// Branch if the comparison holds.
    Bt(u8, RegisterId, Target),
    /// Branch if the comparison does not hold.
    Bf(u8, RegisterId, Target),
    /// Branch if the selected bit is set.
    Bset(RegisterId, u8, Target),
    /// Branch if the selected bit is clear.
    Bclr(RegisterId, u8, Target),
}

impl FromStr for Op {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        use Instruction::*;

        let line = line.trim();
        let (mnemonic, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let operands = rest
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>();

        Ok(match mnemonic {
            "lbl" => {
                let [name] = take(mnemonic, &operands)?;
                Op::Label(name.parse()?)
            }
            "unk.i" => {
                let [op, rd, rs, imm] = take(mnemonic, &operands)?;
                Op::Inst(UNKI(opcode6(op)?, reg(rd)?, reg(rs)?, uimm16(imm)?))
            }
            "unk.r" => {
                let [op, rd, rs, rt, funct] = take(mnemonic, &operands)?;
                Op::Inst(UNKR(
                    opcode6(op)?,
                    reg(rd)?,
                    reg(rs)?,
                    reg(rt)?,
                    funct11(funct)?,
                ))
            }
            "addi" => {
                let [rd, rs, imm] = take(mnemonic, &operands)?;
                Op::Inst(ADDI(reg(rd)?, reg(rs)?, simm16(imm)?))
            }
            "set0" => {
                let [rd, rs, imm] = take(mnemonic, &operands)?;
                Op::Inst(SET0(reg(rd)?, reg(rs)?, uimm16(imm)?))
            }
            "set1" => {
                let [rd, rs, imm] = take(mnemonic, &operands)?;
                Op::Inst(SET1(reg(rd)?, reg(rs)?, uimm16(imm)?))
            }
            "set2" => {
                let [rd, rs, imm] = take(mnemonic, &operands)?;
                Op::Inst(SET2(reg(rd)?, reg(rs)?, uimm16(imm)?))
            }
            "set3" => {
                let [rd, rs, imm] = take(mnemonic, &operands)?;
                Op::Inst(SET3(reg(rd)?, reg(rs)?, uimm16(imm)?))
            }
            "set32" => {
                let [rd, imm] = take(mnemonic, &operands)?;
                Op::Set32(reg(rd)?, imm.parse::<Uimm<32>>()?.value() as u32)
            }
            "set64" => {
                let [rd, imm] = take(mnemonic, &operands)?;
                Op::Set64(reg(rd)?, imm.parse::<Uimm<64>>()?.value())
            }
            "call" => {
                let [target] = take(mnemonic, &operands)?;
                Op::Call(target.parse()?)
            }
            "jump" => {
                let [target] = take(mnemonic, &operands)?;
                Op::Jump(target.parse()?)
            }
            "alu.r" => {
                let [funct, rd, rs, rt] = take(mnemonic, &operands)?;
                Op::Inst(ALUR(funct11(funct)?, reg(rd)?, reg(rs)?, reg(rt)?))
            }
            "add" => {
                let [rd, rs, rt] = take(mnemonic, &operands)?;
                Op::Inst(ADD(reg(rd)?, reg(rs)?, reg(rt)?))
            }
            "sub" => {
                let [rd, rs, rt] = take(mnemonic, &operands)?;
                Op::Inst(SUB(reg(rd)?, reg(rs)?, reg(rt)?))
            }
            "subs" => {
                let [rd, rs, rt] = take(mnemonic, &operands)?;
                Op::Inst(SUBS(reg(rd)?, reg(rs)?, reg(rt)?))
            }
            "ret.d" => {
                take::<0>(mnemonic, &operands)?;
                Op::Inst(RETD)
            }
            "b.t" => {
                let [cmp, rs, target] = take(mnemonic, &operands)?;
                Op::Bt(cmpop(cmp)?, reg(rs)?, target.parse()?)
            }
            "b.f" => {
                let [cmp, rs, target] = take(mnemonic, &operands)?;
                Op::Bf(cmpop(cmp)?, reg(rs)?, target.parse()?)
            }
            "b.set" => {
                let [rs, bit, target] = take(mnemonic, &operands)?;
                Op::Bset(reg(rs)?, bitsel(bit)?, target.parse()?)
            }
            "b.clr" => {
                let [rs, bit, target] = take(mnemonic, &operands)?;
                Op::Bclr(reg(rs)?, bitsel(bit)?, target.parse()?)
            }
            "ld.b" => {
                let [rd, rs, imm] = take(mnemonic, &operands)?;
                Op::Inst(LDB(reg(rd)?, reg(rs)?, simm16(imm)?))
            }
            "ld.q" => {
                let [rd, rs, off] = take(mnemonic, &operands)?;
                Op::Inst(LDQ(reg(rd)?, reg(rs)?, off14(off)?))
            }
            "ld.uw" => {
                let [rd, rs, off] = take(mnemonic, &operands)?;
                Op::Inst(LDUW(reg(rd)?, reg(rs)?, off14(off)?))
            }
            "ld.d" => {
                let [rd, rs, off] = take(mnemonic, &operands)?;
                Op::Inst(LDD(reg(rd)?, reg(rs)?, off14(off)?))
            }
            "ld.lw" => {
                let [rd, rs, off] = take(mnemonic, &operands)?;
                Op::Inst(LDLW(reg(rd)?, reg(rs)?, off14(off)?))
            }
            "st.b" => {
                let [rt, rs, off] = take(mnemonic, &operands)?;
                Op::Inst(STB(reg(rt)?, reg(rs)?, stoff16(off)?))
            }
            "st.d" => {
                let [rd, rs, rt, off] = take(mnemonic, &operands)?;
                Op::Inst(STD(reg(rd)?, reg(rs)?, reg(rt)?, off9(off)?))
            }
            "st.q" => {
                let [rd, rs, rt, off] = take(mnemonic, &operands)?;
                Op::Inst(STQ(reg(rd)?, reg(rs)?, reg(rt)?, off9(off)?))
            }
            _ => return Err(ParseError::UnknownMnemonic(line.to_string())),
        })
    }
}

/// Parse a whole source listing into operations.
///
/// Line numbers are attached to errors; the listing itself carries no
/// positional information past this point.
pub fn parse(source: &str) -> Result<Vec<Op>, AsmError> {
    source
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line, text)| {
            text.parse().map_err(|source| AsmError::Parse {
                line,
                text: text.to_string(),
                source,
            })
        })
        .collect()
}

fn take<'a, const N: usize>(
    mnemonic: &str,
    operands: &[&'a str],
) -> Result<[&'a str; N], ParseError> {
    <[&'a str; N]>::try_from(operands).map_err(|_| ParseError::WrongOperandCount {
        mnemonic: mnemonic.to_string(),
        expected: N,
        found: operands.len(),
    })
}

fn reg(s: &str) -> Result<RegisterId, ParseError> {
    Ok(s.parse::<Reg>()?.id())
}

fn opcode6(s: &str) -> Result<u8, ParseError> {
    Ok(s.parse::<Opcode>()?.value())
}

fn cmpop(s: &str) -> Result<u8, ParseError> {
    Ok(s.parse::<Cmpop>()?.value())
}

fn bitsel(s: &str) -> Result<u8, ParseError> {
    Ok(s.parse::<BitSel>()?.value())
}

fn funct11(s: &str) -> Result<Immediate11, ParseError> {
    Ok(s.parse::<Funct>()?.value())
}

fn simm16(s: &str) -> Result<Immediate16, ParseError> {
    Ok(s.parse::<Simm<16>>()?.raw() as Immediate16)
}

fn uimm16(s: &str) -> Result<Immediate16, ParseError> {
    Ok(s.parse::<Uimm<16>>()?.value() as Immediate16)
}

fn off14(s: &str) -> Result<Immediate14, ParseError> {
    Ok(s.parse::<Off14>()?.value())
}

fn off9(s: &str) -> Result<Immediate09, ParseError> {
    Ok(s.parse::<Off9>()?.value())
}

fn stoff16(s: &str) -> Result<Immediate16, ParseError> {
    Ok(s.parse::<StoreOff16>()?.value())
}
