//! Machine instruction representation.
//!
//! [`Instruction`] carries fully numeric operands: register indices and
//! raw field contents (signed fields are stored in two's complement).
//! Conversion to [`RawInstruction`] is infallible, and conversion back is
//! total — words outside the opcode table surface as the raw `unk.i` /
//! `unk.r` forms, so a disassembly pass never fails.

use core::fmt;

use crate::field::{BitSel, Bits, Cmpop, Funct, Off14, Off9, Opcode, Rd, Rs, Rt, StoreOff16, Uimm};
use crate::opcode::{AluFunct, JumpKind, MemWidth, OpcodeRepr};
use irisc_types::{
    Immediate09, Immediate11, Immediate14, Immediate16, Immediate24, RawInstruction, RegisterId,
    INSTRUCTION_LEN,
};

use std::io;

/// One iRISC machine instruction.
///
/// Operand order matches the assembly syntax. Immediates hold the raw
/// field contents; use [`sign_extend_16`] / [`sign_extend_24`] to recover
/// signed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Instruction {
    /// Add signed immediate.
    ///
    /// | Syntax   | `addi rd, rs, imm`      |
    /// | Encoding | `0x00 rs rd simm16`     |
    ADDI(RegisterId, RegisterId, Immediate16),

    /// Set register bits `[63:48]` from the immediate, shifting in `rs`.
    ///
    /// | Syntax   | `set0 rd, rs, imm`      |
    /// | Encoding | `0x06 rs rd uimm16`     |
    SET0(RegisterId, RegisterId, Immediate16),

    /// Set register bits `[47:32]`.
    ///
    /// | Syntax   | `set1 rd, rs, imm`      |
    /// | Encoding | `0x07 rs rd uimm16`     |
    SET1(RegisterId, RegisterId, Immediate16),

    /// Set register bits `[31:16]`.
    ///
    /// | Syntax   | `set2 rd, rs, imm`      |
    /// | Encoding | `0x09 rs rd uimm16`     |
    SET2(RegisterId, RegisterId, Immediate16),

    /// Set register bits `[15:0]`.
    ///
    /// | Syntax   | `set3 rd, rs, imm`      |
    /// | Encoding | `0x08 rs rd uimm16`     |
    SET3(RegisterId, RegisterId, Immediate16),

    /// Load byte.
    ///
    /// | Syntax   | `ld.b rd, rs, imm`      |
    /// | Encoding | `0x18 rs rd simm16`     |
    LDB(RegisterId, RegisterId, Immediate16),

    /// Load quad word.
    ///
    /// | Syntax   | `ld.q rd, rs, off`      |
    /// | Encoding | `0x19 rs rd off14 w=0`  |
    LDQ(RegisterId, RegisterId, Immediate14),

    /// Load upper word.
    ///
    /// | Syntax   | `ld.uw rd, rs, off`     |
    /// | Encoding | `0x19 rs rd off14 w=1`  |
    LDUW(RegisterId, RegisterId, Immediate14),

    /// Load double word.
    ///
    /// | Syntax   | `ld.d rd, rs, off`      |
    /// | Encoding | `0x19 rs rd off14 w=2`  |
    LDD(RegisterId, RegisterId, Immediate14),

    /// Load lower word.
    ///
    /// | Syntax   | `ld.lw rd, rs, off`     |
    /// | Encoding | `0x19 rs rd off14 w=3`  |
    LDLW(RegisterId, RegisterId, Immediate14),

    /// Store byte.
    ///
    /// | Syntax   | `st.b rt, rs, off`      |
    /// | Encoding | `0x1a rs rt stoff16`    |
    STB(RegisterId, RegisterId, Immediate16),

    /// Store double word.
    ///
    /// | Syntax   | `st.d rd, rs, rt, off`  |
    /// | Encoding | `0x1b rs rd rt off9 w=2`|
    STD(RegisterId, RegisterId, RegisterId, Immediate09),

    /// Store quad word.
    ///
    /// | Syntax   | `st.q rd, rs, rt, off`  |
    /// | Encoding | `0x1e rs rd rt off9 w=0`|
    STQ(RegisterId, RegisterId, RegisterId, Immediate09),

    /// Relative call; the operand is a signed word offset.
    ///
    /// | Syntax   | `call target`           |
    /// | Encoding | `0x25 k=0 rel24`        |
    CALL(Immediate24),

    /// Relative jump; the operand is a signed word offset.
    ///
    /// | Syntax   | `jump target`           |
    /// | Encoding | `0x25 k=1 rel24`        |
    JUMP(Immediate24),

    /// Branch if the selected comparison holds.
    ///
    /// | Syntax   | `b.t cmpop, rs, target` |
    /// | Encoding | `0x28 rs cmpop rel16`   |
    BT(u8, RegisterId, Immediate16),

    /// Branch if the selected comparison does not hold.
    ///
    /// | Syntax   | `b.f cmpop, rs, target` |
    /// | Encoding | `0x29 rs cmpop rel16`   |
    BF(u8, RegisterId, Immediate16),

    /// Branch if the selected bit of `rs` is set.
    ///
    /// | Syntax   | `b.set rs, bit, target` |
    /// | Encoding | `0x2a rs bitsel rel16`  |
    BSET(RegisterId, u8, Immediate16),

    /// Branch if the selected bit of `rs` is clear.
    ///
    /// | Syntax   | `b.clr rs, bit, target` |
    /// | Encoding | `0x2b rs bitsel rel16`  |
    BCLR(RegisterId, u8, Immediate16),

    /// Generic register ALU operation.
    ///
    /// | Syntax   | `alu.r funct, rd, rs, rt` |
    /// | Encoding | `0x3f rs rd rt funct`     |
    ALUR(Immediate11, RegisterId, RegisterId, RegisterId),

    /// Add registers; `alu.r` with funct `0x000`.
    ADD(RegisterId, RegisterId, RegisterId),

    /// Subtract registers; `alu.r` with funct `0x004`.
    SUB(RegisterId, RegisterId, RegisterId),

    /// Saturating subtract; `alu.r` with funct `0x005`.
    SUBS(RegisterId, RegisterId, RegisterId),

    /// Return from the double-word handler; `alu.r` with funct `0x02d`.
    RETD,

    /// Raw immediate-form word with an opcode outside the table.
    ///
    /// | Syntax   | `unk.i op, rd, rs, imm` |
    /// | Encoding | `op rs rd uimm16`       |
    UNKI(u8, RegisterId, RegisterId, Immediate16),

    /// Raw register-form word with an opcode or funct outside the table.
    ///
    /// | Syntax   | `unk.r op, rd, rs, rt, funct` |
    /// | Encoding | `op rs rd rt uimm11`          |
    UNKR(u8, RegisterId, RegisterId, RegisterId, Immediate11),
}

/// Sign-extend a 16-bit field value.
pub const fn sign_extend_16(value: Immediate16) -> i16 {
    value as i16
}

/// Sign-extend a 24-bit field value.
pub const fn sign_extend_24(value: Immediate24) -> i32 {
    ((value << 8) as i32) >> 8
}

impl Instruction {
    /// Size of an encoded instruction in bytes.
    pub const LEN: usize = INSTRUCTION_LEN;

    /// The 6-bit primary opcode of this instruction.
    pub const fn opcode(&self) -> u8 {
        use Instruction::*;

        match self {
            ADDI(..) => OpcodeRepr::ADDI as u8,
            SET0(..) => OpcodeRepr::SET0 as u8,
            SET1(..) => OpcodeRepr::SET1 as u8,
            SET2(..) => OpcodeRepr::SET2 as u8,
            SET3(..) => OpcodeRepr::SET3 as u8,
            LDB(..) => OpcodeRepr::LDB as u8,
            LDQ(..) | LDUW(..) | LDD(..) | LDLW(..) => OpcodeRepr::LD as u8,
            STB(..) => OpcodeRepr::STB as u8,
            STD(..) => OpcodeRepr::STD as u8,
            STQ(..) => OpcodeRepr::STQ as u8,
            CALL(..) | JUMP(..) => OpcodeRepr::JMP as u8,
            BT(..) => OpcodeRepr::BT as u8,
            BF(..) => OpcodeRepr::BF as u8,
            BSET(..) => OpcodeRepr::BSET as u8,
            BCLR(..) => OpcodeRepr::BCLR as u8,
            ALUR(..) | ADD(..) | SUB(..) | SUBS(..) | RETD => OpcodeRepr::ALU as u8,
            UNKI(op, ..) => *op,
            UNKR(op, ..) => *op,
        }
    }

    /// Serialize to big-endian bytes.
    pub fn to_bytes(self) -> [u8; Self::LEN] {
        RawInstruction::from(self).to_be_bytes()
    }

    /// Deserialize one instruction from the front of a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> io::Result<Self> {
        let word: [u8; Self::LEN] = bytes
            .get(..Self::LEN)
            .and_then(|slice| slice.try_into().ok())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "buffer shorter than one instruction",
                )
            })?;

        Ok(Self::from(RawInstruction::from_be_bytes(word)))
    }

    /// Decode a stream of big-endian bytes into instructions.
    ///
    /// Trailing bytes that do not fill a word are consumed but not
    /// decoded.
    pub fn from_bytes_iter<I>(bytes: I) -> Vec<Self>
    where
        I: IntoIterator<Item = u8>,
    {
        let mut bytes = bytes.into_iter();
        let mut ret = Vec::with_capacity(bytes.size_hint().0 / Self::LEN);

        loop {
            let mut word = [0u8; Self::LEN];
            let n = bytes
                .by_ref()
                .take(Self::LEN)
                .zip(word.iter_mut())
                .fold(0, |n, (byte, slot)| {
                    *slot = byte;
                    n + 1
                });

            if n < Self::LEN {
                break;
            }

            ret.push(Self::from(RawInstruction::from_be_bytes(word)));
        }

        ret
    }
}

impl From<Instruction> for RawInstruction {
    fn from(instruction: Instruction) -> RawInstruction {
        use Instruction::*;

        // Operand fields wider than their slots are truncated; range
        // checks happen where operands enter the system.
        match instruction {
            ADDI(rd, rs, imm) => (Opcode::from(OpcodeRepr::ADDI)
                | Rd::from_id(rd)
                | Rs::from_id(rs)
                | Uimm::<16>::truncated(imm as u64))
            .bits(),
            SET0(rd, rs, imm) => (Opcode::from(OpcodeRepr::SET0)
                | Rd::from_id(rd)
                | Rs::from_id(rs)
                | Uimm::<16>::truncated(imm as u64))
            .bits(),
            SET1(rd, rs, imm) => (Opcode::from(OpcodeRepr::SET1)
                | Rd::from_id(rd)
                | Rs::from_id(rs)
                | Uimm::<16>::truncated(imm as u64))
            .bits(),
            SET2(rd, rs, imm) => (Opcode::from(OpcodeRepr::SET2)
                | Rd::from_id(rd)
                | Rs::from_id(rs)
                | Uimm::<16>::truncated(imm as u64))
            .bits(),
            SET3(rd, rs, imm) => (Opcode::from(OpcodeRepr::SET3)
                | Rd::from_id(rd)
                | Rs::from_id(rs)
                | Uimm::<16>::truncated(imm as u64))
            .bits(),
            LDB(rd, rs, imm) => (Opcode::from(OpcodeRepr::LDB)
                | Rd::from_id(rd)
                | Rs::from_id(rs)
                | Uimm::<16>::truncated(imm as u64))
            .bits(),
            LDQ(rd, rs, off) => load(MemWidth::Q, rd, rs, off),
            LDUW(rd, rs, off) => load(MemWidth::UW, rd, rs, off),
            LDD(rd, rs, off) => load(MemWidth::D, rd, rs, off),
            LDLW(rd, rs, off) => load(MemWidth::LW, rd, rs, off),
            STB(rt, rs, off) => (Opcode::from(OpcodeRepr::STB)
                | Rt::from_id(rt)
                | Rs::from_id(rs)
                | StoreOff16::new(off))
            .bits(),
            STD(rd, rs, rt, off) => (Opcode::from(OpcodeRepr::STD)
                | Rd::from_id(rd)
                | Rs::from_id(rs)
                | Rt::from_id(rt)
                | Off9::truncated(off)
                | MemWidth::D)
                .bits(),
            STQ(rd, rs, rt, off) => (Opcode::from(OpcodeRepr::STQ)
                | Rd::from_id(rd)
                | Rs::from_id(rs)
                | Rt::from_id(rt)
                | Off9::truncated(off)
                | MemWidth::Q)
                .bits(),
            CALL(rel) => {
                (Opcode::from(OpcodeRepr::JMP) | JumpKind::CALL | Uimm::<24>::truncated(rel as u64))
                    .bits()
            }
            JUMP(rel) => {
                (Opcode::from(OpcodeRepr::JMP) | JumpKind::JUMP | Uimm::<24>::truncated(rel as u64))
                    .bits()
            }
            BT(cmpop, rs, rel) => (Opcode::from(OpcodeRepr::BT)
                | Cmpop::fixed(cmpop)
                | Rs::from_id(rs)
                | Uimm::<16>::truncated(rel as u64))
            .bits(),
            BF(cmpop, rs, rel) => (Opcode::from(OpcodeRepr::BF)
                | Cmpop::fixed(cmpop)
                | Rs::from_id(rs)
                | Uimm::<16>::truncated(rel as u64))
            .bits(),
            BSET(rs, bit, rel) => (Opcode::from(OpcodeRepr::BSET)
                | BitSel::fixed(bit)
                | Rs::from_id(rs)
                | Uimm::<16>::truncated(rel as u64))
            .bits(),
            BCLR(rs, bit, rel) => (Opcode::from(OpcodeRepr::BCLR)
                | BitSel::fixed(bit)
                | Rs::from_id(rs)
                | Uimm::<16>::truncated(rel as u64))
            .bits(),
            ALUR(funct, rd, rs, rt) => (Opcode::from(OpcodeRepr::ALU)
                | Rd::from_id(rd)
                | Rs::from_id(rs)
                | Rt::from_id(rt)
                | Funct::fixed(funct))
            .bits(),
            ADD(rd, rs, rt) => alu(AluFunct::ADD, rd, rs, rt),
            SUB(rd, rs, rt) => alu(AluFunct::SUB, rd, rs, rt),
            SUBS(rd, rs, rt) => alu(AluFunct::SUBS, rd, rs, rt),
            RETD => (Opcode::from(OpcodeRepr::ALU) | AluFunct::RETD).bits(),
            UNKI(op, rd, rs, imm) => (Opcode::fixed(op)
                | Rd::from_id(rd)
                | Rs::from_id(rs)
                | Uimm::<16>::truncated(imm as u64))
            .bits(),
            UNKR(op, rd, rs, rt, funct) => (Opcode::fixed(op)
                | Rd::from_id(rd)
                | Rs::from_id(rs)
                | Rt::from_id(rt)
                | Funct::fixed(funct))
            .bits(),
        }
    }
}

fn load(width: MemWidth, rd: RegisterId, rs: RegisterId, off: Immediate14) -> RawInstruction {
    (Opcode::from(OpcodeRepr::LD)
        | Rd::from_id(rd)
        | Rs::from_id(rs)
        | Off14::truncated(off)
        | width)
        .bits()
}

fn alu(funct: AluFunct, rd: RegisterId, rs: RegisterId, rt: RegisterId) -> RawInstruction {
    (Opcode::from(OpcodeRepr::ALU)
        | Rd::from_id(rd)
        | Rs::from_id(rs)
        | Rt::from_id(rt)
        | funct)
        .bits()
}

impl From<RawInstruction> for Instruction {
    fn from(raw: RawInstruction) -> Self {
        use Instruction::*;

        let op = ((raw >> 26) & 0x3f) as u8;
        let rs = ((raw >> 21) & 0x1f) as RegisterId;
        let rd = ((raw >> 16) & 0x1f) as RegisterId;
        let rt = ((raw >> 11) & 0x1f) as RegisterId;
        let imm16 = (raw & 0xffff) as Immediate16;
        let funct = (raw & 0x7ff) as Immediate11;

        let unki = UNKI(op, rd, rs, imm16);

        match OpcodeRepr::try_from(op) {
            Ok(OpcodeRepr::ADDI) => ADDI(rd, rs, imm16),
            Ok(OpcodeRepr::SET0) => SET0(rd, rs, imm16),
            Ok(OpcodeRepr::SET1) => SET1(rd, rs, imm16),
            Ok(OpcodeRepr::SET2) => SET2(rd, rs, imm16),
            Ok(OpcodeRepr::SET3) => SET3(rd, rs, imm16),
            Ok(OpcodeRepr::LDB) => LDB(rd, rs, imm16),
            Ok(OpcodeRepr::LD) => {
                let off = ((raw >> 2) & 0x3fff) as Immediate14;
                match MemWidth::from((raw & 0x3) as u8) {
                    MemWidth::Q => LDQ(rd, rs, off),
                    MemWidth::UW => LDUW(rd, rs, off),
                    MemWidth::D => LDD(rd, rs, off),
                    MemWidth::LW => LDLW(rd, rs, off),
                }
            }
            Ok(OpcodeRepr::STB) => {
                let off = ((((raw >> 16) & 0x1f) << 11) | (raw & 0x7ff)) as Immediate16;
                STB(rt, rs, off)
            }
            Ok(OpcodeRepr::STD) if raw & 0x3 == MemWidth::D as RawInstruction => {
                STD(rd, rs, rt, ((raw >> 2) & 0x1ff) as Immediate09)
            }
            Ok(OpcodeRepr::STQ) if raw & 0x3 == MemWidth::Q as RawInstruction => {
                STQ(rd, rs, rt, ((raw >> 2) & 0x1ff) as Immediate09)
            }
            Ok(OpcodeRepr::JMP) => {
                let rel = raw & 0x00ff_ffff;
                match JumpKind::try_from(((raw >> 24) & 0x3) as u8) {
                    Ok(JumpKind::CALL) => CALL(rel),
                    Ok(JumpKind::JUMP) => JUMP(rel),
                    Err(_) => unki,
                }
            }
            Ok(OpcodeRepr::BT) => BT(rd, rs, imm16),
            Ok(OpcodeRepr::BF) => BF(rd, rs, imm16),
            Ok(OpcodeRepr::BSET) => BSET(rs, rd, imm16),
            Ok(OpcodeRepr::BCLR) => BCLR(rs, rd, imm16),
            Ok(OpcodeRepr::ALU) => match AluFunct::try_from(funct) {
                Ok(AluFunct::ADD) => ADD(rd, rs, rt),
                Ok(AluFunct::SUB) => SUB(rd, rs, rt),
                Ok(AluFunct::SUBS) => SUBS(rd, rs, rt),
                Ok(AluFunct::RETD) if rd == 0 && rs == 0 && rt == 0 => RETD,
                _ => ALUR(funct, rd, rs, rt),
            },
            Ok(OpcodeRepr::STD) | Ok(OpcodeRepr::STQ) | Err(_) => unki,
        }
    }
}

impl From<[u8; Instruction::LEN]> for Instruction {
    fn from(bytes: [u8; Instruction::LEN]) -> Self {
        RawInstruction::from_be_bytes(bytes).into()
    }
}

impl FromIterator<Instruction> for Vec<u8> {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = Instruction>,
    {
        iter.into_iter()
            .flat_map(Instruction::to_bytes)
            .collect()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match self {
            ADDI(rd, rs, imm) => {
                write!(f, "addi r{rd}, r{rs}, {}", sign_extend_16(*imm))
            }
            SET0(rd, rs, imm) => write!(f, "set0 r{rd}, r{rs}, {imm:#x}"),
            SET1(rd, rs, imm) => write!(f, "set1 r{rd}, r{rs}, {imm:#x}"),
            SET2(rd, rs, imm) => write!(f, "set2 r{rd}, r{rs}, {imm:#x}"),
            SET3(rd, rs, imm) => write!(f, "set3 r{rd}, r{rs}, {imm:#x}"),
            LDB(rd, rs, imm) => {
                write!(f, "ld.b r{rd}, r{rs}, {}", sign_extend_16(*imm))
            }
            LDQ(rd, rs, off) => write!(f, "ld.q r{rd}, r{rs}, {off}"),
            LDUW(rd, rs, off) => write!(f, "ld.uw r{rd}, r{rs}, {off}"),
            LDD(rd, rs, off) => write!(f, "ld.d r{rd}, r{rs}, {off}"),
            LDLW(rd, rs, off) => write!(f, "ld.lw r{rd}, r{rs}, {off}"),
            STB(rt, rs, off) => write!(f, "st.b r{rt}, r{rs}, {off}"),
            STD(rd, rs, rt, off) => write!(f, "st.d r{rd}, r{rs}, r{rt}, {off}"),
            STQ(rd, rs, rt, off) => write!(f, "st.q r{rd}, r{rs}, r{rt}, {off}"),
            CALL(rel) => write!(f, "call {}", sign_extend_24(*rel)),
            JUMP(rel) => write!(f, "jump {}", sign_extend_24(*rel)),
            BT(cmpop, rs, rel) => {
                write!(f, "b.t {cmpop:#x}, r{rs}, {}", sign_extend_16(*rel))
            }
            BF(cmpop, rs, rel) => {
                write!(f, "b.f {cmpop:#x}, r{rs}, {}", sign_extend_16(*rel))
            }
            BSET(rs, bit, rel) => {
                write!(f, "b.set r{rs}, {bit}, {}", sign_extend_16(*rel))
            }
            BCLR(rs, bit, rel) => {
                write!(f, "b.clr r{rs}, {bit}, {}", sign_extend_16(*rel))
            }
            ALUR(funct, rd, rs, rt) => {
                write!(f, "alu.r {funct:#x}, r{rd}, r{rs}, r{rt}")
            }
            ADD(rd, rs, rt) => write!(f, "add r{rd}, r{rs}, r{rt}"),
            SUB(rd, rs, rt) => write!(f, "sub r{rd}, r{rs}, r{rt}"),
            SUBS(rd, rs, rt) => write!(f, "subs r{rd}, r{rs}, r{rt}"),
            RETD => write!(f, "ret.d"),
            UNKI(op, rd, rs, imm) => {
                write!(f, "unk.i {op:#x}, r{rd}, r{rs}, {imm:#x}")
            }
            UNKR(op, rd, rs, rt, funct) => {
                write!(f, "unk.r {op:#x}, r{rd}, r{rs}, r{rt}, {funct:#x}")
            }
        }
    }
}
