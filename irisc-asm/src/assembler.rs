//! Two-pass assembly.
//!
//! The first pass walks the operation list only to place labels; the
//! second resolves every reference and serializes the words. Both passes
//! drive the same [`Op::assemble`] code through the [`Assembler`] trait,
//! so they cannot disagree on instruction sizes.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use thiserror::Error;

use crate::field::{FieldError, Simm};
use crate::instruction::Instruction;
use crate::parser::{parse, Op, ParseError, Target};
use irisc_types::{Immediate16, Immediate24, RawInstruction};

/// Errors produced while assembling a source listing.
#[derive(Debug, Error)]
pub enum AsmError {
    /// A source line failed to parse.
    #[error("line {line}: {source} (`{text}`)")]
    Parse {
        /// One-based source line number.
        line: usize,
        /// The offending line.
        text: String,
        /// The underlying parse failure.
        #[source]
        source: ParseError,
    },

    /// The same label was bound twice in one pass.
    #[error("label `{0}` already defined")]
    DuplicateLabel(String),

    /// A referenced label was never bound.
    #[error("label `{0}` is undefined")]
    UndefinedLabel(String),

    /// A label settled at different addresses in the two passes.
    #[error("label `{name}` moved between passes ({first:#010x} != {second:#010x})")]
    UnstableLabel {
        /// The label name.
        name: String,
        /// Address recorded by the label pass.
        first: u32,
        /// Address observed by the output pass.
        second: u32,
    },

    /// A branch target is not word aligned.
    #[error("target `{label}` at {address:#010x} is not 4-byte aligned")]
    UnalignedTarget {
        /// The referenced label.
        label: String,
        /// Its resolved address.
        address: u32,
    },

    /// The base address is not word aligned.
    #[error("base address {0:#010x} is not 4-byte aligned")]
    UnalignedBase(u32),

    /// A resolved operand does not fit its field.
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// One assembly pass over the operation list.
pub trait Assembler {
    /// Address of the next emitted instruction.
    fn current_address(&self) -> u32;

    /// Bind `name` to `address`.
    fn define_label(&mut self, name: &str, address: u32) -> Result<(), AsmError>;

    /// Resolve a label to its address.
    fn lookup(&self, name: &str) -> Result<u32, AsmError>;

    /// Emit one machine instruction.
    fn emit(&mut self, instruction: Instruction) -> Result<(), AsmError>;
}

impl Op {
    /// Feed this operation through one assembly pass.
    pub fn assemble<A: Assembler + ?Sized>(&self, asm: &mut A) -> Result<(), AsmError> {
        match self {
            Op::Label(label) => asm.define_label(label.name(), asm.current_address()),
            Op::Inst(inst) => asm.emit(*inst),
            Op::Set32(rd, imm) => {
                asm.emit(Instruction::SET2(*rd, 0, (imm >> 16) as Immediate16))?;
                asm.emit(Instruction::SET3(*rd, *rd, *imm as Immediate16))
            }
            Op::Set64(rd, imm) => {
                asm.emit(Instruction::SET0(*rd, 0, (imm >> 48) as Immediate16))?;
                asm.emit(Instruction::SET1(*rd, *rd, (imm >> 32) as Immediate16))?;
                asm.emit(Instruction::SET2(*rd, *rd, (imm >> 16) as Immediate16))?;
                asm.emit(Instruction::SET3(*rd, *rd, *imm as Immediate16))
            }
            Op::Call(target) => {
                let rel = rel24(asm, target)?;
                asm.emit(Instruction::CALL(rel))
            }
            Op::Jump(target) => {
                let rel = rel24(asm, target)?;
                asm.emit(Instruction::JUMP(rel))
            }
            Op::Bt(cmpop, rs, target) => {
                let rel = rel16(asm, target)?;
                asm.emit(Instruction::BT(*cmpop, *rs, rel))
            }
            Op::Bf(cmpop, rs, target) => {
                let rel = rel16(asm, target)?;
                asm.emit(Instruction::BF(*cmpop, *rs, rel))
            }
            Op::Bset(rs, bit, target) => {
                let rel = rel16(asm, target)?;
                asm.emit(Instruction::BSET(*rs, *bit, rel))
            }
            Op::Bclr(rs, bit, target) => {
                let rel = rel16(asm, target)?;
                asm.emit(Instruction::BCLR(*rs, *bit, rel))
            }
        }
    }
}

fn word_offset<A: Assembler + ?Sized>(asm: &A, target: &Target) -> Result<i64, AsmError> {
    match target {
        Target::Offset(offset) => Ok(*offset),
        Target::Label(label) => {
            let address = asm.lookup(label.name())?;
            let delta = i64::from(address) - i64::from(asm.current_address());
            if delta & 3 != 0 {
                return Err(AsmError::UnalignedTarget {
                    label: label.name().to_string(),
                    address,
                });
            }
            Ok(delta >> 2)
        }
    }
}

fn rel24<A: Assembler + ?Sized>(asm: &A, target: &Target) -> Result<Immediate24, AsmError> {
    Ok(Simm::<24>::new(word_offset(asm, target)?)?.raw() as Immediate24)
}

fn rel16<A: Assembler + ?Sized>(asm: &A, target: &Target) -> Result<Immediate16, AsmError> {
    Ok(Simm::<16>::new(word_offset(asm, target)?)?.raw() as Immediate16)
}

/// First pass: places labels and counts instruction words.
///
/// Lookups of still-unknown labels resolve to the current address, which
/// keeps forward references aligned and in range until the output pass
/// can see the whole table.
pub struct LabelAssembler {
    base_addr: u32,
    labels: BTreeMap<String, u32>,
    offset: u32,
}

impl LabelAssembler {
    /// An empty label pass starting at `base_addr`.
    pub fn new(base_addr: u32) -> Self {
        Self {
            base_addr,
            labels: BTreeMap::new(),
            offset: 0,
        }
    }

    /// The collected label table.
    pub fn into_labels(self) -> BTreeMap<String, u32> {
        self.labels
    }
}

impl Assembler for LabelAssembler {
    fn current_address(&self) -> u32 {
        self.base_addr + self.offset
    }

    fn define_label(&mut self, name: &str, address: u32) -> Result<(), AsmError> {
        match self.labels.entry(name.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(address);
                Ok(())
            }
            Entry::Occupied(_) => Err(AsmError::DuplicateLabel(name.to_string())),
        }
    }

    fn lookup(&self, name: &str) -> Result<u32, AsmError> {
        Ok(self
            .labels
            .get(name)
            .copied()
            .unwrap_or_else(|| self.current_address()))
    }

    fn emit(&mut self, _instruction: Instruction) -> Result<(), AsmError> {
        self.offset += Instruction::LEN as u32;
        Ok(())
    }
}

/// Second pass: resolves labels against a complete table and serializes
/// instruction words big-endian.
pub struct OutputAssembler {
    base_addr: u32,
    labels: BTreeMap<String, u32>,
    output: Vec<u8>,
}

impl OutputAssembler {
    /// An output pass over the label table produced by [`LabelAssembler`].
    pub fn new(base_addr: u32, labels: BTreeMap<String, u32>) -> Self {
        Self {
            base_addr,
            labels,
            output: Vec::new(),
        }
    }

    /// The emitted code and the label table.
    pub fn into_parts(self) -> (Vec<u8>, BTreeMap<String, u32>) {
        (self.output, self.labels)
    }
}

impl Assembler for OutputAssembler {
    fn current_address(&self) -> u32 {
        self.base_addr + self.output.len() as u32
    }

    fn define_label(&mut self, name: &str, address: u32) -> Result<(), AsmError> {
        match self.labels.get(name) {
            Some(first) if *first != address => Err(AsmError::UnstableLabel {
                name: name.to_string(),
                first: *first,
                second: address,
            }),
            Some(_) => Ok(()),
            None => {
                self.labels.insert(name.to_string(), address);
                Ok(())
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<u32, AsmError> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| AsmError::UndefinedLabel(name.to_string()))
    }

    fn emit(&mut self, instruction: Instruction) -> Result<(), AsmError> {
        self.output
            .extend_from_slice(&RawInstruction::from(instruction).to_be_bytes());
        Ok(())
    }
}

/// Assemble a source listing at `base_addr`.
///
/// Returns the emitted code and the resolved label table.
pub fn assemble(
    base_addr: u32,
    source: &str,
) -> Result<(Vec<u8>, BTreeMap<String, u32>), AsmError> {
    if base_addr % Instruction::LEN as u32 != 0 {
        return Err(AsmError::UnalignedBase(base_addr));
    }

    let ops = parse(source)?;

    let mut first = LabelAssembler::new(base_addr);
    for op in &ops {
        op.assemble(&mut first)?;
    }
    tracing::debug!(labels = ?first.labels, "label pass complete");

    let mut second = OutputAssembler::new(base_addr, first.into_labels());
    for op in &ops {
        op.assemble(&mut second)?;
    }
    tracing::debug!(bytes = second.output.len(), "output pass complete");

    Ok(second.into_parts())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(code: &[u8]) -> Vec<u32> {
        code.chunks_exact(4)
            .map(|chunk| u32::from_be_bytes(chunk.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn backward_jump() {
        let (code, labels) = assemble(
            0,
            r#"
            lbl start
            addi r1, r0, 1
            jump start
        "#,
        )
        .unwrap();

        assert_eq!(labels.get("start"), Some(&0));
        assert_eq!(words(&code), vec![0x0001_0001, 0x95ff_ffff]);
    }

    #[test]
    fn forward_branch() {
        let (code, labels) = assemble(
            0,
            r#"
            lbl setup
            set0 r1, r0, 0xdead
            lbl test
            b.t 0x3, r4, taken
            add r3, r1, r2
            lbl taken
            ret.d
        "#,
        )
        .unwrap();

        assert_eq!(labels.get("taken"), Some(&12));
        assert_eq!(
            words(&code),
            vec![0x1801_dead, 0xa083_0002, 0xfc23_1000, 0xfc00_002d]
        );
    }

    #[test]
    fn base_address_shifts_labels_not_offsets() {
        let source = r#"
            lbl loop
            sub r1, r1, r2
            b.f 0x0, r1, loop
        "#;

        let (low, low_labels) = assemble(0, source).unwrap();
        let (high, high_labels) = assemble(0x1000, source).unwrap();

        assert_eq!(low, high);
        assert_eq!(low_labels.get("loop"), Some(&0));
        assert_eq!(high_labels.get("loop"), Some(&0x1000));
    }

    #[test]
    fn set64_expands_to_four_words() {
        let (code, labels) = assemble(
            0,
            r#"
            set64 r5, 0x8765432112345678
            lbl after
        "#,
        )
        .unwrap();

        assert_eq!(labels.get("after"), Some(&16));
        assert_eq!(
            words(&code),
            vec![0x1805_8765, 0x1ca5_4321, 0x24a5_1234, 0x20a5_5678]
        );
    }

    #[test]
    fn set32_expands_to_two_words() {
        let (code, _) = assemble(0, "set32 r5, 0xdeadbeef").unwrap();
        assert_eq!(words(&code), vec![0x2405_dead, 0x20a5_beef]);
    }

    #[test]
    fn numeric_targets_bypass_the_label_table() {
        let (code, _) = assemble(0, "jump -2").unwrap();
        assert_eq!(words(&code), vec![0x95ff_fffe]);
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let err = assemble(
            0,
            r#"
            lbl here
            lbl here
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, AsmError::DuplicateLabel(name) if name == "here"));
    }

    #[test]
    fn undefined_label_is_rejected() {
        let err = assemble(0, "jump nowhere").unwrap_err();
        assert!(matches!(err, AsmError::UndefinedLabel(name) if name == "nowhere"));
    }

    #[test]
    fn unaligned_base_is_rejected() {
        assert!(matches!(
            assemble(2, "ret.d"),
            Err(AsmError::UnalignedBase(2))
        ));
    }

    #[test]
    fn branch_out_of_range_is_rejected() {
        // rel16 covers +/- 2^15 words; distance here is 40000 words.
        let mut source = String::from("b.t 0x0, r1, far\n");
        for _ in 0..40_000 {
            source.push_str("add r1, r1, r1\n");
        }
        source.push_str("lbl far\n");

        assert!(matches!(
            assemble(0, &source),
            Err(AsmError::Field(FieldError::SignedOverflow { bits: 16, .. }))
        ));
    }
}
