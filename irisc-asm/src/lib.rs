//! iRISC instruction set: encoding, decoding and a two-pass assembler.
//!
//! The crate is split along the path a source line travels:
//!
//! - [`field`] — typed bit fields of the 32-bit instruction word.
//! - [`opcode`] — the primary opcode table and sub-operation selectors.
//! - [`instruction`] — machine instructions, raw-word conversion both
//!   ways, and disassembly.
//! - [`parser`] — source text to operation lists.
//! - [`assembler`] — label placement and word emission over two passes.
//!
//! ```
//! let (code, labels) = irisc_asm::assemble(
//!     0,
//!     r#"
//!     lbl start
//!     addi r1, r0, 1
//!     jump start
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(labels.get("start"), Some(&0));
//! assert_eq!(code.len(), 8);
//! ```

#![warn(missing_docs)]

pub mod assembler;
pub mod field;
pub mod instruction;
pub mod opcode;
pub mod parser;

pub use assembler::{assemble, AsmError, Assembler, LabelAssembler, OutputAssembler};
pub use field::{Bits, FieldError};
pub use instruction::Instruction;
pub use opcode::{AluFunct, InvalidOpcode, JumpKind, MemWidth, OpcodeRepr};
pub use parser::{parse, Label, Op, ParseError, Target};

#[doc(no_inline)]
pub use irisc_types::{
    self, Immediate09, Immediate11, Immediate14, Immediate16, Immediate24, RawInstruction,
    RegisterId, Word,
};
