//! Primary opcodes and sub-operation selectors.
//!
//! The 6-bit primary opcode picks an instruction family; three families
//! need a second selector to pin down the operation: `funct` for the ALU
//! group, the jump kind for `call`/`jump`, and the 2-bit width for the
//! multi-width loads and stores.

use thiserror::Error;

use crate::field::{Bits, Opcode};
use irisc_types::RawInstruction;

/// Failed to map a raw value onto an opcode or selector table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid opcode")]
pub struct InvalidOpcode;

macro_rules! enum_try_from {
    (
        $(#[$meta:meta])* $vis:vis enum $name:ident from $raw:ty {
            $($(#[$vmeta:meta])* $vname:ident = $val:expr,)*
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($(#[$vmeta])* $vname = $val,)*
        }

        impl core::convert::TryFrom<$raw> for $name {
            type Error = InvalidOpcode;

            fn try_from(value: $raw) -> Result<Self, Self::Error> {
                match value {
                    $(x if x == $name::$vname as $raw => Ok($name::$vname),)*
                    _ => Err(InvalidOpcode),
                }
            }
        }
    }
}

enum_try_from! {
    /// The 6-bit primary opcode space.
    ///
    /// `SET3` sits below `SET2`; the numbering is a quirk of the target
    /// hardware and is preserved here.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[repr(u8)]
    pub enum OpcodeRepr from u8 {
        /// Add signed immediate.
        ADDI = 0x00,
        /// Set register bits `[63:48]`.
        SET0 = 0x06,
        /// Set register bits `[47:32]`.
        SET1 = 0x07,
        /// Set register bits `[15:0]`.
        SET3 = 0x08,
        /// Set register bits `[31:16]`.
        SET2 = 0x09,
        /// Load byte.
        LDB = 0x18,
        /// Multi-width load; width selector in bits `[1:0]`.
        LD = 0x19,
        /// Store byte.
        STB = 0x1a,
        /// Store double word.
        STD = 0x1b,
        /// Store quad word.
        STQ = 0x1e,
        /// Relative jump family; kind selector in bits `[25:24]`.
        JMP = 0x25,
        /// Branch if condition true.
        BT = 0x28,
        /// Branch if condition false.
        BF = 0x29,
        /// Branch if selected bit set.
        BSET = 0x2a,
        /// Branch if selected bit clear.
        BCLR = 0x2b,
        /// Register ALU family; function selector in bits `[10:0]`.
        ALU = 0x3f,
    }
}

impl From<OpcodeRepr> for Opcode {
    fn from(repr: OpcodeRepr) -> Self {
        Opcode::fixed(repr as u8)
    }
}

enum_try_from! {
    /// ALU function numbers with a dedicated mnemonic.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[repr(u16)]
    pub enum AluFunct from u16 {
        /// `add`
        ADD = 0x000,
        /// `sub`
        SUB = 0x004,
        /// `subs`
        SUBS = 0x005,
        /// `ret.d`
        RETD = 0x02d,
    }
}

impl Bits for AluFunct {
    fn bits(&self) -> RawInstruction {
        *self as RawInstruction
    }
}

enum_try_from! {
    /// Jump kind selector of the `0x25` family, bits `[25:24]`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[repr(u8)]
    pub enum JumpKind from u8 {
        /// `call` — jump and link.
        CALL = 0x0,
        /// `jump` — plain relative jump.
        JUMP = 0x1,
    }
}

impl Bits for JumpKind {
    fn bits(&self) -> RawInstruction {
        (*self as RawInstruction) << 24
    }
}

/// Width selector of the multi-width loads and stores, bits `[1:0]`.
///
/// The names mirror the mnemonic suffixes: `ld.q`, `ld.uw`, `ld.d`,
/// `ld.lw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MemWidth {
    /// Quad word.
    Q = 0x0,
    /// Upper word.
    UW = 0x1,
    /// Double word.
    D = 0x2,
    /// Lower word.
    LW = 0x3,
}

impl MemWidth {
    /// The mnemonic suffix of this width.
    pub const fn suffix(&self) -> &'static str {
        match self {
            MemWidth::Q => "q",
            MemWidth::UW => "uw",
            MemWidth::D => "d",
            MemWidth::LW => "lw",
        }
    }
}

impl From<u8> for MemWidth {
    fn from(value: u8) -> Self {
        match value & 0x3 {
            0x0 => MemWidth::Q,
            0x1 => MemWidth::UW,
            0x2 => MemWidth::D,
            _ => MemWidth::LW,
        }
    }
}

impl Bits for MemWidth {
    fn bits(&self) -> RawInstruction {
        *self as RawInstruction
    }
}
