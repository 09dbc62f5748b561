//! Atomic types of the iRISC instruction set.

#![warn(missing_docs)]

mod numeric;

pub use numeric::{parse_number, parse_u32, NumberError};

/// Register value type
pub type Word = u64;

/// Register index type
pub type RegisterId = u8;

/// Encoded instruction word type
pub type RawInstruction = u32;

/// 9-bits immediate value type
pub type Immediate09 = u16;

/// 11-bits immediate value type
pub type Immediate11 = u16;

/// 14-bits immediate value type
pub type Immediate14 = u16;

/// 16-bits immediate value type
pub type Immediate16 = u16;

/// 24-bits immediate value type
pub type Immediate24 = u32;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 32;

/// Size of an encoded instruction in bytes
pub const INSTRUCTION_LEN: usize = core::mem::size_of::<RawInstruction>();
