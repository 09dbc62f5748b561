//! Test-vector generation for the iRISC assembler.
//!
//! Fixtures are assembly templates: `{{ name }}` placeholders are bound
//! from a parameter assignment before the source reaches the assembler.
//! A generation run sweeps one assignment per point of the cartesian
//! product of the per-key value lists and emits one [`Shellcode`] record
//! per point.

use thiserror::Error;

mod params;
mod shellcode;
mod template;

pub use params::{parse_parameter, sweep};
pub use shellcode::Shellcode;
pub use template::{assemble_template, render_template};

/// Errors produced while generating test vectors.
#[derive(Debug, Error)]
pub enum GenError {
    /// Template rendering failed.
    #[error(transparent)]
    Template(#[from] tera::Error),

    /// The rendered source failed to assemble.
    #[error(transparent)]
    Asm(#[from] irisc_asm::AsmError),

    /// A sweep argument is not of the form `key=spec[,spec...]`.
    #[error("parameter `{0}` is missing `=`")]
    ParameterSyntax(String),

    /// A sweep value is not a number, range or `randN`.
    #[error(transparent)]
    Number(#[from] irisc_types::NumberError),
}

/// Initialize stderr logging from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}
