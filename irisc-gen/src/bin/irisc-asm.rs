//! Assemble one iRISC source file into a raw binary image.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use irisc_types::parse_u32;

#[derive(Parser, Debug)]
#[command(version, about = "Assemble an iRISC source file into a raw image")]
struct Args {
    /// Source file to assemble.
    input: PathBuf,

    /// Destination for the raw image.
    output: PathBuf,

    /// Load address of the first instruction (decimal or hex).
    #[arg(short, long, default_value = "0", value_parser = parse_u32)]
    base_addr: u32,
}

fn main() -> anyhow::Result<()> {
    irisc_gen::init_tracing();
    let args = Args::parse();

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("could not read {}", args.input.display()))?;

    let (code, labels) = irisc_asm::assemble(args.base_addr, &source)?;
    tracing::info!(?labels, bytes = code.len(), "assembled");

    fs::write(&args.output, &code)
        .with_context(|| format!("could not write {}", args.output.display()))?;

    Ok(())
}
