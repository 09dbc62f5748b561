//! Render a templated fixture across its parameter sweep and emit one
//! JSON shellcode record per combination.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use irisc_gen::{assemble_template, parse_parameter, sweep, Shellcode};
use irisc_types::parse_u32;

#[derive(Parser, Debug)]
#[command(version, about = "Generate iRISC test vectors from a templated fixture")]
struct Args {
    /// Template file to render and assemble.
    input: PathBuf,

    /// Destination for JSON-lines shellcode records.
    output: PathBuf,

    /// Load address of the first instruction (decimal or hex).
    #[arg(short, long, default_value = "0", value_parser = parse_u32)]
    base_addr: u32,

    /// Sweep parameter, `key=spec[,spec...]`; may be given repeatedly.
    /// Specs are numbers, inclusive `lo-hi` ranges, or `rand8`/`rand16`/
    /// `rand32`/`rand64`.
    #[arg(short, long, value_parser = parse_parameter)]
    param: Vec<(String, Vec<u64>)>,
}

fn main() -> anyhow::Result<()> {
    irisc_gen::init_tracing();
    let args = Args::parse();

    let template = fs::read_to_string(&args.input)
        .with_context(|| format!("could not read {}", args.input.display()))?;

    let file = File::create(&args.output)
        .with_context(|| format!("could not create {}", args.output.display()))?;
    let mut out = BufWriter::new(file);

    let combinations = sweep(&args.param);
    tracing::info!(vectors = combinations.len(), "sweeping fixture");

    for parameters in combinations {
        let (code, labels) = assemble_template(args.base_addr, &template, &parameters)?;
        let record = Shellcode {
            code,
            parameters,
            labels,
        };
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
    }

    out.flush().context("could not flush output")?;
    Ok(())
}
