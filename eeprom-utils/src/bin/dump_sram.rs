use anyhow::Context;
use clap::Parser;
use eeprom_core::fs;
use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
};
use tracing::info;

const ERASED: u8 = 0xFF;

fn main() -> anyhow::Result<()> {
    eeprom_utils::logging::init();
    let opt = Opt::parse();

    let data: Vec<u8> =
        fs::load(&opt.path).with_context(|| format!("failed to load {:?}", opt.path))?;
    info!("loaded {} bytes from {:?}", data.len(), opt.path);

    let mut out = BufWriter::new(io::stdout().lock());
    let width = usize::from(opt.width);
    let mut skipped = false;
    for (row, chunk) in data.chunks(width).enumerate() {
        if !opt.all && chunk.iter().all(|&b| b == ERASED) {
            if !skipped {
                writeln!(out, "*")?;
                skipped = true;
            }
            continue;
        }
        skipped = false;

        write!(out, "{:04X}:", row * width)?;
        for byte in chunk {
            write!(out, " {byte:02X}")?;
        }
        for _ in chunk.len()..width {
            write!(out, "   ")?;
        }
        let text: String = chunk
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    char::from(b)
                } else {
                    '.'
                }
            })
            .collect();
        writeln!(out, "  |{text}|")?;
    }

    let erased = data.iter().filter(|&&b| b == ERASED).count();
    writeln!(out, "{} bytes, {erased} erased", data.len())?;
    out.flush()?;
    Ok(())
}

/// Hex dump a serial EEPROM battery save.
#[derive(Parser, Debug)]
#[command(version)]
#[must_use]
struct Opt {
    /// Path to a `.eep` save file.
    path: PathBuf,
    /// Bytes per row.
    #[arg(short, long, default_value_t = 16, value_parser = clap::value_parser!(u16).range(1..=64))]
    width: u16,
    /// Print erased rows instead of collapsing them.
    #[arg(short, long)]
    all: bool,
}
