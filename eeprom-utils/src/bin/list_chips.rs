use anyhow::Context;
use clap::Parser;
use eeprom_core::{
    chip::Line,
    database::{ChipDatabase, GameEntry},
};
use std::num::ParseIntError;
use tracing::debug;

fn main() -> anyhow::Result<()> {
    eeprom_utils::logging::init();
    let opt = Opt::parse();

    let db = ChipDatabase::global();
    let entries: Vec<&GameEntry> = match &opt.serial {
        Some(serial) => vec![db
            .lookup(serial.as_bytes(), opt.checksum)
            .with_context(|| format!("failed to find {serial}"))?],
        None => db.entries().iter().collect(),
    };
    debug!("listing {} of {} entries", entries.len(), db.len());

    if opt.json {
        let json = serde_json::to_string_pretty(&entries).context("failed to serialize entries")?;
        println!("{json}");
        return Ok(());
    }

    println!(
        "{:<12} {:>8} {:<6} {:>5}  {:<12} {:<12} {:<12} Title",
        "Serial", "Checksum", "Chip", "Bytes", "SCL", "SDA in", "SDA out"
    );
    for entry in entries {
        let GameEntry {
            game_id,
            checksum,
            profile,
            title,
        } = entry;
        let checksum = match checksum {
            0 => String::from("-"),
            checksum => format!("${checksum:04X}"),
        };
        let wiring = profile.wiring();
        println!(
            "{game_id:<12} {checksum:>8} {:<6} {:>5}  {:<12} {:<12} {:<12} {title}",
            profile.part_name(),
            profile.capacity(),
            line(wiring.scl),
            line(wiring.sda_in),
            line(wiring.sda_out),
        );
    }
    Ok(())
}

fn line(line: Line) -> String {
    format!("${:06X}.{}", line.addr, line.bit)
}

fn parse_checksum(checksum: &str) -> Result<u16, ParseIntError> {
    let checksum = checksum
        .trim_start_matches("0x")
        .trim_start_matches("0X")
        .trim_start_matches('$');
    u16::from_str_radix(checksum, 16)
}

/// List games with serial EEPROMs and how their chips are wired.
#[derive(Parser, Debug)]
#[command(version)]
#[must_use]
struct Opt {
    /// Only show the entry matching this ROM serial, without the `GM ` prefix.
    #[arg(short, long)]
    serial: Option<String>,
    /// ROM header checksum in hex, for serials shared by several games.
    #[arg(short, long, default_value = "0", value_parser = parse_checksum)]
    checksum: u16,
    /// Print entries as JSON.
    #[arg(long)]
    json: bool,
}
