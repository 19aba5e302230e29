//! `uio-mmio`: maintenance access to a Rocket core's memory through a UIO window.
//!
//! ```text
//! USAGE:
//!   uio-mmio --uio /dev/uio0 layout              Print the address space map
//!   uio-mmio --uio /dev/uio0 peek <ADDR> [LEN]   Hex dump target memory
//!   uio-mmio --uio /dev/uio0 poke <ADDR> <HEX>   Write hex bytes to target memory
//!   uio-mmio --uio /dev/uio0 clear <ADDR> <LEN>  Zero-fill target memory
//!   uio-mmio --uio /dev/uio0 start               Raise MSIP to release hart 0
//!   uio-mmio --uio /dev/uio0 memtest [--len N]   Pattern test over DRAM
//! ```
//!
//! Simulator-style plusargs (`+uio=`, `+uio_size=`, `+dram_size=`) may be given
//! anywhere on the command line and take precedence over the flags.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uio_memif::common::constants::ROCKET_DRAM_BASE;
use uio_memif::config::parse_size;
use uio_memif::{MemoryAccessEngine, RegionKind, TargetMemory, UioConfig};

const DUMP_WIDTH: usize = 16;

#[derive(Parser, Debug)]
#[command(
    name = "uio-mmio",
    version,
    about = "Host access to Rocket target memory through a UIO window",
    long_about = "Maps a UIO device exposing a Rocket core's memory and runs maintenance commands on it.\n\nNumbers accept 0x (hex), leading-0 (octal) or decimal.\n\nExamples:\n  uio-mmio --uio /dev/uio0 layout\n  uio-mmio --uio /dev/uio0 peek 0x80000000 64\n  uio-mmio layout +uio=/dev/uio0 +dram_size=0x10000000"
)]
struct Cli {
    /// UIO device node (e.g. /dev/uio0).
    #[arg(long, global = true)]
    uio: Option<PathBuf>,

    /// Size of the UIO window in bytes (default 1 GiB).
    #[arg(long, global = true, value_parser = parse_number)]
    uio_size: Option<u64>,

    /// Size of the DRAM region in bytes (default 0x3fffc000).
    #[arg(long, global = true, value_parser = parse_number)]
    dram_size: Option<u64>,

    /// JSON configuration file; flags and plusargs override its fields.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the region table.
    Layout,
    /// Hex dump target memory.
    Peek {
        /// Target address.
        #[arg(value_parser = parse_number)]
        addr: u64,
        /// Bytes to read.
        #[arg(value_parser = parse_number, default_value = "64")]
        len: u64,
    },
    /// Write bytes given as a hex string (e.g. 13050000).
    Poke {
        /// Target address.
        #[arg(value_parser = parse_number)]
        addr: u64,
        /// Data as hex digits, two per byte.
        hex: String,
    },
    /// Zero-fill target memory.
    Clear {
        /// Target address.
        #[arg(value_parser = parse_number)]
        addr: u64,
        /// Bytes to clear.
        #[arg(value_parser = parse_number)]
        len: u64,
    },
    /// Write MSIP to start execution on hart 0.
    Start,
    /// Write a pattern over DRAM, read it back, clear it and check for zeros.
    Memtest {
        /// Target address of the tested range.
        #[arg(long, value_parser = parse_number, default_value = "0x80000000")]
        addr: u64,
        /// Bytes to test.
        #[arg(long, value_parser = parse_number, default_value = "0x100000")]
        len: u64,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let (plusargs, args): (Vec<String>, Vec<String>) =
        std::env::args().partition(|arg| arg.starts_with('+'));
    let cli = Cli::parse_from(args);

    match run(cli, &plusargs) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, plusargs: &[String]) -> Result<()> {
    let config = load_config(&cli, plusargs)?;
    let mut engine = MemoryAccessEngine::from_config(&config)
        .context("failed to open the target memory window")?;

    match cli.command {
        Cmd::Layout => cmd_layout(&engine),
        Cmd::Peek { addr, len } => cmd_peek(&engine, addr, to_len(len)?)?,
        Cmd::Poke { addr, hex } => cmd_poke(&mut engine, addr, &hex)?,
        Cmd::Clear { addr, len } => {
            engine.clear(addr, to_len(len)?)?;
            println!("Cleared {len:#x} bytes at {addr:#x}");
        }
        Cmd::Start => {
            engine.trigger_start()?;
            println!("MSIP raised; hart 0 released");
        }
        Cmd::Memtest { addr, len } => cmd_memtest(&mut engine, addr, to_len(len)?)?,
    }

    Ok(())
}

/// Config file, then flags, then plusargs; zero sizes fall back to defaults.
fn load_config(cli: &Cli, plusargs: &[String]) -> Result<UioConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            UioConfig::from_json(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => UioConfig::unset(),
    };

    if let Some(uio) = &cli.uio {
        config.device = Some(uio.clone());
    }
    if let Some(size) = cli.uio_size {
        config.uio_size = size;
    }
    if let Some(size) = cli.dram_size {
        config.dram_size = size;
    }

    let config = config.apply_plusargs(plusargs)?.resolved();
    tracing::debug!(?config, "Resolved configuration");
    Ok(config)
}

fn cmd_layout(engine: &MemoryAccessEngine) {
    let map = engine.map();
    println!("Window: {:#x} bytes", map.window_size());
    println!();
    println!("{:<18} {:>12} {:>12} {:>12}", "Region", "Rocket base", "Length", "UIO offset");
    for region in map.regions() {
        println!(
            "{:<18} {:>#12x} {:>#12x} {:>#12x}",
            region.kind.name(),
            region.target_base,
            region.target_len,
            region.window_offset
        );
    }
}

fn cmd_peek(engine: &MemoryAccessEngine, addr: u64, len: usize) -> Result<()> {
    // Reject before allocating; the length comes straight from the command line.
    let _ = engine.map().resolve(addr, len)?;
    let mut buf = vec![0u8; len];
    engine.read(addr, &mut buf)?;

    for (line, chunk) in buf.chunks(DUMP_WIDTH).enumerate() {
        let at = addr + (line * DUMP_WIDTH) as u64;
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        println!("{at:#010x}  {:<47}  |{ascii}|", hex.join(" "));
    }
    Ok(())
}

fn cmd_poke(engine: &mut MemoryAccessEngine, addr: u64, hex: &str) -> Result<()> {
    let data = parse_hex(hex)?;
    engine.write(addr, &data)?;
    println!("Wrote {} bytes at {addr:#x}", data.len());
    Ok(())
}

fn cmd_memtest(engine: &mut MemoryAccessEngine, addr: u64, len: usize) -> Result<()> {
    // A resolved range lies inside one region, so `addr + i` below cannot overflow.
    let _ = engine.map().resolve(addr, len)?;
    if engine.map().region_of(addr).map(|r| r.kind) != Some(RegionKind::Dram) {
        bail!("memtest range {addr:#x} is outside DRAM (base {ROCKET_DRAM_BASE:#x})");
    }

    let pattern: Vec<u8> = (0..len).map(|i| pattern_byte(addr + i as u64)).collect();
    engine.write_bytes(addr, &pattern)?;

    let mut readback = vec![0u8; len];
    engine.read_bytes(addr, &mut readback)?;
    if let Some(i) = first_mismatch(&readback, |i| pattern[i]) {
        bail!(
            "pattern mismatch at {:#x}: wrote {:#04x}, read {:#04x}",
            addr + i as u64,
            pattern[i],
            readback[i]
        );
    }

    engine.clear_bytes(addr, len)?;
    engine.read_bytes(addr, &mut readback)?;
    if let Some(i) = first_mismatch(&readback, |_| 0) {
        bail!("clear failed at {:#x}: read {:#04x}", addr + i as u64, readback[i]);
    }

    println!("memtest passed: {len:#x} bytes at {addr:#x}");
    Ok(())
}

/// Address-derived byte so that aliased or shifted accesses show up as mismatches.
const fn pattern_byte(addr: u64) -> u8 {
    let x = addr ^ (addr >> 8) ^ (addr >> 16) ^ (addr >> 24);
    (x as u8) ^ 0xa5
}

fn first_mismatch(data: &[u8], expected: impl Fn(usize) -> u8) -> Option<usize> {
    data.iter().enumerate().position(|(i, &b)| b != expected(i))
}

fn parse_hex(hex: &str) -> Result<Vec<u8>> {
    let trimmed = hex.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        bail!("hex data must contain only hex digits: {hex:?}");
    }
    if digits.is_empty() || digits.len() % 2 != 0 {
        bail!("hex data must have an even, non-zero number of digits: {hex:?}");
    }
    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let text = String::from_utf8_lossy(pair);
            u8::from_str_radix(&text, 16).with_context(|| format!("invalid hex byte {text:?}"))
        })
        .collect()
}

fn parse_number(value: &str) -> std::result::Result<u64, String> {
    parse_size(value).map_err(|e| e.to_string())
}

fn to_len(len: u64) -> Result<usize> {
    usize::try_from(len).with_context(|| format!("length {len:#x} does not fit in memory"))
}
