//! irkit CLI - decode stored infrared captures.
//!
//! Reads capture files (JSON records or plain tick lists), runs every
//! registered protocol decoder against each capture, and prints the
//! outcome. Logs go to stderr; raise the filter to `irkit=trace` to see
//! the decoder's bit-stream narration.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use irkit::capture::{Capture, CaptureStatus};
use irkit::protocols::{ProtocolRegistry, RstepAddress};
use irkit::storage;

#[derive(Parser)]
#[command(name = "irkit", version, about = "Infrared remote signal decoding toolkit")]
struct Cli {
    /// Capture files: .json capture records, or plain tick lists
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print the decoded captures as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Log filter (e.g. irkit=trace for bit-stream narration)
    #[arg(long, env = "IRKIT_LOG", default_value = "irkit=info")]
    log: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&cli.log))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let registry = ProtocolRegistry::new();
    let mut captures = Vec::new();

    for path in &cli.files {
        let mut loaded = load_file(path, captures.len() as u32)?;
        for capture in &mut loaded {
            if let Some((name, frame)) = registry.try_decode(&capture.raw_ticks) {
                capture.apply_decode(&name, &frame);
            } else {
                tracing::info!(id = capture.id, "no protocol matched");
            }
        }
        captures.extend(loaded);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&captures)?);
    } else {
        for capture in &captures {
            print_capture(capture);
        }
    }

    Ok(())
}

/// Load one input file as captures. JSON files carry full records; any
/// other file is treated as a single raw tick list.
fn load_file(path: &Path, next_id: u32) -> Result<Vec<Capture>> {
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        storage::load_captures(path)
    } else {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tick list {:?}", path))?;
        let ticks = storage::parse_tick_list(&text)
            .with_context(|| format!("Failed to parse tick list {:?}", path))?;
        Ok(vec![Capture::from_ticks(next_id, ticks)])
    }
}

fn print_capture(capture: &Capture) {
    match capture.status {
        CaptureStatus::Decoded => {
            println!(
                "#{:<3} {}  {:<8} address={} value={} ({})",
                capture.id,
                capture.timestamp_short(),
                capture.protocol_name(),
                capture.address_hex(),
                capture.value_hex(),
                capture.bits_str(),
            );
            if capture.protocol_name() == "rStep" {
                let addr = RstepAddress(capture.address);
                println!(
                    "     customer=0x{:X} address={} frametype={} battery={}",
                    addr.customer_id(),
                    addr.unit_address(),
                    addr.frame_type(),
                    if addr.battery_ok() { "ok" } else { "low" },
                );
            }
        }
        CaptureStatus::Unknown => {
            println!(
                "#{:<3} {}  no protocol matched ({} pulses, {} µs)",
                capture.id,
                capture.timestamp_short(),
                capture.pulse_count(),
                capture.duration_us(),
            );
        }
    }
}
