//! netmon - capture packet addresses from a raw socket.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use netmon::capture::list_interfaces;
use netmon::reporter::{DatasetReporter, SourceHistogram, TableReporter, MAX_WIDTH};
use netmon::{CaptureError, CaptureProtocol, Config, ControllerError, SinkError, StopReason};

/// Poll interval used so Ctrl+C can interrupt a blocked receive
const INTERRUPT_POLL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "netmon")]
#[command(about = "Capture packet source/destination addresses from a raw socket")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture packets and save their addresses to CSV (requires root)
    Capture {
        /// Number of packets to capture
        #[arg(short = 'n', long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
        count: u64,
        /// Output CSV file [default: packet_log.csv]
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Local IPv4 address to bind
        #[arg(long)]
        bind: Option<std::net::Ipv4Addr>,
        /// Interface to capture on (first up, non-loopback interface if omitted)
        #[arg(short, long)]
        interface: Option<String>,
        /// IP protocol to capture: ip, tcp, udp or icmp
        #[arg(short, long)]
        protocol: Option<CaptureProtocol>,
        /// Receive buffer size in bytes
        #[arg(long)]
        buffer_size: Option<usize>,
    },
    /// Display captured data as a table
    Show {
        /// CSV file to read [default: packet_log.csv]
        path: Option<PathBuf>,
        /// Show at most this many rows
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Chart how many packets came from each source address
    Stats {
        /// CSV file to read [default: packet_log.csv]
        path: Option<PathBuf>,
        /// Length of the longest bar (1-1000)
        #[arg(short, long, default_value_t = 50, value_parser = clap::value_parser!(u16).range(1..=MAX_WIDTH as i64))]
        width: u16,
        /// Show only the most frequent sources
        #[arg(short, long)]
        top: Option<usize>,
    },
    /// List available network interfaces
    Interfaces,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("netmon=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> Result<Config> {
    Config::load().context("failed to load configuration")
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Capture {
            count,
            output,
            bind,
            interface,
            protocol,
            buffer_size,
        } => {
            let mut config = load_config()?;
            if let Some(output) = output {
                config.output_path = output;
            }
            if bind.is_some() {
                config.bind_address = bind;
            }
            if interface.is_some() {
                config.interface = interface;
            }
            if let Some(protocol) = protocol {
                config.protocol = protocol;
            }
            if let Some(size) = buffer_size {
                config.buffer_size = size;
            }
            capture(&config, count as usize)
        }
        Commands::Show { path, limit } => {
            let path = match path {
                Some(path) => path,
                None => load_config()?.output_path,
            };
            let Some(dataset) = load_or_hint(&path)? else {
                return Ok(());
            };
            TableReporter::new().with_limit(limit).report(&dataset);
            Ok(())
        }
        Commands::Stats { path, width, top } => {
            let path = match path {
                Some(path) => path,
                None => load_config()?.output_path,
            };
            let Some(dataset) = load_or_hint(&path)? else {
                return Ok(());
            };
            SourceHistogram::new()
                .with_width(usize::from(width))
                .with_top(top)
                .report(&dataset);
            Ok(())
        }
        Commands::Interfaces => {
            for iface in list_interfaces() {
                println!("{}", iface);
            }
            Ok(())
        }
    }
}

fn capture(config: &Config, packet_count: usize) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("failed to install Ctrl+C handler")?;

    let mut config = config.clone();
    if config.poll_interval.is_none() {
        config.poll_interval = Some(INTERRUPT_POLL);
    }

    println!("Capturing {} packets... (Ctrl+C to stop)", packet_count);

    let report = match netmon::capture_packets(&config, packet_count, Some(running)) {
        Ok(report) => report,
        Err(ControllerError::Capture(CaptureError::PermissionDenied)) => {
            anyhow::bail!("Permission denied: run netmon as root (or with CAP_NET_RAW)")
        }
        Err(e) => return Err(e).context("capture failed"),
    };

    match &report.stop {
        StopReason::Completed => println!(
            "\nPacket capture completed. Data saved to {}.",
            config.output_path.display()
        ),
        stop => println!(
            "\nPacket capture stopped early ({}). {} records saved to {}.",
            stop,
            report.dataset.len(),
            config.output_path.display()
        ),
    }
    if report.skipped > 0 {
        println!("{} truncated packets were skipped.", report.skipped);
    }
    Ok(())
}

/// Load a dataset, printing the "capture first" hint when none exists.
fn load_or_hint(path: &std::path::Path) -> Result<Option<netmon::CaptureDataset>> {
    match netmon::load_dataset(path) {
        Ok(dataset) => Ok(Some(dataset)),
        Err(SinkError::DatasetNotFound(_)) => {
            println!("No packet data found. Please capture packets first.");
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}
