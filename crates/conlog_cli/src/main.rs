//! conlog CLI
//!
//! Captures a device console into a rotating log directory and shares a
//! serial line with telnet clients.
//!
//! # Commands
//!
//! - `run` - Capture and bridge until interrupted
//! - `inspect` - Display log directory statistics
//! - `dump` - Print segment contents
//! - `rotate` - Run one rotation check

mod commands;

use clap::{Args, Parser, Subcommand};
use commands::run::RunOptions;
use conlog_core::{
    RotationConfig, DEFAULT_MAX_SEGMENT_SIZE, DEFAULT_RENEW_INTERVAL, DEFAULT_RESERVE_FREE_BYTES,
};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Rotating console log and serial bridge.
#[derive(Parser)]
#[command(name = "conlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the log directory
    #[arg(global = true, short, long)]
    log_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Capacity budget of the log directory.
#[derive(Args)]
struct BudgetArgs {
    /// Rotate segments larger than this many bytes
    #[arg(long, default_value_t = DEFAULT_MAX_SEGMENT_SIZE)]
    max_segment_size: u64,

    /// Delete the oldest segment when free space drops below this many bytes
    #[arg(long, default_value_t = DEFAULT_RESERVE_FREE_BYTES)]
    reserve: u64,

    /// Seconds between rotation checks
    #[arg(long, default_value_t = DEFAULT_RENEW_INTERVAL.as_secs())]
    renew_secs: u64,
}

impl BudgetArgs {
    fn config(&self) -> RotationConfig {
        RotationConfig::new()
            .max_segment_size(self.max_segment_size)
            .reserve_free_bytes(self.reserve)
            .renew_interval(Duration::from_secs(self.renew_secs))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the console and bridge the serial line until interrupted
    Run {
        /// Console device or file to capture ("-" for stdin)
        #[arg(short, long)]
        console: Option<PathBuf>,

        /// Serial device to share with network clients
        #[arg(short, long)]
        serial: Option<PathBuf>,

        /// Address to listen on for network clients
        #[arg(long, default_value = "0.0.0.0")]
        bind: IpAddr,

        /// Port to listen on for network clients
        #[arg(short, long, default_value_t = conlog_bridge::DEFAULT_PORT)]
        port: u16,

        /// Number of simultaneous network clients
        #[arg(long, default_value_t = 1)]
        max_peers: usize,

        /// Milliseconds between polls
        #[arg(long, default_value_t = 10)]
        poll_ms: u64,

        /// Bytes moved per poll
        #[arg(long, default_value_t = 256)]
        scratch: usize,

        #[command(flatten)]
        budget: BudgetArgs,
    },

    /// Display log directory statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print segment contents to stdout
    Dump {
        /// Only this segment (default: all, oldest first)
        #[arg(short, long)]
        segment: Option<u64>,

        /// Omit timestamp markers
        #[arg(long)]
        no_markers: bool,
    },

    /// Open the log, run one rotation check and close it
    Rotate {
        #[command(flatten)]
        budget: BudgetArgs,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            console,
            serial,
            bind,
            port,
            max_peers,
            poll_ms,
            scratch,
            budget,
        } => {
            let log_dir = cli.log_dir.ok_or("Log directory required for run")?;
            let options = RunOptions {
                log_dir,
                console,
                serial,
                bind: (bind, port).into(),
                max_peers,
                poll_interval: Duration::from_millis(poll_ms.max(1)),
                scratch: scratch.max(1),
                rotation: budget.config(),
            };
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
                .block_on(commands::run::run(options))?;
        }
        Commands::Inspect { format } => {
            let log_dir = cli.log_dir.ok_or("Log directory required for inspect")?;
            commands::inspect::run(&log_dir, &format)?;
        }
        Commands::Dump {
            segment,
            no_markers,
        } => {
            let log_dir = cli.log_dir.ok_or("Log directory required for dump")?;
            commands::dump::run(&log_dir, segment, no_markers)?;
        }
        Commands::Rotate { budget } => {
            let log_dir = cli.log_dir.ok_or("Log directory required for rotate")?;
            commands::rotate::run(&log_dir, budget.config())?;
        }
        Commands::Version => {
            println!("conlog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("conlog core v{}", conlog_core::VERSION);
        }
    }

    Ok(())
}
