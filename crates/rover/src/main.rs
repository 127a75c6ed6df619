//! Rover binary.
//!
//! # Usage
//!
//! ```bash
//! # Run a routing-only rover (advertises and forwards forever)
//! rover --id 1 --group 239.77.1.1
//!
//! # Run a rover that also sends a file to rover 3 once routes converge
//! rover --id 1 --group 239.77.1.1 --send-file payload.bin --dest 3
//! ```

mod discover;
mod error;
mod supervisor;
mod system_env;

use std::{net::Ipv4Addr, path::PathBuf};

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use error::RoverError;
use supervisor::SupervisorConfig;

/// Distance-vector routing rover with stop-and-wait file transfer
#[derive(Parser, Debug)]
#[command(name = "rover")]
#[command(about = "Distance-vector routing rover with stop-and-wait file transfer")]
#[command(version)]
struct Args {
    /// This rover's numeric id (1-254); determines its synthetic private address
    #[arg(long)]
    id: u8,

    /// Control-plane multicast group address
    #[arg(long, default_value = "239.77.1.1")]
    group: Ipv4Addr,

    /// Control-plane multicast port
    #[arg(long, default_value = "34561")]
    port: u16,

    /// File to send once routes converge; requires --dest
    #[arg(long)]
    send_file: Option<PathBuf>,

    /// Destination rover id for --send-file; requires --send-file
    #[arg(long)]
    dest: Option<u8>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), RoverError> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!(id = args.id, %args.group, port = args.port, "rover starting");

    let config = SupervisorConfig { id: args.id, group: args.group, port: args.port, send_file: args.send_file, dest: args.dest };

    supervisor::run(config).await
}
