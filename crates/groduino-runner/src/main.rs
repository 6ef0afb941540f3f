//! `groduino`: run the controller against a host over a serial port or TCP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use groduino_link::{ByteStream, LinkConfig, LinkConnection};
use groduino_runner::{
    Controller, RunnerConfig, RunnerError, RunnerResult, SerialByteStream, TcpByteStream,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "groduino", version, about = "Serial link controller for a Groduino growing chamber")]
struct Cli {
    /// YAML configuration file (defaults to the stock board layout).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Talk to the host over this serial device at the configured baud rate.
    #[arg(long, value_name = "PATH", conflicts_with_all = ["listen", "connect"])]
    serial: Option<String>,

    /// Wait for the host to connect on this address.
    #[arg(long, value_name = "ADDR", conflicts_with = "connect")]
    listen: Option<String>,

    /// Connect to a host listening on this address.
    #[arg(long, value_name = "ADDR")]
    connect: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,

    /// Serve Prometheus metrics on this address.
    #[arg(long, value_name = "ADDR")]
    metrics_addr: Option<SocketAddr>,

    /// Print the effective configuration as YAML and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> RunnerResult<()> {
    let config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            RunnerConfig::load(path)?
        }
        None => RunnerConfig::default(),
    };

    if cli.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    if let Some(addr) = cli.metrics_addr {
        install_metrics(addr);
    }

    let router = config.build_router()?;

    let link_config = LinkConfig::from(&config.link);
    let stream: Box<dyn ByteStream> = match (&cli.serial, &cli.listen, &cli.connect) {
        (Some(path), _, _) => Box::new(SerialByteStream::open(path, link_config.baud_rate)?),
        (None, Some(addr), _) => Box::new(TcpByteStream::listen(addr.as_str())?),
        (None, None, Some(addr)) => Box::new(TcpByteStream::connect(addr.as_str())?),
        (None, None, None) => {
            return Err(RunnerError::ConfigError(
                "one of --serial, --listen or --connect is required".to_string(),
            ))
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let link = LinkConnection::new(stream, link_config);
    let mut controller = Controller::new(link, router, config.telemetry_interval());
    controller.start()?;
    controller.run(&shutdown, config.poll_interval())
}

#[cfg(feature = "prometheus")]
fn install_metrics(addr: SocketAddr) {
    match groduino_metrics::install_prometheus(addr) {
        Ok(()) => info!("Serving metrics on http://{}/metrics", addr),
        Err(e) => warn!("Could not start metrics exporter: {}", e),
    }
}

#[cfg(not(feature = "prometheus"))]
fn install_metrics(addr: SocketAddr) {
    warn!(
        "Ignoring --metrics-addr {}: built without the prometheus feature",
        addr
    );
}
