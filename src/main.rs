/// iBooks Library Client - Main entry point
///
/// A command-line client for the iBooks library REST backend
use anyhow::Context;
use clap::Parser;
use ibooks_client::{client::LibraryClient, config::ClientConfig};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ibooks")]
#[command(about = "iBooks Library Client - Browse, borrow and manage books")]
struct Args {
    /// Server URL (default: http://localhost:4000)
    #[arg(long, env = "IBOOKS_SERVER", default_value = ibooks_client::config::DEFAULT_SERVER_URL)]
    server: String,

    /// Data directory for the session database (default: ~/.ibooks)
    #[arg(long, env = "IBOOKS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Request timeout in seconds (default: none)
    #[arg(long)]
    timeout: Option<u64>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Enable verbose logging (DEBUG level)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let config = ClientConfig::new(&args.server, args.data_dir)
        .context("Failed to resolve data directory")?
        .with_timeout(args.timeout)
        .assume_yes(args.yes);

    info!("Starting iBooks client");
    info!("Server: {}", config.server_url);
    info!("Data directory: {}", config.data_dir.display());

    let mut client = LibraryClient::new(config).context("Failed to initialize client")?;
    client.run().await.context("Client loop failed")?;

    Ok(())
}
