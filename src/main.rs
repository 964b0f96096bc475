use std::path::PathBuf;

use clap::{Parser, Subcommand};
use marketmirror::app::App;
use marketmirror::config::Config;
use marketmirror::error::Result;
use tokio::signal;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "marketmirror", version, about = "Mirror regional order books into a snapshot cache")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Hub pass followed by the bulk pass (the default).
    Run,
    /// Only the priority hub regions.
    Hubs,
    /// Every region except the hubs.
    Bulk,
    /// Regenerate one region unconditionally.
    Region { region_id: u32 },
}

async fn dispatch(command: Option<Command>, config: Config) -> Result<()> {
    match command {
        None | Some(Command::Run) => App::run(config).await,
        Some(Command::Hubs) => App::run_hubs(config).await,
        Some(Command::Bulk) => App::run_bulk(config).await,
        Some(Command::Region { region_id }) => App::run_region(config, region_id).await,
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    config.init_logging();
    info!("marketmirror starting");

    tokio::select! {
        result = dispatch(cli.command, config) => {
            if let Err(e) = result {
                error!(error = %e, "Fatal error");
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("marketmirror stopped");
}
