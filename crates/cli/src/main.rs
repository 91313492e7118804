use anyhow::Result;
use clap::{Parser, Subcommand};

mod app;
mod commands;

use arcadia_core::{AppConfig, ConfigLoader};
use commands::{DemoArgs, TradeArgs};

#[derive(Parser)]
#[command(name = "arcadia")]
#[command(about = "Wallet-gated memecoin trading simulator", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/Config.toml")]
    config: String,

    /// Seed for reproducible fills and wallet addresses (overrides config)
    #[arg(long, global = true, env = "ARCADIA_SEED")]
    seed: Option<u64>,

    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted session: detect, connect, trade, sign, exit, disconnect
    Demo(DemoArgs),
    /// Connect a wallet and place simulated trades
    Trade(TradeArgs),
    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_file.as_deref())?;

    let mut config = ConfigLoader::load_from(&cli.config)?;
    apply_overrides(&mut config, cli.seed);

    match cli.command {
        Commands::Demo(args) => commands::run_demo(&config, args).await,
        Commands::Trade(args) => commands::run_trade(&config, args).await,
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn init_logging(log_file: Option<&str>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn apply_overrides(config: &mut AppConfig, seed: Option<u64>) {
    if let Some(seed) = seed {
        config.simulator.random_seed = Some(seed);
    }
}
