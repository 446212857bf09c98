//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use sift_core::config::{self, Config};
use sift_core::{interrupt, logging};

#[derive(Parser)]
#[command(name = "sift")]
#[command(version = "0.1")]
#[command(about = "Retail data insight chat (simulated agent)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Play turns instantly (no typing cadence or step delays)
    #[arg(long)]
    fast: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    interrupt::init();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let mut config = Config::load().context("load config")?;
    if cli.fast {
        config.timing = config::TimingConfig::instant();
    }

    // default to chat mode
    let Some(command) = cli.command else {
        let _guard = logging::init(&config).context("init logging")?;
        return sift_tui::run_chat(&config).await;
    };

    match command {
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                println!("{}", config::paths::config_path().display());
                Ok(())
            }
            ConfigCommands::Init => {
                let path = config::paths::config_path();
                if Config::init_at(&path)? {
                    println!("Created {}", path.display());
                } else {
                    println!("Config already exists at {}", path.display());
                }
                Ok(())
            }
        },
    }
}
