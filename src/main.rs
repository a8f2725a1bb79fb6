//! nowplaying-bridge - publishes the active media player to a display over MQTT.

use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use nowplaying_bridge::{
    app,
    config::{Config, ConfigPaths},
    tracing_config,
};
use tracing::{Level, info, span};

#[derive(Parser)]
#[command(name = "nowplaying-bridge")]
#[command(about = "Bridge the active media player to an MQTT display", version)]
struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/nowplaying-bridge/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bridge (default)
    Run,
    /// Poll every enabled source once and print what would be published
    Players,
    /// Print the effective configuration with secrets redacted
    Config,
    /// Print the configuration JSON schema
    Schema,
}

fn load_config(path: Option<PathBuf>) -> Result<Config, Box<dyn Error>> {
    let path = match path {
        Some(path) => path,
        None => ConfigPaths::main_config()?,
    };

    Ok(Config::load_effective(&path, |key| std::env::var(key).ok())?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let config = load_config(cli.config)?;

            let _guard = if config.general.log_to_file {
                Some(tracing_config::init_with_file(config.general.log_level)?)
            } else {
                tracing_config::init(config.general.log_level)?;
                None
            };

            let _span = span!(Level::INFO, "nowplaying_bridge").entered();
            info!(version = env!("CARGO_PKG_VERSION"), "starting");

            app::run(config).await?;
        }
        Commands::Players => {
            let config = load_config(cli.config)?;
            tracing_config::init(config.general.log_level)?;

            let report = app::list_players(&config).await?;
            for (kind, snapshots) in &report.readings {
                println!("[{kind}]");
                for snapshot in snapshots {
                    println!(
                        "  {:<8} {} - {} ({})",
                        snapshot.status, snapshot.title, snapshot.artist, snapshot.source_id
                    );
                }
            }
            for name in &report.unavailable {
                println!("[{name}] unavailable");
            }

            match report.selection.owner() {
                Some(owner) => println!(
                    "active: {owner} ({} - {})",
                    report.selection.title(),
                    report.selection.artist()
                ),
                None => println!("active: none"),
            }
        }
        Commands::Config => {
            let config = load_config(cli.config)?;
            print!("{}", config.redacted().to_toml_string()?);
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(Config);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}
