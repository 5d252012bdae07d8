mod commands;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use nimbus_core::config::NimbusConfig;

#[derive(Parser)]
#[command(name = "nimbus")]
#[command(about = "Upload one file to several cloud storage providers at once")]
#[command(version)]
struct Cli {
    /// Path to the config file (default: ~/.nimbus/nimbus.toml)
    #[arg(long, global = true, env = "NIMBUS_CONFIG")]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file to every selected provider
    Upload {
        /// File to upload
        file: PathBuf,
        /// Destination bucket (container on Azure)
        #[arg(long)]
        bucket: String,
        /// Object key (default: the file name)
        #[arg(long)]
        key: Option<String>,
        /// Provider to upload to: aws, azure, gcp or local. Repeatable.
        #[arg(long = "provider", short = 'p', required = true)]
        providers: Vec<String>,
    },

    /// Show current configuration
    Config,

    /// List supported providers
    Providers,
}

/// `--config` when given, otherwise `~/.nimbus/nimbus.toml`.
fn resolve_config_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(NimbusConfig::default_path(&NimbusConfig::default_base_dir()?)),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nimbus=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            ref file,
            ref bucket,
            ref key,
            ref providers,
        } => {
            let config_path = resolve_config_path(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(commands::upload::run(
                file,
                bucket,
                key.as_deref(),
                providers,
                &config_path,
                cli.json,
            ))
        }
        Commands::Config => {
            let config_path = resolve_config_path(cli.config.as_deref())?;
            commands::config::run(&config_path, cli.json)
        }
        Commands::Providers => commands::providers::run(cli.json),
    }
}
