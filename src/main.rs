//! replknet-config: configuration resolver for RepLKNet training.
//!
//! Resolves the final training configuration from defaults, YAML files, and
//! command-line overrides, and prints, checks, or scaffolds config files.

use anyhow::Result;
use clap::Parser;

use replknet_config::cli::{Cli, Commands};
use replknet_config::{config, logger};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Show { json } => {
            let resolved = config::resolve(cli.cfg.as_deref(), &cli.overrides())?;
            if cli.debug {
                logger::init(&resolved)?;
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&resolved)?);
            } else {
                print!("{}", serde_yaml::to_string(&resolved)?);
            }
        }
        Commands::Check => {
            let resolved = config::resolve(cli.cfg.as_deref(), &cli.overrides())?;
            if cli.debug {
                logger::init(&resolved)?;
            }
            if !cli.quiet {
                eprintln!("Configuration is valid.");
            }
        }
        Commands::Init { path } => {
            let config_path = path.unwrap_or_else(|| "config.yaml".into());
            config::generate_at(&config_path)?;
            if !cli.quiet {
                eprintln!("Configuration file created at: {}", config_path.display());
            }
        }
        Commands::Version => {
            println!("replknet-config {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
