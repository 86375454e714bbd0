//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;

/// Configuration resolver for RepLKNet image-classification training
#[derive(Parser)]
#[command(
    name = "replknet-config",
    version,
    about = "Configuration resolver for RepLKNet image-classification training",
    long_about = "Resolves the final training configuration from compiled-in defaults, \
                  YAML config files (with recursive BASE chaining), and command-line \
                  overrides, in that order of precedence."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a YAML configuration file
    #[arg(long, short = 'c', global = true)]
    pub cfg: Option<PathBuf>,

    /// Dataset name
    #[arg(long, global = true)]
    pub dataset: Option<String>,

    /// Train batch size per GPU (also sets the eval batch size)
    #[arg(long, global = true)]
    pub batch_size: Option<usize>,

    /// Eval batch size per GPU
    #[arg(long, global = true)]
    pub batch_size_eval: Option<usize>,

    /// Input image size
    #[arg(long, global = true)]
    pub image_size: Option<usize>,

    /// Gradient accumulation steps
    #[arg(long, global = true)]
    pub accum_iter: Option<usize>,

    /// Path to the dataset root
    #[arg(long, global = true)]
    pub data_path: Option<PathBuf>,

    /// Run evaluation only
    #[arg(long, global = true)]
    pub eval: bool,

    /// Checkpoint path for finetuning
    #[arg(long, global = true)]
    pub pretrained: Option<PathBuf>,

    /// Checkpoint path for resuming training
    #[arg(long, global = true)]
    pub resume: Option<PathBuf>,

    /// Epoch to resume from
    #[arg(long, global = true)]
    pub last_epoch: Option<usize>,

    /// Enable automatic mixed precision (training only)
    #[arg(long, global = true)]
    pub amp: bool,

    /// Enable debug logging to file
    #[arg(long, global = true)]
    pub debug: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

impl Cli {
    /// The override tier carried by these arguments.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            dataset: self.dataset.clone(),
            batch_size: self.batch_size,
            batch_size_eval: self.batch_size_eval,
            image_size: self.image_size,
            accum_iter: self.accum_iter,
            data_path: self.data_path.clone(),
            eval: self.eval,
            pretrained: self.pretrained.clone(),
            resume: self.resume.clone(),
            last_epoch: self.last_epoch,
            amp: self.amp,
        }
    }
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the fully resolved configuration
    Show {
        /// Output JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
    /// Resolve and validate the configuration
    Check,
    /// Write a commented default configuration file
    Init {
        /// Path where to create the configuration file
        #[arg(long, short = 'p')]
        path: Option<PathBuf>,
    },
    /// Display version information
    Version,
}
