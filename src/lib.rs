//! replknet-config: layered configuration for RepLKNet training.
//!
//! Declares the default hyperparameters for RepLKNet image-classification
//! training and resolves the final configuration from three tiers, lowest to
//! highest precedence: compiled-in defaults, YAML config files (with
//! recursive `BASE` parent chaining), and command-line overrides.
//!
//! ```no_run
//! use replknet_config::{resolve, Overrides};
//! use std::path::Path;
//!
//! let overrides = Overrides {
//!     batch_size: Some(32),
//!     ..Overrides::default()
//! };
//! let config = resolve(Some(Path::new("configs/replknet_31b_384.yaml")), &overrides)?;
//! assert_eq!(config.data.batch_size, 32);
//! # Ok::<(), replknet_config::ConfigError>(())
//! ```

pub mod cli;
pub mod config;
pub mod logger;

pub use config::{get_config, resolve, Config, ConfigBuilder, ConfigError, Overrides};
