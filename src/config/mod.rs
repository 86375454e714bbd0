//! Configuration management module.
//!
//! Handles the default hyperparameter schema, YAML file merging with BASE
//! chaining, command-line overrides, and validation.

mod error;
mod overlay;
mod overrides;
mod resolver;
mod types;
mod validation;

pub use error::ConfigError;
pub use overlay::ConfigPatch;
pub use overrides::Overrides;
pub use resolver::{generate_at, get_config, resolve, ConfigBuilder};
pub use types::{
    Config, DataConfig, MixupMode, ModelConfig, OptimizerConfig, RandomEraseMode, TrainConfig,
};
pub use validation::validate;
