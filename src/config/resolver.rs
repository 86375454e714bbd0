//! Configuration resolution pipeline.
//!
//! Three override tiers, lowest to highest precedence: compiled-in defaults,
//! chained YAML files (BASE parents first, depth-first and left to right),
//! then command-line overrides. The mutable phase lives in [`ConfigBuilder`];
//! [`ConfigBuilder::freeze`] validates and hands out the final immutable
//! [`Config`], so writing to a frozen config is a compile error rather than a
//! runtime one.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::ConfigError;
use super::overlay::ConfigPatch;
use super::overrides::Overrides;
use super::types::Config;

/// Resolve the final configuration: defaults, optional YAML file, CLI layer.
pub fn resolve(cfg_file: Option<&Path>, overrides: &Overrides) -> Result<Config, ConfigError> {
    let mut builder = ConfigBuilder::new();
    if let Some(path) = cfg_file {
        builder.merge_file(path)?;
    }
    builder.apply_overrides(overrides);
    builder.freeze()
}

/// Resolve defaults plus an optional YAML file, without a CLI layer.
pub fn get_config(cfg_file: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = ConfigBuilder::new();
    if let Some(path) = cfg_file {
        builder.merge_file(path)?;
    }
    builder.freeze()
}

/// The mutable phase of configuration resolution.
///
/// Starts as a fresh clone of the compiled-in defaults; independent of every
/// other builder, so concurrent resolutions never share state.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Start from the compiled-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a YAML config file onto the current values.
    ///
    /// BASE parents are merged first (depth-first, left to right, resolved
    /// relative to the containing file's directory), then the file's own
    /// keys; later keys win. A BASE cycle is reported as
    /// [`ConfigError::CircularBase`].
    pub fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let mut stack = Vec::new();
        self.merge_file_inner(path, &mut stack)
    }

    fn merge_file_inner(
        &mut self,
        path: &Path,
        stack: &mut Vec<PathBuf>,
    ) -> Result<(), ConfigError> {
        let canonical = path.canonicalize().map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if stack.contains(&canonical) {
            return Err(ConfigError::CircularBase { path: canonical });
        }
        stack.push(canonical);

        let patch = read_patch(path)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        for base in &patch.base {
            // Empty entries are allowed and skipped, matching the config
            // files that declare `BASE: ['']`.
            if !base.is_empty() {
                self.merge_file_inner(&dir.join(base), stack)?;
            }
        }

        debug!(path = %path.display(), "merging config file");
        patch.apply(&mut self.config);
        stack.pop();
        Ok(())
    }

    /// Apply command-line overrides, the highest-precedence tier.
    ///
    /// `batch_size` sets both the train and eval batch size; a separate
    /// `batch_size_eval` is applied afterwards and wins for the eval size.
    /// `amp` is honored only for training runs: an eval-only run keeps AMP
    /// off regardless of the flag.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        let config = &mut self.config;
        if let Some(dataset) = &overrides.dataset {
            config.data.dataset = dataset.clone();
        }
        if let Some(batch_size) = overrides.batch_size {
            config.data.batch_size = batch_size;
            config.data.batch_size_eval = Some(batch_size);
        }
        if let Some(batch_size_eval) = overrides.batch_size_eval {
            config.data.batch_size_eval = Some(batch_size_eval);
        }
        if let Some(image_size) = overrides.image_size {
            config.data.image_size = image_size;
        }
        if let Some(accum_iter) = overrides.accum_iter {
            config.train.accum_iter = accum_iter;
        }
        if let Some(data_path) = &overrides.data_path {
            config.data.data_path = data_path.clone();
        }
        if overrides.eval {
            config.eval = true;
        }
        if let Some(pretrained) = &overrides.pretrained {
            config.model.pretrained = Some(pretrained.clone());
        }
        if let Some(resume) = &overrides.resume {
            config.model.resume = Some(resume.clone());
        }
        if let Some(last_epoch) = overrides.last_epoch {
            config.train.last_epoch = last_epoch;
        }
        if overrides.amp {
            config.amp = !config.eval;
        }
    }

    /// Read access to the in-progress values.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate and finalize, consuming the builder.
    pub fn freeze(self) -> Result<Config, ConfigError> {
        self.config.validate().map_err(ConfigError::Invalid)?;
        Ok(self.config)
    }
}

impl Config {
    /// Start a builder from the compiled-in defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Reopen a finalized config for further mutation.
    pub fn into_builder(self) -> ConfigBuilder {
        ConfigBuilder { config: self }
    }
}

/// Write a commented default configuration file at `path`.
///
/// The generated document spells out every key with its compiled-in default,
/// so merging it back is a no-op.
pub fn generate_at(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    fs::write(path, default_config_content()).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Default configuration content with comments.
fn default_config_content() -> String {
    r#"# RepLKNet training configuration
# Keys mirror the compiled-in defaults; keep only what you override.

# Parent configs, merged left to right before this file's own keys.
# Paths are resolved relative to this file's directory.
# BASE: ['replknet_31b.yaml']

DATA:
  # Train batch size on a single GPU
  BATCH_SIZE: 64
  # Eval batch size; the CLI --batch-size flag sets it to the train size
  BATCH_SIZE_EVAL: null
  DATA_PATH: /dataset/imagenet/
  DATASET: imagenet2012
  IMAGE_SIZE: 224
  IMAGE_CHANNELS: 3
  # Input scale ratio, applied before center-crop in eval mode
  CROP_PCT: 0.875
  NUM_WORKERS: 2
  IMAGENET_MEAN: [0.485, 0.456, 0.406]
  IMAGENET_STD: [0.229, 0.224, 0.225]

MODEL:
  TYPE: RepLKNet
  NAME: replknet_31b
  # Full checkpoint path for resuming training
  RESUME: null
  # Full checkpoint path for finetuning
  PRETRAINED: null
  NUM_CLASSES: 1000
  DROPPATH: 0.5
  LARGE_KERNEL_SIZES: [31, 28, 27, 13]
  LAYERS: [2, 2, 18, 2]
  CHANNELS: [128, 256, 512, 1024]
  DW_RATIO: 1.0
  FFN_RATIO: 4.0
  SMALL_KERNEL: 5
  SMALL_KERNEL_MERGED: false
  NORM_INTER_FEATURES: false
  OUT_INDICES: null
  SYNC_BN: false

TRAIN:
  LAST_EPOCH: 0
  NUM_EPOCHS: 300
  WARMUP_EPOCHS: 10
  WEIGHT_DECAY: 0.05
  BASE_LR: 0.004
  WARMUP_START_LR: 1.0e-6
  END_LR: 1.0e-6
  GRAD_CLIP: null
  ACCUM_ITER: 1
  LINEAR_SCALED_LR: 256
  OPTIMIZER:
    NAME: AdamW
    EPS: 1.0e-8
    BETAS: [0.9, 0.999]
  MODEL_EMA: true
  MODEL_EMA_DECAY: 0.9999
  MODEL_EMA_FORCE_CPU: false

  # Augmentation
  SMOOTHING: 0.1
  # Used when both auto and rand augment are off
  COLOR_JITTER: 0.4
  AUTO_AUGMENT: true
  RAND_AUGMENT: false
  RAND_AUGMENT_LAYERS: 2
  # Scale from 0 to 9
  RAND_AUGMENT_MAGNITUDE: 9
  MIXUP_ALPHA: 0.8
  MIXUP_PROB: 1.0
  MIXUP_SWITCH_PROB: 0.5
  # One of: batch, pair, elem
  MIXUP_MODE: batch
  CUTMIX_ALPHA: 1.0
  CUTMIX_MINMAX: null
  RANDOM_ERASE_PROB: 0.25
  # One of: const, rand, pixel
  RANDOM_ERASE_MODE: pixel
  RANDOM_ERASE_COUNT: 1
  RANDOM_ERASE_SPLIT: false

# Output folder for logs and checkpoints
SAVE: ./output
SAVE_FREQ: 10
REPORT_FREQ: 20
VALIDATE_FREQ: 1
SEED: 42
EVAL: false
AMP: false
"#
    .to_string()
}

/// Read and parse one YAML document into a patch.
///
/// Two stages keep the error taxonomy honest: a failure to produce a YAML
/// value is a parse error; a well-formed value that does not fit the schema
/// (unknown key, wrong type) is a schema error.
fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: serde_yaml::Value =
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    serde_yaml::from_value(value).map_err(|source| ConfigError::Schema {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_cfg(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_get_config_without_file_equals_defaults() {
        let config = get_config(None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_merge_of_serialized_defaults_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let path = write_cfg(&dir, "defaults.yaml", &yaml);

        let config = get_config(Some(&path)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_leaf_keys_override_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_cfg(
            &dir,
            "replknet_31b_384.yaml",
            "DATA:\n  IMAGE_SIZE: 384\n  CROP_PCT: 1.0\nMODEL:\n  NAME: replknet_31b_384\n",
        );

        let config = get_config(Some(&path)).unwrap();
        assert_eq!(config.data.image_size, 384);
        assert_eq!(config.data.crop_pct, 1.0);
        assert_eq!(config.model.name, "replknet_31b_384");
        // untouched groups keep their defaults
        assert_eq!(config.train.num_epochs, 300);
    }

    #[test]
    fn test_base_chain_matches_sequential_merge() {
        let dir = TempDir::new().unwrap();
        write_cfg(&dir, "a.yaml", "SEED: 1\nDATA:\n  BATCH_SIZE: 8\nTRAIN:\n  NUM_EPOCHS: 10\n");
        write_cfg(&dir, "b.yaml", "BASE: ['a.yaml']\nDATA:\n  BATCH_SIZE: 16\n");
        let c = write_cfg(&dir, "c.yaml", "BASE: ['b.yaml']\nSEED: 3\n");

        let chained = get_config(Some(&c)).unwrap();

        let mut builder = ConfigBuilder::new();
        builder.merge_file(&dir.path().join("a.yaml")).unwrap();
        builder.merge_file(&dir.path().join("b.yaml")).unwrap();
        builder.merge_file(&c).unwrap();
        let sequential = builder.freeze().unwrap();

        assert_eq!(chained, sequential);
        // later files win on conflicts, untouched keys flow through
        assert_eq!(chained.seed, 3);
        assert_eq!(chained.data.batch_size, 16);
        assert_eq!(chained.train.num_epochs, 10);
    }

    #[test]
    fn test_base_entries_merge_left_to_right() {
        let dir = TempDir::new().unwrap();
        write_cfg(&dir, "left.yaml", "SEED: 1\nSAVE_FREQ: 5\n");
        write_cfg(&dir, "right.yaml", "SEED: 2\n");
        let leaf = write_cfg(&dir, "leaf.yaml", "BASE: ['left.yaml', 'right.yaml']\n");

        let config = get_config(Some(&leaf)).unwrap();
        assert_eq!(config.seed, 2);
        assert_eq!(config.save_freq, 5);
    }

    #[test]
    fn test_base_resolved_relative_to_containing_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("configs")).unwrap();
        let base = dir.path().join("configs").join("base.yaml");
        fs::write(&base, "SEED: 11\n").unwrap();
        let leaf = dir.path().join("configs").join("leaf.yaml");
        fs::write(&leaf, "BASE: ['base.yaml']\nEVAL: true\n").unwrap();

        let config = get_config(Some(&leaf)).unwrap();
        assert_eq!(config.seed, 11);
        assert!(config.eval);
    }

    #[test]
    fn test_base_cycle_is_reported() {
        let dir = TempDir::new().unwrap();
        write_cfg(&dir, "x.yaml", "BASE: ['y.yaml']\n");
        let y = write_cfg(&dir, "y.yaml", "BASE: ['x.yaml']\n");

        let err = get_config(Some(&y)).unwrap_err();
        assert!(matches!(err, ConfigError::CircularBase { .. }), "{err}");
    }

    #[test]
    fn test_self_referencing_base_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write_cfg(&dir, "selfish.yaml", "BASE: ['selfish.yaml']\n");

        let err = get_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::CircularBase { .. }), "{err}");
    }

    #[test]
    fn test_repeated_merge_of_same_file_is_not_a_cycle() {
        let dir = TempDir::new().unwrap();
        let path = write_cfg(&dir, "a.yaml", "SEED: 5\n");

        let mut builder = ConfigBuilder::new();
        builder.merge_file(&path).unwrap();
        builder.merge_file(&path).unwrap();
        assert_eq!(builder.freeze().unwrap().seed, 5);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let err = get_config(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }), "{err}");
    }

    #[test]
    fn test_missing_base_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let leaf = write_cfg(&dir, "leaf.yaml", "BASE: ['gone.yaml']\n");
        let err = get_config(Some(&leaf)).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }), "{err}");
    }

    #[test]
    fn test_malformed_yaml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_cfg(&dir, "bad.yaml", "DATA: [unclosed\n");
        let err = get_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
    }

    #[test]
    fn test_unknown_key_is_a_schema_error_and_nothing_is_applied() {
        let dir = TempDir::new().unwrap();
        let path = write_cfg(&dir, "typo.yaml", "SEED: 9\nDATA:\n  BATCH_SIZEE: 128\n");

        let mut builder = ConfigBuilder::new();
        let err = builder.merge_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Schema { .. }), "{err}");
        // not even the valid keys of the failed document land
        assert_eq!(builder.config(), &Config::default());
    }

    #[test]
    fn test_wrong_value_type_is_a_schema_error() {
        let dir = TempDir::new().unwrap();
        let path = write_cfg(&dir, "typed.yaml", "DATA:\n  BATCH_SIZE: sixty-four\n");
        let err = get_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Schema { .. }), "{err}");
    }

    #[test]
    fn test_batch_size_override_sets_both_sizes() {
        let mut builder = ConfigBuilder::new();
        builder.apply_overrides(&Overrides {
            batch_size: Some(32),
            ..Overrides::default()
        });
        let config = builder.freeze().unwrap();
        assert_eq!(config.data.batch_size, 32);
        assert_eq!(config.data.batch_size_eval, Some(32));
    }

    #[test]
    fn test_explicit_eval_batch_size_wins() {
        let mut builder = ConfigBuilder::new();
        builder.apply_overrides(&Overrides {
            batch_size: Some(32),
            batch_size_eval: Some(16),
            ..Overrides::default()
        });
        let config = builder.freeze().unwrap();
        assert_eq!(config.data.batch_size, 32);
        assert_eq!(config.data.batch_size_eval, Some(16));
    }

    #[test]
    fn test_amp_is_ignored_for_eval_runs() {
        let mut builder = ConfigBuilder::new();
        builder.apply_overrides(&Overrides {
            eval: true,
            amp: true,
            ..Overrides::default()
        });
        let config = builder.freeze().unwrap();
        assert!(config.eval);
        assert!(!config.amp);
    }

    #[test]
    fn test_amp_applies_to_training_runs() {
        let mut builder = ConfigBuilder::new();
        builder.apply_overrides(&Overrides {
            amp: true,
            ..Overrides::default()
        });
        let config = builder.freeze().unwrap();
        assert!(!config.eval);
        assert!(config.amp);
    }

    #[test]
    fn test_amp_override_clears_amp_from_file_when_eval() {
        let dir = TempDir::new().unwrap();
        let path = write_cfg(&dir, "amp.yaml", "AMP: true\n");

        let config = resolve(
            Some(&path),
            &Overrides {
                eval: true,
                amp: true,
                ..Overrides::default()
            },
        )
        .unwrap();
        assert!(!config.amp);
    }

    #[test]
    fn test_overrides_beat_file_values() {
        let dir = TempDir::new().unwrap();
        let path = write_cfg(
            &dir,
            "file.yaml",
            "DATA:\n  DATASET: cifar10\n  BATCH_SIZE: 256\nTRAIN:\n  LAST_EPOCH: 100\n",
        );

        let config = resolve(
            Some(&path),
            &Overrides {
                dataset: Some("imagenet2012".into()),
                batch_size: Some(64),
                last_epoch: Some(120),
                resume: Some("output/epoch-120.ckpt".into()),
                ..Overrides::default()
            },
        )
        .unwrap();

        assert_eq!(config.data.dataset, "imagenet2012");
        assert_eq!(config.data.batch_size, 64);
        assert_eq!(config.train.last_epoch, 120);
        assert_eq!(config.model.resume, Some("output/epoch-120.ckpt".into()));
    }

    #[test]
    fn test_into_builder_reopens_a_frozen_config() {
        let config = get_config(None).unwrap();
        let mut builder = config.into_builder();
        builder.apply_overrides(&Overrides {
            image_size: Some(384),
            ..Overrides::default()
        });
        assert_eq!(builder.freeze().unwrap().data.image_size, 384);
    }

    #[test]
    fn test_generated_template_merges_as_a_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        generate_at(&path).unwrap();

        let config = get_config(Some(&path)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_merged_values_fail_freeze() {
        let dir = TempDir::new().unwrap();
        let path = write_cfg(&dir, "zero.yaml", "DATA:\n  BATCH_SIZE: 0\n");
        let err = get_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }
}
