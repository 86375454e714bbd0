//! Configuration data types.
//!
//! One concrete field per known hyperparameter. The YAML surface keeps the
//! upper-case key spelling used by the training configs (`DATA.BATCH_SIZE`,
//! `TRAIN.OPTIMIZER.BETAS`, ...) via serde renames.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::validation;

/// Root configuration consumed by the training/evaluation drivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    /// Dataset and input pipeline settings
    pub data: DataConfig,

    /// Model architecture settings
    pub model: ModelConfig,

    /// Training schedule, optimizer, and augmentation settings
    pub train: TrainConfig,

    /// Output folder for logs and checkpoints
    pub save: PathBuf,

    /// Checkpoint save frequency (epochs)
    pub save_freq: usize,

    /// Logging frequency (steps)
    pub report_freq: usize,

    /// Validation frequency (epochs)
    pub validate_freq: usize,

    /// Random seed
    pub seed: u64,

    /// Run evaluation only
    pub eval: bool,

    /// Automatic mixed precision (training only)
    pub amp: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            model: ModelConfig::default(),
            train: TrainConfig::default(),
            save: PathBuf::from("./output"),
            save_freq: 10,
            report_freq: 20,
            validate_freq: 1,
            seed: 42,
            eval: false,
            amp: false,
        }
    }
}

impl Config {
    /// Validate value ranges the type system cannot express.
    /// Delegates to the comprehensive validation module.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

/// Data settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DataConfig {
    /// Train batch size on a single GPU
    pub batch_size: usize,

    /// Eval batch size on a single GPU; falls back to the train batch size
    /// when overridden from the CLI
    pub batch_size_eval: Option<usize>,

    /// Path to the dataset root
    pub data_path: PathBuf,

    /// Dataset name, currently only imagenet2012 is supported
    pub dataset: String,

    /// Input image size
    pub image_size: usize,

    /// Input image channels
    pub image_channels: usize,

    /// Input scale ratio, applied before center-crop in eval mode
    pub crop_pct: f64,

    /// Number of data loading threads
    pub num_workers: usize,

    /// ImageNet channel mean
    pub imagenet_mean: [f64; 3],

    /// ImageNet channel std
    pub imagenet_std: [f64; 3],
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            batch_size: 64,
            batch_size_eval: None,
            data_path: PathBuf::from("/dataset/imagenet/"),
            dataset: String::from("imagenet2012"),
            image_size: 224,
            image_channels: 3,
            crop_pct: 0.875,
            num_workers: 2,
            imagenet_mean: [0.485, 0.456, 0.406],
            imagenet_std: [0.229, 0.224, 0.225],
        }
    }
}

/// Model architecture settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ModelConfig {
    /// Model family
    #[serde(rename = "TYPE")]
    pub model_type: String,

    /// Concrete variant name
    pub name: String,

    /// Full checkpoint path for resuming training
    pub resume: Option<PathBuf>,

    /// Full checkpoint path for finetuning
    pub pretrained: Option<PathBuf>,

    /// Number of classifier classes
    pub num_classes: usize,

    /// Stochastic depth rate
    pub droppath: f64,

    /// Large depthwise kernel size per stage
    pub large_kernel_sizes: Vec<usize>,

    /// Number of blocks per stage
    pub layers: Vec<usize>,

    /// Channel width per stage
    pub channels: Vec<usize>,

    /// Depthwise channel expansion ratio
    pub dw_ratio: f64,

    /// FFN hidden expansion ratio
    pub ffn_ratio: f64,

    /// Parallel small kernel size
    pub small_kernel: usize,

    /// Whether the small kernel has been merged into the large one
    pub small_kernel_merged: bool,

    /// Normalize intermediate features (dense-prediction backbones)
    pub norm_inter_features: bool,

    /// Stage indices to expose as backbone outputs
    pub out_indices: Option<Vec<usize>>,

    /// Use synchronized batch norm
    pub sync_bn: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_type: String::from("RepLKNet"),
            name: String::from("replknet_31b"),
            resume: None,
            pretrained: None,
            num_classes: 1000,
            droppath: 0.5,
            large_kernel_sizes: vec![31, 28, 27, 13],
            layers: vec![2, 2, 18, 2],
            channels: vec![128, 256, 512, 1024],
            dw_ratio: 1.0,
            ffn_ratio: 4.0,
            small_kernel: 5,
            small_kernel_merged: false,
            norm_inter_features: false,
            out_indices: None,
            sync_bn: false,
        }
    }
}

/// Training schedule, optimizer, EMA, and augmentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TrainConfig {
    /// Epoch to resume from (0 = fresh run)
    pub last_epoch: usize,

    pub num_epochs: usize,
    pub warmup_epochs: usize,
    pub weight_decay: f64,
    pub base_lr: f64,
    pub warmup_start_lr: f64,
    pub end_lr: f64,

    /// Gradient clipping threshold; disabled when absent
    pub grad_clip: Option<f64>,

    /// Gradient accumulation steps
    pub accum_iter: usize,

    /// Reference batch size for linear LR scaling
    pub linear_scaled_lr: usize,

    pub optimizer: OptimizerConfig,

    /// Keep an exponential moving average of model weights
    pub model_ema: bool,
    pub model_ema_decay: f64,
    pub model_ema_force_cpu: bool,

    /// Label smoothing
    pub smoothing: f64,

    /// Color jitter strength, used when both auto and rand augment are off
    pub color_jitter: f64,

    /// Rand augment wins if both auto and rand augment are set
    pub auto_augment: bool,
    pub rand_augment: bool,
    pub rand_augment_layers: usize,

    /// Rand augment magnitude, scale from 0 to 9
    pub rand_augment_magnitude: usize,

    pub mixup_alpha: f64,
    pub mixup_prob: f64,
    pub mixup_switch_prob: f64,
    pub mixup_mode: MixupMode,
    pub cutmix_alpha: f64,

    /// Explicit cutmix ratio bounds; overrides cutmix_alpha when present
    pub cutmix_minmax: Option<[f64; 2]>,

    pub random_erase_prob: f64,
    pub random_erase_mode: RandomEraseMode,
    pub random_erase_count: usize,
    pub random_erase_split: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            last_epoch: 0,
            num_epochs: 300,
            warmup_epochs: 10,
            weight_decay: 0.05,
            base_lr: 4e-3,
            warmup_start_lr: 1e-6,
            end_lr: 1e-6,
            grad_clip: None,
            accum_iter: 1,
            linear_scaled_lr: 256,
            optimizer: OptimizerConfig::default(),
            model_ema: true,
            model_ema_decay: 0.9999,
            model_ema_force_cpu: false,
            smoothing: 0.1,
            color_jitter: 0.4,
            auto_augment: true,
            rand_augment: false,
            rand_augment_layers: 2,
            rand_augment_magnitude: 9,
            mixup_alpha: 0.8,
            mixup_prob: 1.0,
            mixup_switch_prob: 0.5,
            mixup_mode: MixupMode::Batch,
            cutmix_alpha: 1.0,
            cutmix_minmax: None,
            random_erase_prob: 0.25,
            random_erase_mode: RandomEraseMode::Pixel,
            random_erase_count: 1,
            random_erase_split: false,
        }
    }
}

/// Optimizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct OptimizerConfig {
    pub name: String,
    pub eps: f64,
    pub betas: (f64, f64),
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            name: String::from("AdamW"),
            eps: 1e-8,
            betas: (0.9, 0.999),
        }
    }
}

/// How mixup lambdas are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixupMode {
    /// One lambda per batch
    Batch,
    /// One lambda per sample pair
    Pair,
    /// One lambda per element
    Elem,
}

/// Fill mode for random erasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RandomEraseMode {
    /// Constant fill
    Const,
    /// One random color per region
    Rand,
    /// Per-pixel random fill
    Pixel,
}
