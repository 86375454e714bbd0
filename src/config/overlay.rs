//! Partial configuration documents.
//!
//! A YAML config file only names the keys it overrides, so each schema struct
//! has a patch twin in which every field is optional. Unknown keys anywhere in
//! a document are rejected (`deny_unknown_fields`) before a single field is
//! applied, so a typo never silently reaches a training run.
//!
//! Nullable schema fields (RESUME, GRAD_CLIP, ...) use a double `Option`: the
//! outer layer distinguishes "key absent" from "key explicitly null", letting
//! a leaf file clear a value inherited from a BASE file.

use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

use super::types::{
    Config, DataConfig, MixupMode, ModelConfig, OptimizerConfig, RandomEraseMode, TrainConfig,
};

/// Marks an explicitly present field, even when its value is null.
fn explicit<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// One parsed YAML config document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ConfigPatch {
    /// Parent documents, resolved relative to this file's directory and
    /// merged (left to right) before this file's own keys
    pub base: Vec<String>,

    pub data: Option<DataPatch>,
    pub model: Option<ModelPatch>,
    pub train: Option<TrainPatch>,
    pub save: Option<PathBuf>,
    pub save_freq: Option<usize>,
    pub report_freq: Option<usize>,
    pub validate_freq: Option<usize>,
    pub seed: Option<u64>,
    pub eval: Option<bool>,
    pub amp: Option<bool>,
}

impl ConfigPatch {
    /// Copy every present field onto `config`; absent fields are untouched.
    pub fn apply(&self, config: &mut Config) {
        if let Some(data) = &self.data {
            data.apply(&mut config.data);
        }
        if let Some(model) = &self.model {
            model.apply(&mut config.model);
        }
        if let Some(train) = &self.train {
            train.apply(&mut config.train);
        }
        if let Some(v) = &self.save {
            config.save = v.clone();
        }
        if let Some(v) = self.save_freq {
            config.save_freq = v;
        }
        if let Some(v) = self.report_freq {
            config.report_freq = v;
        }
        if let Some(v) = self.validate_freq {
            config.validate_freq = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if let Some(v) = self.eval {
            config.eval = v;
        }
        if let Some(v) = self.amp {
            config.amp = v;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DataPatch {
    pub batch_size: Option<usize>,
    #[serde(deserialize_with = "explicit")]
    pub batch_size_eval: Option<Option<usize>>,
    pub data_path: Option<PathBuf>,
    pub dataset: Option<String>,
    pub image_size: Option<usize>,
    pub image_channels: Option<usize>,
    pub crop_pct: Option<f64>,
    pub num_workers: Option<usize>,
    pub imagenet_mean: Option<[f64; 3]>,
    pub imagenet_std: Option<[f64; 3]>,
}

impl DataPatch {
    fn apply(&self, data: &mut DataConfig) {
        if let Some(v) = self.batch_size {
            data.batch_size = v;
        }
        if let Some(v) = self.batch_size_eval {
            data.batch_size_eval = v;
        }
        if let Some(v) = &self.data_path {
            data.data_path = v.clone();
        }
        if let Some(v) = &self.dataset {
            data.dataset = v.clone();
        }
        if let Some(v) = self.image_size {
            data.image_size = v;
        }
        if let Some(v) = self.image_channels {
            data.image_channels = v;
        }
        if let Some(v) = self.crop_pct {
            data.crop_pct = v;
        }
        if let Some(v) = self.num_workers {
            data.num_workers = v;
        }
        if let Some(v) = self.imagenet_mean {
            data.imagenet_mean = v;
        }
        if let Some(v) = self.imagenet_std {
            data.imagenet_std = v;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ModelPatch {
    #[serde(rename = "TYPE")]
    pub model_type: Option<String>,
    pub name: Option<String>,
    #[serde(deserialize_with = "explicit")]
    pub resume: Option<Option<PathBuf>>,
    #[serde(deserialize_with = "explicit")]
    pub pretrained: Option<Option<PathBuf>>,
    pub num_classes: Option<usize>,
    pub droppath: Option<f64>,
    pub large_kernel_sizes: Option<Vec<usize>>,
    pub layers: Option<Vec<usize>>,
    pub channels: Option<Vec<usize>>,
    pub dw_ratio: Option<f64>,
    pub ffn_ratio: Option<f64>,
    pub small_kernel: Option<usize>,
    pub small_kernel_merged: Option<bool>,
    pub norm_inter_features: Option<bool>,
    #[serde(deserialize_with = "explicit")]
    pub out_indices: Option<Option<Vec<usize>>>,
    pub sync_bn: Option<bool>,
}

impl ModelPatch {
    fn apply(&self, model: &mut ModelConfig) {
        if let Some(v) = &self.model_type {
            model.model_type = v.clone();
        }
        if let Some(v) = &self.name {
            model.name = v.clone();
        }
        if let Some(v) = &self.resume {
            model.resume = v.clone();
        }
        if let Some(v) = &self.pretrained {
            model.pretrained = v.clone();
        }
        if let Some(v) = self.num_classes {
            model.num_classes = v;
        }
        if let Some(v) = self.droppath {
            model.droppath = v;
        }
        if let Some(v) = &self.large_kernel_sizes {
            model.large_kernel_sizes = v.clone();
        }
        if let Some(v) = &self.layers {
            model.layers = v.clone();
        }
        if let Some(v) = &self.channels {
            model.channels = v.clone();
        }
        if let Some(v) = self.dw_ratio {
            model.dw_ratio = v;
        }
        if let Some(v) = self.ffn_ratio {
            model.ffn_ratio = v;
        }
        if let Some(v) = self.small_kernel {
            model.small_kernel = v;
        }
        if let Some(v) = self.small_kernel_merged {
            model.small_kernel_merged = v;
        }
        if let Some(v) = self.norm_inter_features {
            model.norm_inter_features = v;
        }
        if let Some(v) = &self.out_indices {
            model.out_indices = v.clone();
        }
        if let Some(v) = self.sync_bn {
            model.sync_bn = v;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TrainPatch {
    pub last_epoch: Option<usize>,
    pub num_epochs: Option<usize>,
    pub warmup_epochs: Option<usize>,
    pub weight_decay: Option<f64>,
    pub base_lr: Option<f64>,
    pub warmup_start_lr: Option<f64>,
    pub end_lr: Option<f64>,
    #[serde(deserialize_with = "explicit")]
    pub grad_clip: Option<Option<f64>>,
    pub accum_iter: Option<usize>,
    pub linear_scaled_lr: Option<usize>,
    pub optimizer: Option<OptimizerPatch>,
    pub model_ema: Option<bool>,
    pub model_ema_decay: Option<f64>,
    pub model_ema_force_cpu: Option<bool>,
    pub smoothing: Option<f64>,
    pub color_jitter: Option<f64>,
    pub auto_augment: Option<bool>,
    pub rand_augment: Option<bool>,
    pub rand_augment_layers: Option<usize>,
    pub rand_augment_magnitude: Option<usize>,
    pub mixup_alpha: Option<f64>,
    pub mixup_prob: Option<f64>,
    pub mixup_switch_prob: Option<f64>,
    pub mixup_mode: Option<MixupMode>,
    pub cutmix_alpha: Option<f64>,
    #[serde(deserialize_with = "explicit")]
    pub cutmix_minmax: Option<Option<[f64; 2]>>,
    pub random_erase_prob: Option<f64>,
    pub random_erase_mode: Option<RandomEraseMode>,
    pub random_erase_count: Option<usize>,
    pub random_erase_split: Option<bool>,
}

impl TrainPatch {
    fn apply(&self, train: &mut TrainConfig) {
        if let Some(v) = self.last_epoch {
            train.last_epoch = v;
        }
        if let Some(v) = self.num_epochs {
            train.num_epochs = v;
        }
        if let Some(v) = self.warmup_epochs {
            train.warmup_epochs = v;
        }
        if let Some(v) = self.weight_decay {
            train.weight_decay = v;
        }
        if let Some(v) = self.base_lr {
            train.base_lr = v;
        }
        if let Some(v) = self.warmup_start_lr {
            train.warmup_start_lr = v;
        }
        if let Some(v) = self.end_lr {
            train.end_lr = v;
        }
        if let Some(v) = self.grad_clip {
            train.grad_clip = v;
        }
        if let Some(v) = self.accum_iter {
            train.accum_iter = v;
        }
        if let Some(v) = self.linear_scaled_lr {
            train.linear_scaled_lr = v;
        }
        if let Some(optimizer) = &self.optimizer {
            optimizer.apply(&mut train.optimizer);
        }
        if let Some(v) = self.model_ema {
            train.model_ema = v;
        }
        if let Some(v) = self.model_ema_decay {
            train.model_ema_decay = v;
        }
        if let Some(v) = self.model_ema_force_cpu {
            train.model_ema_force_cpu = v;
        }
        if let Some(v) = self.smoothing {
            train.smoothing = v;
        }
        if let Some(v) = self.color_jitter {
            train.color_jitter = v;
        }
        if let Some(v) = self.auto_augment {
            train.auto_augment = v;
        }
        if let Some(v) = self.rand_augment {
            train.rand_augment = v;
        }
        if let Some(v) = self.rand_augment_layers {
            train.rand_augment_layers = v;
        }
        if let Some(v) = self.rand_augment_magnitude {
            train.rand_augment_magnitude = v;
        }
        if let Some(v) = self.mixup_alpha {
            train.mixup_alpha = v;
        }
        if let Some(v) = self.mixup_prob {
            train.mixup_prob = v;
        }
        if let Some(v) = self.mixup_switch_prob {
            train.mixup_switch_prob = v;
        }
        if let Some(v) = self.mixup_mode {
            train.mixup_mode = v;
        }
        if let Some(v) = self.cutmix_alpha {
            train.cutmix_alpha = v;
        }
        if let Some(v) = self.cutmix_minmax {
            train.cutmix_minmax = v;
        }
        if let Some(v) = self.random_erase_prob {
            train.random_erase_prob = v;
        }
        if let Some(v) = self.random_erase_mode {
            train.random_erase_mode = v;
        }
        if let Some(v) = self.random_erase_count {
            train.random_erase_count = v;
        }
        if let Some(v) = self.random_erase_split {
            train.random_erase_split = v;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct OptimizerPatch {
    pub name: Option<String>,
    pub eps: Option<f64>,
    pub betas: Option<(f64, f64)>,
}

impl OptimizerPatch {
    fn apply(&self, optimizer: &mut OptimizerConfig) {
        if let Some(v) = &self.name {
            optimizer.name = v.clone();
        }
        if let Some(v) = self.eps {
            optimizer.eps = v;
        }
        if let Some(v) = self.betas {
            optimizer.betas = v;
        }
    }
}
