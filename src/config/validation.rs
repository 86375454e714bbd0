//! Configuration validation.
//!
//! Range and consistency checks the schema types cannot express, run once
//! when a builder is frozen.

use anyhow::{bail, Result};

use super::types::Config;

/// Validate configuration.
pub fn validate(config: &Config) -> Result<()> {
    let data = &config.data;
    if data.batch_size == 0 {
        bail!("DATA.BATCH_SIZE must be positive");
    }
    if data.batch_size_eval == Some(0) {
        bail!("DATA.BATCH_SIZE_EVAL must be positive when set");
    }
    if data.image_size == 0 {
        bail!("DATA.IMAGE_SIZE must be positive");
    }
    if data.image_channels == 0 {
        bail!("DATA.IMAGE_CHANNELS must be positive");
    }
    if !(data.crop_pct > 0.0 && data.crop_pct <= 1.0) {
        bail!("DATA.CROP_PCT must be in (0, 1], got {}", data.crop_pct);
    }
    if data.dataset.is_empty() {
        bail!("DATA.DATASET cannot be empty");
    }

    let model = &config.model;
    if model.num_classes == 0 {
        bail!("MODEL.NUM_CLASSES must be positive");
    }
    if !(0.0..=1.0).contains(&model.droppath) {
        bail!("MODEL.DROPPATH must be in [0, 1], got {}", model.droppath);
    }
    let stages = model.layers.len();
    if stages == 0 {
        bail!("MODEL.LAYERS cannot be empty");
    }
    if model.large_kernel_sizes.len() != stages || model.channels.len() != stages {
        bail!(
            "MODEL: LAYERS ({}), CHANNELS ({}) and LARGE_KERNEL_SIZES ({}) must all describe \
             the same number of stages",
            stages,
            model.channels.len(),
            model.large_kernel_sizes.len()
        );
    }
    if let Some(out_indices) = &model.out_indices {
        for &index in out_indices {
            if index >= stages {
                bail!(
                    "MODEL.OUT_INDICES: index {} out of range for {} stages",
                    index,
                    stages
                );
            }
        }
    }

    let train = &config.train;
    if train.num_epochs == 0 {
        bail!("TRAIN.NUM_EPOCHS must be positive");
    }
    if train.last_epoch > train.num_epochs {
        bail!(
            "TRAIN.LAST_EPOCH ({}) cannot exceed TRAIN.NUM_EPOCHS ({})",
            train.last_epoch,
            train.num_epochs
        );
    }
    if train.accum_iter == 0 {
        bail!("TRAIN.ACCUM_ITER must be positive");
    }
    if train.linear_scaled_lr == 0 {
        bail!("TRAIN.LINEAR_SCALED_LR must be positive");
    }
    if train.base_lr <= 0.0 {
        bail!("TRAIN.BASE_LR must be positive, got {}", train.base_lr);
    }
    if train.weight_decay < 0.0 {
        bail!("TRAIN.WEIGHT_DECAY cannot be negative");
    }
    if let Some(grad_clip) = train.grad_clip {
        if grad_clip <= 0.0 {
            bail!("TRAIN.GRAD_CLIP must be positive when set, got {grad_clip}");
        }
    }

    let optimizer = &train.optimizer;
    if optimizer.name.is_empty() {
        bail!("TRAIN.OPTIMIZER.NAME cannot be empty");
    }
    if optimizer.eps <= 0.0 {
        bail!("TRAIN.OPTIMIZER.EPS must be positive");
    }
    let (beta1, beta2) = optimizer.betas;
    if !(0.0..1.0).contains(&beta1) || !(0.0..1.0).contains(&beta2) {
        bail!(
            "TRAIN.OPTIMIZER.BETAS must each be in [0, 1), got ({beta1}, {beta2})"
        );
    }

    if !(0.0 < train.model_ema_decay && train.model_ema_decay <= 1.0) {
        bail!("TRAIN.MODEL_EMA_DECAY must be in (0, 1]");
    }
    if !(0.0..1.0).contains(&train.smoothing) {
        bail!("TRAIN.SMOOTHING must be in [0, 1), got {}", train.smoothing);
    }
    for (key, value) in [
        ("TRAIN.MIXUP_PROB", train.mixup_prob),
        ("TRAIN.MIXUP_SWITCH_PROB", train.mixup_switch_prob),
        ("TRAIN.RANDOM_ERASE_PROB", train.random_erase_prob),
    ] {
        if !(0.0..=1.0).contains(&value) {
            bail!("{key} must be in [0, 1], got {value}");
        }
    }
    if train.rand_augment_magnitude > 9 {
        bail!(
            "TRAIN.RAND_AUGMENT_MAGNITUDE is on a 0-9 scale, got {}",
            train.rand_augment_magnitude
        );
    }
    if let Some([low, high]) = train.cutmix_minmax {
        if !(0.0 <= low && low < high && high <= 1.0) {
            bail!("TRAIN.CUTMIX_MINMAX must satisfy 0 <= low < high <= 1, got [{low}, {high}]");
        }
    }

    if config.save.as_os_str().is_empty() {
        bail!("SAVE cannot be empty");
    }

    Ok(())
}
