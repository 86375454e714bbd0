//! Command-line override surface.

use std::path::PathBuf;

/// Options that may override the merged file configuration.
///
/// Produced by the CLI layer, but a plain data struct so driver scripts can
/// fill it from their own argument parsers. Every field is optional; absent
/// fields leave the config untouched.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub dataset: Option<String>,

    /// Sets both the train and eval batch size
    pub batch_size: Option<usize>,

    /// Applied after `batch_size`, so it wins for the eval size
    pub batch_size_eval: Option<usize>,

    pub image_size: Option<usize>,
    pub accum_iter: Option<usize>,
    pub data_path: Option<PathBuf>,

    /// Run evaluation only
    pub eval: bool,

    pub pretrained: Option<PathBuf>,
    pub resume: Option<PathBuf>,
    pub last_epoch: Option<usize>,

    /// Request mixed precision; ignored for eval-only runs
    pub amp: bool,
}
