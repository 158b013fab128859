//! Model cache discovery
//!
//! Finds the directory fastembed downloads and caches ONNX models in.

use std::path::{Path, PathBuf};

/// Environment variable overriding the model cache directory
pub const MODELS_PATH_ENV: &str = "STICKIES_MODELS_PATH";

/// Find the model cache directory with priority:
/// 1. `STICKIES_MODELS_PATH` environment variable
/// 2. `<data_dir>/models` when a data directory is given
/// 3. User home directory (`~/.stickies/models`)
/// 4. `./models` relative to the working directory
pub fn find_models_dir(data_dir: Option<&Path>) -> PathBuf {
    if let Ok(models_path) = std::env::var(MODELS_PATH_ENV) {
        if !models_path.trim().is_empty() {
            log::info!("Using {}: {}", MODELS_PATH_ENV, models_path);
            return PathBuf::from(models_path);
        }
    }

    if let Some(data_dir) = data_dir {
        return data_dir.join("models");
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home).join(".stickies").join("models");
    }

    log::warn!("No home directory found, caching models under ./models");
    PathBuf::from("models")
}
