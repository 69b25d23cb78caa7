//! JSON transform configuration.
//!
//! ```json
//! { "normalization": "schmidt", "phase": "included", "lmaxCalc": 20,
//!   "extend": true, "sampling": "equallySpaced", "radius": 6371000.0 }
//! ```
//!
//! Every key is optional.

use crate::domain::{DhSampling, TransformOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformConfig {
    #[serde(flatten)]
    pub options: TransformOptions,
    /// Longitude sampling of DH grids.
    pub sampling: DhSampling,
    /// Reference radius dividing gradient components.
    pub radius: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            options: TransformOptions::default(),
            sampling: DhSampling::default(),
            radius: 1.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read transform config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse transform config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn load_transform_config(path: impl AsRef<Path>) -> Result<TransformConfig, ConfigError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
