pub mod config;

pub use config::{load_transform_config, ConfigError, TransformConfig};
