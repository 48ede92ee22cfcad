//! Engine configuration
//!
//! - [`EngineConfig`]: everything fixed at bridge construction
//! - Generic YAML config loading/saving
//! - Standard config paths
//!
//! # Usage
//!
//! ```ignore
//! use pdbridge_core::config::{load_config, default_config_path, EngineConfig};
//!
//! let config: EngineConfig = load_config(&default_config_path("config.yaml"));
//! ```

mod engine;
mod io;
mod paths;

pub use engine::{
    EngineConfig, DEFAULT_INPUT_CHANNELS, DEFAULT_OUTPUT_CHANNELS, DEFAULT_SAMPLE_RATE,
    DEFAULT_TICKS_PER_BUFFER,
};
pub use io::{load_config, save_config};
pub use paths::{default_config_dir, default_config_path};
