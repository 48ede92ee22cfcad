//! YAML persistence for engine settings
//!
//! Reading never fails: a bridge should still start with defaults when the
//! settings file is absent or damaged. Writing reports errors with context.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Read settings from `path`, falling back to `T::default()`
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No settings at {}, using defaults", path.display());
            return T::default();
        }
        Err(e) => {
            log::warn!("Cannot read settings {}: {}", path.display(), e);
            return T::default();
        }
    };

    serde_yaml::from_str(&contents).unwrap_or_else(|e| {
        log::warn!("Ignoring malformed settings {}: {}", path.display(), e);
        T::default()
    })
}

/// Write settings to `path`, creating missing parent directories
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating settings directory {}", dir.display()))?;
    }

    let yaml = serde_yaml::to_string(config).context("serializing settings")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("writing settings {}", path.display()))?;

    log::info!("Saved settings to {}", path.display());
    Ok(())
}
