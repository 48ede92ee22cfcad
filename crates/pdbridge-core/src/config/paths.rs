//! Path utilities for pdbridge configuration files

use std::path::PathBuf;

/// Get the default configuration directory
///
/// Returns: `<platform config dir>/pdbridge` (e.g. `~/.config/pdbridge`)
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pdbridge")
}

/// Get the default config file path
///
/// # Arguments
/// * `filename` - Config file name (e.g., "config.yaml")
pub fn default_config_path(filename: &str) -> PathBuf {
    default_config_dir().join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_ends_with_pdbridge() {
        assert!(default_config_dir().ends_with("pdbridge"));
    }

    #[test]
    fn test_config_path_includes_filename() {
        let path = default_config_path("test.yaml");
        assert!(path.ends_with("pdbridge/test.yaml"));
    }
}
