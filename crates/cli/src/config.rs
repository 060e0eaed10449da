//! CLI configuration utilities

use anyhow::{Context, Result, bail};
use cutline_core::CutlineConfig;
use std::path::{Path, PathBuf};
use tracing::info;

const CONFIG_FILE: &str = "config.toml";

/// Default configuration path inside the data directory
pub fn default_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Load configuration from `explicit`, else from the data directory when a
/// file exists there, else from defaults and the environment alone
pub fn load_config(explicit: Option<&Path>, data_dir: &Path) -> Result<CutlineConfig> {
    let fallback = default_config_path(data_dir);
    let path = match explicit {
        Some(path) => Some(path),
        None if fallback.exists() => Some(fallback.as_path()),
        None => None,
    };

    if let Some(path) = path {
        info!("Loading configuration from: {}", path.display());
    }
    CutlineConfig::load(path).context("Failed to load configuration")
}

/// Generate a default configuration file
pub fn generate_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists, pass --force to overwrite",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, CutlineConfig::default().to_toml()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn generated_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = default_config_path(dir.path());

        generate_default_config(&path, false).unwrap();
        let config = load_config(None, dir.path()).unwrap();

        assert_eq!(config.api.base_url, CutlineConfig::default().api.base_url);
        assert_eq!(config.session.poll_interval_ms, 30_000);
    }

    #[test]
    fn existing_config_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[api]\nbase_url = \"https://example.com/api\"\n").unwrap();

        assert!(generate_default_config(&path, false).is_err());
        let config = load_config(Some(&path), dir.path()).unwrap();
        assert_eq!(config.api.base_url, "https://example.com/api");

        generate_default_config(&path, true).unwrap();
        let config = load_config(Some(&path), dir.path()).unwrap();
        assert_eq!(config.api.base_url, CutlineConfig::default().api.base_url);
    }
}
