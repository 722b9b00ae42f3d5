//! Configuration loaded from `code-wrapper.toml` files.

use crate::{CliError, Result};
use cw_core::diagnostics::DiagnosticTemplate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE: &str = "code-wrapper.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapperConfig {
    pub output: OutputConfig,
    pub extract: ExtractConfig,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Indent rendered JSON
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Worker threads for multi-file runs; 0 lets rayon decide
    pub jobs: usize,
    /// Let `check` print best-effort descriptors for passes with only non-fatal diagnostics
    pub allow_partial: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub template: DiagnosticTemplate,
}

impl WrapperConfig {
    /// Load configuration from `config_path`, or merge the standard locations over defaults.
    ///
    /// Later layers win: the user config directory, then `~/.code-wrapper.toml`,
    /// then `./code-wrapper.toml`.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => Self::from_layers(&Self::standard_locations()),
        }
    }

    pub fn standard_locations() -> Vec<PathBuf> {
        let mut locations = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            locations.push(config_dir.join("code-wrapper").join("config.toml"));
        }
        if let Some(home_dir) = dirs::home_dir() {
            locations.push(home_dir.join(".code-wrapper.toml"));
        }
        locations.push(PathBuf::from(CONFIG_FILE));
        locations
    }

    /// Merge every existing file in `paths` over the defaults, in order.
    pub fn from_layers(paths: &[PathBuf]) -> Result<Self> {
        let mut merged = toml::Value::try_from(Self::default())
            .map_err(|e| CliError::Config(format!("Failed to serialize defaults: {}", e)))?;
        for path in paths.iter().filter(|path| path.is_file()) {
            debug!(path = %path.display(), "loading config layer");
            merge_values(&mut merged, read_value(path)?);
        }
        merged
            .try_into()
            .map_err(|e| CliError::Config(format!("Invalid configuration: {}", e)))
    }

    /// Load configuration from a specific file; keys it leaves out keep their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            CliError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CliError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }
        std::fs::write(path, content)
            .map_err(|e| CliError::Config(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }
}

fn read_value(path: &Path) -> Result<toml::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CliError::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let table: toml::Table = toml::from_str(&content).map_err(|e| {
        CliError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;
    Ok(toml::Value::Table(table))
}

/// Tables merge key by key; any other value in `overlay` replaces the base.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = WrapperConfig::default();
        assert!(config.output.pretty);
        assert_eq!(config.extract.jobs, 0);
        assert!(!config.extract.allow_partial);
        assert_eq!(config.diagnostics.template, DiagnosticTemplate::Pretty);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[extract]\njobs = 4\n").unwrap();

        let config = WrapperConfig::load(Some(&path)).unwrap();
        assert_eq!(config.extract.jobs, 4);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_layers_merge_in_order() {
        let dir = TempDir::new().unwrap();
        let user = dir.path().join("user.toml");
        let local = dir.path().join("local.toml");
        std::fs::write(&user, "[output]\npretty = false\n[extract]\njobs = 2\n").unwrap();
        std::fs::write(
            &local,
            "[extract]\nallow_partial = true\n[diagnostics]\ntemplate = \"plain\"\n",
        )
        .unwrap();
        let missing = dir.path().join("missing.toml");

        let config = WrapperConfig::from_layers(&[user, missing, local]).unwrap();
        assert_eq!(
            config,
            WrapperConfig {
                output: OutputConfig { pretty: false },
                extract: ExtractConfig {
                    jobs: 2,
                    allow_partial: true
                },
                diagnostics: DiagnosticsConfig {
                    template: DiagnosticTemplate::Plain
                },
            }
        );
    }

    #[test]
    fn test_malformed_layer_is_an_error() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[extract\n").unwrap();
        let err = WrapperConfig::from_layers(&[file.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_config_file_operations() {
        let mut config = WrapperConfig::default();
        config.extract.jobs = 3;
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();
        let loaded = WrapperConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config, loaded);
    }
}
