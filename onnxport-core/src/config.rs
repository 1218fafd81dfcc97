//! Configuration types for onnxport.
//!
//! Uses `figment` for layered configuration: defaults -> config file ->
//! environment variables (`ONNXPORT_` prefix).

use crate::error::ConvertError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for onnxport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Python runtime configuration.
    #[serde(default)]
    pub python: PythonConfig,
    /// Packaging configuration.
    #[serde(default)]
    pub packaging: PackagingConfig,
}

/// Python runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonConfig {
    /// Path to Python executable (auto-detected if not set).
    #[serde(default)]
    pub python_path: Option<PathBuf>,
    /// Path to virtual environment (auto-detected if not set).
    #[serde(default)]
    pub venv_path: Option<PathBuf>,
    /// Timeout for delegated conversion scripts (seconds).
    #[serde(default = "default_python_timeout")]
    pub timeout_secs: u64,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            python_path: None,
            venv_path: None,
            timeout_secs: default_python_timeout(),
        }
    }
}

fn default_python_timeout() -> u64 {
    300
}

/// Packaging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingConfig {
    /// C++ runtime template directory copied into every archive.
    #[serde(default = "default_template_dir")]
    pub template_dir: String,
    /// File name of the produced zip archive.
    #[serde(default = "default_archive_name")]
    pub archive_name: String,
    /// ONNX opset used when the caller does not specify one.
    #[serde(default = "default_opset")]
    pub default_opset: i64,
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self {
            template_dir: default_template_dir(),
            archive_name: default_archive_name(),
            default_opset: default_opset(),
        }
    }
}

fn default_template_dir() -> String {
    "runtime".to_string()
}

fn default_archive_name() -> String {
    "onnxport_cpp.zip".to_string()
}

fn default_opset() -> i64 {
    13
}

impl ConvertConfig {
    /// Load configuration: defaults, then an optional TOML file, then
    /// `ONNXPORT_`-prefixed environment variables.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConvertError> {
        let mut figment = Figment::from(Serialized::defaults(ConvertConfig::default()));

        match config_file {
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                let local = Path::new("onnxport.toml");
                if local.exists() {
                    figment = figment.merge(Toml::file(local));
                }
            }
        }

        figment = figment.merge(Env::prefixed("ONNXPORT_").split("__"));

        figment
            .extract()
            .map_err(|e| ConvertError::config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConvertConfig::default();
        assert_eq!(config.python.timeout_secs, 300);
        assert_eq!(config.packaging.template_dir, "runtime");
        assert_eq!(config.packaging.archive_name, "onnxport_cpp.zip");
        assert_eq!(config.packaging.default_opset, 13);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = ConvertConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ConvertConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.python.timeout_secs, config.python.timeout_secs);
        assert_eq!(parsed.packaging.default_opset, config.packaging.default_opset);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = ConvertConfig::load(None).unwrap();
        assert_eq!(config.packaging.default_opset, 13);
    }
}
