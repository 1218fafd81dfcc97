//! Python runtime manager for delegated model exports.
//!
//! Keras and PyTorch conversion is performed by the frameworks' own
//! exporters (tf2onnx, `torch.onnx.export`), driven through a managed
//! Python subprocess. Scripts print a single JSON object on stdout and
//! the runtime maps failures back to [`ConvertError`] unchanged.

use crate::config::PythonConfig;
use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Information about the detected Python installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonInfo {
    pub path: PathBuf,
    pub version: String,
}

/// Result object printed by a conversion script.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptOutcome {
    pub ok: bool,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Managed Python subprocess runner.
///
/// Interpreter precedence: an explicitly configured path, then a venv's
/// `bin/python`, then `python3` from PATH.
pub struct PythonRuntime {
    /// Explicitly configured interpreter; always wins when set.
    python_path: Option<PathBuf>,
    venv_path: Option<PathBuf>,
    timeout: Duration,
}

impl Default for PythonRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl PythonRuntime {
    pub fn new() -> Self {
        Self {
            python_path: None,
            venv_path: None,
            timeout: Duration::from_secs(300),
        }
    }

    /// Build a runtime from configuration. Venv auto-detection only
    /// applies when no interpreter is configured explicitly.
    pub fn from_config(config: &PythonConfig) -> Self {
        let venv_path = if config.python_path.is_some() {
            config.venv_path.clone()
        } else {
            config.venv_path.clone().or_else(detect_venv)
        };
        Self {
            python_path: config.python_path.clone(),
            venv_path,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Detect an available Python installation.
    pub async fn detect() -> Result<PythonInfo, ConvertError> {
        for cmd in &["python3", "python"] {
            let output = Command::new(cmd).args(["--version"]).output().await;
            if let Ok(output) = output {
                if output.status.success() {
                    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    let version = if version.is_empty() {
                        String::from_utf8_lossy(&output.stderr).trim().to_string()
                    } else {
                        version
                    };
                    return Ok(PythonInfo {
                        path: PathBuf::from(cmd),
                        version,
                    });
                }
            }
        }
        Err(ConvertError::python(
            "Python not found. Install Python 3.8+ to convert Keras or PyTorch models.",
        ))
    }

    /// Effective Python command: explicit path, then venv, then PATH.
    fn python_cmd(&self) -> PathBuf {
        if let Some(path) = &self.python_path {
            return path.clone();
        }
        if let Some(venv) = &self.venv_path {
            let bin_dir = if cfg!(windows) { "Scripts" } else { "bin" };
            return venv.join(bin_dir).join("python");
        }
        PathBuf::from("python3")
    }

    /// Run a conversion script and parse its JSON outcome.
    ///
    /// A non-zero exit maps to [`ConvertError::Python`] carrying the
    /// subprocess stderr unchanged.
    pub async fn run_script(&self, script: &str) -> Result<ScriptOutcome, ConvertError> {
        debug!(script_len = script.len(), "Running Python script");

        let result = tokio::time::timeout(self.timeout, async {
            let output = Command::new(self.python_cmd())
                .args(["-c", script])
                .stdout(std::process::Stdio::piped())
                .stderr(std::process::Stdio::piped())
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|e| ConvertError::python(format!("Failed to spawn Python: {e}")))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(ConvertError::python(format!(
                    "Python script failed (exit {}): {}",
                    output.status, stderr
                )));
            }

            let stdout = String::from_utf8_lossy(&output.stdout);
            serde_json::from_str(stdout.trim())
                .map_err(|e| ConvertError::python(format!("Invalid JSON output: {e}")))
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(ConvertError::Timeout(format!(
                "Python script timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

/// Detect a virtual environment in common locations.
fn detect_venv() -> Option<PathBuf> {
    if let Ok(venv) = std::env::var("VIRTUAL_ENV") {
        let path = PathBuf::from(venv);
        if path.exists() {
            return Some(path);
        }
    }

    for name in &[".venv", "venv"] {
        let path = PathBuf::from(name);
        if path.exists() {
            return Some(path);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_python_detect() {
        // Detection must not panic; Python may or may not be available in CI.
        let result = PythonRuntime::detect().await;
        if let Ok(info) = result {
            assert!(!info.version.is_empty());
        }
    }

    #[test]
    fn test_from_config_defaults() {
        let runtime = PythonRuntime::from_config(&PythonConfig::default());
        assert_eq!(runtime.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_explicit_interpreter_wins_over_venv() {
        let config = PythonConfig {
            python_path: Some(PathBuf::from("/opt/python/bin/python3")),
            venv_path: Some(PathBuf::from("/some/venv")),
            timeout_secs: 300,
        };
        let runtime = PythonRuntime::from_config(&config);
        assert_eq!(
            runtime.python_cmd(),
            PathBuf::from("/opt/python/bin/python3")
        );
    }

    #[test]
    fn test_venv_used_when_no_explicit_interpreter() {
        let runtime = PythonRuntime {
            python_path: None,
            venv_path: Some(PathBuf::from("/some/venv")),
            timeout: Duration::from_secs(300),
        };
        let bin_dir = if cfg!(windows) { "Scripts" } else { "bin" };
        assert_eq!(
            runtime.python_cmd(),
            PathBuf::from("/some/venv").join(bin_dir).join("python")
        );
    }

    /// Write an executable stub interpreter that ignores its arguments
    /// and prints a fixed JSON payload.
    #[cfg(unix)]
    fn write_stub_interpreter(path: &std::path::Path, json: &str) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::write(path, format!("#!/bin/sh\nprintf '%s' '{json}'\n")).unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_script_uses_explicit_interpreter_despite_venv() {
        let dir = tempfile::TempDir::new().unwrap();

        let explicit = dir.path().join("explicit-python");
        write_stub_interpreter(&explicit, r#"{"ok": true, "message": "explicit"}"#);

        // A venv whose interpreter reports a different message; it must
        // not be picked while an explicit path is configured.
        let venv = dir.path().join("venv");
        std::fs::create_dir_all(venv.join("bin")).unwrap();
        write_stub_interpreter(
            &venv.join("bin").join("python"),
            r#"{"ok": true, "message": "venv"}"#,
        );

        let config = PythonConfig {
            python_path: Some(explicit),
            venv_path: Some(venv),
            timeout_secs: 30,
        };
        let runtime = PythonRuntime::from_config(&config);
        let outcome = runtime.run_script("ignored").await.unwrap();
        assert_eq!(outcome.message.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_script_outcome_parsing() {
        let ok: ScriptOutcome = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(ok.ok);
        let err: ScriptOutcome =
            serde_json::from_str(r#"{"ok": false, "kind": "not_scripted", "message": "m"}"#)
                .unwrap();
        assert!(!err.ok);
        assert_eq!(err.kind.as_deref(), Some("not_scripted"));
    }
}
