//! Model format detection.
//!
//! The source format is determined solely by the path's extension, or by
//! the path being a directory (Keras SavedModel). Malformed files are not
//! sniffed here; they fail inside the delegated converter.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported source model formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    /// Keras SavedModel directory, `.keras`, or `.h5` file.
    Keras,
    /// An existing `.onnx` file, loaded without transformation.
    Onnx,
    /// A traced/scripted PyTorch module (`.pt` / `.pth`).
    Torch,
}

impl ModelFormat {
    /// Classify a model path by extension (or directory-ness).
    ///
    /// Unrecognized extensions fail with [`ConvertError::UnsupportedFormat`]
    /// naming the offending suffix.
    pub fn detect(path: &Path) -> Result<Self, ConvertError> {
        if path.is_dir() {
            return Ok(Self::Keras);
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("keras" | "h5") => Ok(Self::Keras),
            Some("onnx") => Ok(Self::Onnx),
            Some("pt" | "pth") => Ok(Self::Torch),
            Some(other) => Err(ConvertError::unsupported(format!(".{other}"))),
            None => Err(ConvertError::unsupported(
                path.to_string_lossy().to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(
            ModelFormat::detect(&PathBuf::from("m.keras")).unwrap(),
            ModelFormat::Keras
        );
        assert_eq!(
            ModelFormat::detect(&PathBuf::from("m.h5")).unwrap(),
            ModelFormat::Keras
        );
        assert_eq!(
            ModelFormat::detect(&PathBuf::from("m.onnx")).unwrap(),
            ModelFormat::Onnx
        );
        assert_eq!(
            ModelFormat::detect(&PathBuf::from("m.pt")).unwrap(),
            ModelFormat::Torch
        );
        assert_eq!(
            ModelFormat::detect(&PathBuf::from("m.pth")).unwrap(),
            ModelFormat::Torch
        );
    }

    #[test]
    fn test_detect_directory_is_keras() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(
            ModelFormat::detect(dir.path()).unwrap(),
            ModelFormat::Keras
        );
    }

    #[test]
    fn test_detect_unsupported_names_extension() {
        let err = ModelFormat::detect(&PathBuf::from("m.tflite")).unwrap_err();
        match err {
            ConvertError::UnsupportedFormat(ext) => assert_eq!(ext, ".tflite"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
