//! Model conversion: format dispatch and the per-format converters.
//!
//! Keras and PyTorch exports are delegated to the frameworks themselves
//! via [`PythonRuntime`]; existing ONNX files pass through untouched.

pub mod keras;
pub mod torch;

use crate::error::ConvertError;
use crate::format::ModelFormat;
use crate::onnx::OnnxModel;
use crate::runtime::PythonRuntime;
use std::path::Path;
use tracing::info;

/// Options supplied by the caller (CLI flags or dashboard widgets).
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// ONNX opset version for exported graphs.
    pub opset: i64,
    /// Input tensor shape; required only for the PyTorch path.
    pub input_shape: Option<Vec<i64>>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            opset: 13,
            input_shape: None,
        }
    }
}

/// Convert a model at `path` to an in-memory ONNX model, routing by
/// file extension (or directory-ness for SavedModels).
///
/// No validation is performed beyond the extension switch; malformed
/// models fail inside the delegated framework call and that failure
/// propagates unchanged.
pub async fn convert_model(
    path: &Path,
    opts: &ConvertOptions,
    runtime: &PythonRuntime,
) -> Result<OnnxModel, ConvertError> {
    let format = ModelFormat::detect(path)?;
    info!(path = %path.display(), ?format, opset = opts.opset, "Converting model");

    match format {
        ModelFormat::Keras => keras::convert(path, opts.opset, runtime).await,
        ModelFormat::Onnx => {
            // Passthrough: the opset option is accepted for interface
            // symmetry but unused.
            OnnxModel::load(path)
        }
        ModelFormat::Torch => {
            let shape = opts
                .input_shape
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or(ConvertError::MissingInputShape)?;
            torch::convert(path, opts.opset, shape, runtime).await
        }
    }
}

/// Escape a path for embedding into a generated Python script.
pub(crate) fn py_str(path: &Path) -> String {
    serde_json::to_string(&path.to_string_lossy())
        .expect("string serialization is infallible")
}
