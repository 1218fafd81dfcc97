//! Error types for the onnxport-core crate.

use thiserror::Error;

/// Top-level error type for conversion and packaging operations.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Unsupported model type {0}")]
    UnsupportedFormat(String),

    #[error(
        "For a PyTorch model, please provide input shape for an example using the `--input-shape` argument"
    )]
    MissingInputShape,

    #[error(
        "Please compile your model e.g. using `torch.jit.trace`. Only jit compiled PyTorch models are supported"
    )]
    NotScripted,

    #[error("Python runtime error: {0}")]
    Python(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Missing ONNX graph in model")]
    MissingGraph,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConvertError {
    pub fn unsupported(ext: impl Into<String>) -> Self {
        Self::UnsupportedFormat(ext.into())
    }

    pub fn python(msg: impl Into<String>) -> Self {
        Self::Python(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
