//! # onnxport-core — model conversion and packaging
//!
//! Converts models authored in Keras (SavedModel / `.keras` / `.h5`),
//! PyTorch (traced `.pt` / `.pth`), or plain ONNX into a canonical ONNX
//! representation, then bundles the result with a fixed C++ runtime
//! template into a distributable zip archive.
//!
//! The crate is glue, deliberately: the format dispatch routes to
//! converters that delegate the actual graph export to the frameworks'
//! own tooling (tf2onnx, `torch.onnx.export`) through a managed Python
//! subprocess, and the packager is a directory copy plus a zip write.

pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod onnx;
pub mod package;
pub mod runtime;

pub use config::ConvertConfig;
pub use convert::{convert_model, ConvertOptions};
pub use error::ConvertError;
pub use format::ModelFormat;
pub use onnx::OnnxModel;
pub use package::{package_into_zip, resolve_template_dir, save_model_only, MODEL_FILE_NAME};
pub use runtime::PythonRuntime;
