//! Keras converter: delegates to `tf.keras` + tf2onnx.
//!
//! Accepts SavedModel directories and single-file (`.keras` / `.h5`)
//! formats. The input signature is built from the model's own recorded
//! input shape and dtype, with the tensor named `x`.

use crate::convert::py_str;
use crate::error::ConvertError;
use crate::onnx::OnnxModel;
use crate::runtime::PythonRuntime;
use std::path::Path;
use tracing::debug;

/// Convert a Keras model to ONNX at the requested opset.
pub async fn convert(
    path: &Path,
    opset: i64,
    runtime: &PythonRuntime,
) -> Result<OnnxModel, ConvertError> {
    // Scoped temp file; removed when this function returns, on both
    // success and failure paths.
    let out = tempfile::Builder::new()
        .prefix("onnxport-keras-")
        .suffix(".onnx")
        .tempfile()?;

    let script = render_script(path, opset, out.path());
    debug!(path = %path.display(), opset, "Exporting Keras model via tf2onnx");

    let outcome = runtime.run_script(&script).await?;
    if !outcome.ok {
        return Err(ConvertError::python(
            outcome.message.unwrap_or_else(|| "Keras export failed".to_string()),
        ));
    }

    OnnxModel::load(out.path())
}

/// Render the delegated export script. Load and export failures raise
/// inside Python and surface as a non-zero exit with the traceback.
pub(crate) fn render_script(src: &Path, opset: i64, out: &Path) -> String {
    format!(
        r#"
import json
import onnx
import tensorflow as tf
import tf2onnx

model = tf.keras.models.load_model({src})
model_onnx, _ = tf2onnx.convert.from_keras(
    model,
    input_signature=[tf.TensorSpec(shape=model.input.shape, dtype=model.input.dtype, name="x")],
    opset={opset},
)
onnx.save(model_onnx, {out})
print(json.dumps({{"ok": True}}))
"#,
        src = py_str(src),
        opset = opset,
        out = py_str(out),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_script_builds_signature_named_x() {
        let script = render_script(&PathBuf::from("/tmp/model.h5"), 13, &PathBuf::from("/tmp/out.onnx"));
        assert!(script.contains(r#"tf.keras.models.load_model("/tmp/model.h5")"#));
        assert!(script.contains(r#"name="x""#));
        assert!(script.contains("opset=13"));
        assert!(script.contains("shape=model.input.shape"));
        assert!(script.contains("dtype=model.input.dtype"));
        assert!(script.contains(r#"onnx.save(model_onnx, "/tmp/out.onnx")"#));
    }
}
