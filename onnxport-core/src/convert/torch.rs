//! PyTorch converter: delegates to `torch.onnx.export`.
//!
//! Only scripted/traced modules are accepted; a plain module lacks the
//! static graph the exporter needs and is rejected with instructions to
//! trace it first. A dummy input of the requested shape drives the trace.

use crate::convert::py_str;
use crate::error::ConvertError;
use crate::onnx::OnnxModel;
use crate::runtime::PythonRuntime;
use std::path::Path;
use tracing::debug;

/// Convert a serialized PyTorch module to ONNX at the requested opset.
pub async fn convert(
    path: &Path,
    opset: i64,
    input_shape: &[i64],
    runtime: &PythonRuntime,
) -> Result<OnnxModel, ConvertError> {
    let out = tempfile::Builder::new()
        .prefix("onnxport-torch-")
        .suffix(".onnx")
        .tempfile()?;

    let script = render_script(path, opset, input_shape, out.path());
    debug!(path = %path.display(), opset, ?input_shape, "Exporting PyTorch module");

    let outcome = runtime.run_script(&script).await?;
    if !outcome.ok {
        return match outcome.kind.as_deref() {
            Some("not_scripted") => Err(ConvertError::NotScripted),
            _ => Err(ConvertError::python(
                outcome.message.unwrap_or_else(|| "PyTorch export failed".to_string()),
            )),
        };
    }

    OnnxModel::load(out.path())
}

/// Render the delegated export script. The scripted-module check reports
/// a structured outcome; everything else raises and surfaces as a
/// non-zero exit with the traceback.
pub(crate) fn render_script(src: &Path, opset: i64, input_shape: &[i64], out: &Path) -> String {
    let dims = input_shape
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"
import json
import torch

model = torch.load({src})
if not isinstance(model, torch.jit.ScriptModule):
    print(json.dumps({{"ok": False, "kind": "not_scripted"}}))
    raise SystemExit(0)

torch.onnx.export(model, torch.randn({dims}), {out}, opset_version={opset})
print(json.dumps({{"ok": True}}))
"#,
        src = py_str(src),
        dims = dims,
        out = py_str(out),
        opset = opset,
    )
}
