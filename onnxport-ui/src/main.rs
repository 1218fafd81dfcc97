//! onnxport dashboard — single-page web UI over the conversion flow.
//!
//! Opset selector, file upload, optional graph-viewer launch, and a
//! download of the packaged runtime archive. Unsupported model types
//! are reported in the page; all other failures surface as plain 500s.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use onnxport_core::{
    convert_model, package_into_zip, ConvertConfig, ConvertError, ConvertOptions, PythonRuntime,
    MODEL_FILE_NAME,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Maximum accepted upload size (512 MiB).
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Shared dashboard state.
struct UiState {
    runtime: PythonRuntime,
    /// Resolved C++ runtime template directory.
    template_dir: PathBuf,
    /// Directory where `model.onnx` and the archive are written.
    /// Fixed names; a later conversion silently overwrites them.
    work_dir: PathBuf,
    archive_name: String,
}

fn router(state: Arc<UiState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/convert", post(convert))
        .route("/view", post(view_graph))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Handle an uploaded model: write it to a scoped temp file carrying the
/// original extension, convert, save `model.onnx`, package, and return
/// the archive as a download.
async fn convert(
    State(state): State<Arc<UiState>>,
    mut multipart: Multipart,
) -> Result<Response, Response> {
    let mut opset: i64 = 13;
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| plain(StatusCode::BAD_REQUEST, format!("Bad upload: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("opset") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| plain(StatusCode::BAD_REQUEST, format!("Bad upload: {e}")))?;
                opset = text.trim().parse().map_err(|_| {
                    plain(StatusCode::BAD_REQUEST, format!("Invalid opset: {text}"))
                })?;
            }
            Some("model") => {
                let name = field.file_name().unwrap_or("model").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| plain(StatusCode::BAD_REQUEST, format!("Bad upload: {e}")))?;
                upload = Some((name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (file_name, bytes) = upload
        .ok_or_else(|| plain(StatusCode::BAD_REQUEST, "Add a model".to_string()))?;
    info!(file = %file_name, opset, size = bytes.len(), "Received model upload");

    // Scoped temp file named with the original extension so the
    // dispatcher can classify it; removed when this handler returns.
    let suffix = match file_name.rsplit_once('.') {
        Some((_, ext)) => format!(".{ext}"),
        None => String::new(),
    };
    let tmp = tempfile::Builder::new()
        .prefix("onnxport-upload-")
        .suffix(&suffix)
        .tempfile()
        .map_err(internal)?;
    std::fs::write(tmp.path(), &bytes).map_err(internal)?;

    let opts = ConvertOptions {
        opset,
        input_shape: None,
    };
    let model = match convert_model(tmp.path(), &opts, &state.runtime).await {
        Ok(model) => model,
        // Only the unsupported-format case gets a friendly message.
        Err(err @ ConvertError::UnsupportedFormat(_)) => {
            warn!(file = %file_name, "Unsupported model type");
            return Err(plain(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("{err}, {file_name}"),
            ));
        }
        Err(err) => return Err(internal(err)),
    };

    // Fixed local path, silently overwritten on the next upload.
    model
        .save(&state.work_dir.join(MODEL_FILE_NAME))
        .map_err(internal)?;

    let archive = package_into_zip(
        &state.template_dir,
        &model,
        &state.work_dir,
        &state.archive_name,
    )
    .map_err(internal)?;

    let body = tokio::fs::read(&archive).await.map_err(internal)?;
    let disposition = format!("attachment; filename=\"{}\"", state.archive_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Launch the netron graph viewer on the last converted model,
/// best-effort.
async fn view_graph(State(state): State<Arc<UiState>>) -> Response {
    let model_path = state.work_dir.join(MODEL_FILE_NAME);
    if !model_path.exists() {
        return plain(
            StatusCode::NOT_FOUND,
            "No converted model yet. Upload a model first.".to_string(),
        );
    }

    match tokio::process::Command::new("netron").arg(&model_path).spawn() {
        Ok(_) => plain(StatusCode::OK, "Launched netron".to_string()),
        Err(_) => {
            // netron not installed; fall back to the hosted viewer.
            let _ = open::that("https://netron.app");
            plain(
                StatusCode::OK,
                "netron is not installed; opened netron.app instead".to_string(),
            )
        }
    }
}

fn plain(status: StatusCode, message: String) -> Response {
    (status, message).into_response()
}

fn internal(err: impl std::fmt::Display) -> Response {
    plain(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>onnxport</title>
  <style>
    body { font-family: sans-serif; max-width: 40rem; margin: 3rem auto; }
    form { margin: 1.5rem 0; }
    label { display: block; margin-bottom: 0.5rem; }
  </style>
</head>
<body>
  <h1>onnxport</h1>
  <p>Convert a Keras, PyTorch (traced), or ONNX model and download the packaged C++ runtime.</p>
  <form action="/convert" method="post" enctype="multipart/form-data">
    <label>opset
      <select name="opset">
        <option value="9">9</option>
        <option value="11">11</option>
        <option value="13" selected>13</option>
      </select>
    </label>
    <label>Add a model
      <input type="file" name="model" required>
    </label>
    <button type="submit">Download code</button>
  </form>
  <form action="/view" method="post">
    <button type="submit">View model graph</button>
  </form>
</body>
</html>
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter("info")
        .init();

    let port: u16 = std::env::var("ONNXPORT_UI_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8490);

    let config = ConvertConfig::load(None)?;
    let template_dir =
        onnxport_core::resolve_template_dir(&config.packaging.template_dir);
    let work_dir = std::env::current_dir()?;

    let state = Arc::new(UiState {
        runtime: PythonRuntime::from_config(&config.python),
        template_dir,
        work_dir,
        archive_name: config.packaging.archive_name.clone(),
    });

    let addr = format!("127.0.0.1:{port}");
    info!("Dashboard listening on http://{addr}/");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
