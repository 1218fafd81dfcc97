//! Packaging: bundle the converted model with the C++ runtime template.
//!
//! The template directory is copied into a scoped temporary area, the
//! model is inserted at `<template>/model/model.onnx`, and the whole
//! tree is written into a zip archive. Archive entry names are relative
//! to the temporary root, so the archive's top level is the template
//! directory name and no temporary path segments leak into entries.

use crate::error::ConvertError;
use crate::onnx::OnnxModel;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// Name of the serialized model file, both bare and inside archives.
pub const MODEL_FILE_NAME: &str = "model.onnx";

/// Copy the runtime template, insert the model, and zip the result.
///
/// Returns the path of the written archive. An existing archive at the
/// output path is silently overwritten.
pub fn package_into_zip(
    template_dir: &Path,
    model: &OnnxModel,
    output_dir: &Path,
    archive_name: &str,
) -> Result<PathBuf, ConvertError> {
    let template_name = template_dir
        .file_name()
        .ok_or_else(|| ConvertError::config("template directory has no name"))?;

    // Scoped working area; removed on drop regardless of outcome.
    let tmp = tempfile::TempDir::new()?;
    let staged = tmp.path().join(template_name);
    copy_tree(template_dir, &staged)?;

    // Serialize the model at the temp root, then copy it into the
    // template's model/ subdirectory. The scratch copy at the root is
    // not part of the archive.
    let scratch_model = tmp.path().join(MODEL_FILE_NAME);
    model.save(&scratch_model)?;
    let models_dir = staged.join("model");
    std::fs::create_dir_all(&models_dir)?;
    std::fs::copy(&scratch_model, models_dir.join(MODEL_FILE_NAME))?;

    let archive_path = output_dir.join(archive_name);
    write_zip(tmp.path(), &staged, &archive_path)?;

    info!(archive = %archive_path.display(), "Packaged runtime archive");
    Ok(archive_path)
}

/// Serialize the model to a bare `model.onnx` in `output_dir`,
/// bypassing the packager entirely.
pub fn save_model_only(model: &OnnxModel, output_dir: &Path) -> Result<PathBuf, ConvertError> {
    let path = output_dir.join(MODEL_FILE_NAME);
    model.save(&path)?;
    Ok(path)
}

/// Resolve the C++ runtime template directory.
///
/// Checks, in order: the `ONNXPORT_RUNTIME_DIR` environment variable,
/// the configured directory as given, a `runtime/` directory next to
/// the executable, and `runtime/` under the current directory. Falls
/// back to the configured path so a missing template fails in
/// [`package_into_zip`] with a normal IO error.
pub fn resolve_template_dir(configured: &str) -> PathBuf {
    if let Ok(dir) = std::env::var("ONNXPORT_RUNTIME_DIR") {
        let p = PathBuf::from(dir);
        if p.is_dir() {
            return p;
        }
    }

    let configured = PathBuf::from(configured);
    if configured.is_dir() {
        return configured;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            let p = exe_dir.join("runtime");
            if p.is_dir() {
                return p;
            }
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        let p = cwd.join("runtime");
        if p.is_dir() {
            return p;
        }
    }

    configured
}

/// Recursively copy a directory tree, preserving internal structure.
fn copy_tree(src: &Path, dst: &Path) -> Result<(), ConvertError> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| ConvertError::Io(e.into()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| ConvertError::config(e.to_string()))?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Write every file under `root` into a zip archive, with entry names
/// relative to `base`.
fn write_zip(base: &Path, root: &Path, archive_path: &Path) -> Result<(), ConvertError> {
    let file = std::fs::File::create(archive_path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| ConvertError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(base)
            .map_err(|e| ConvertError::config(e.to_string()))?;
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let mut buf = Vec::new();
        std::fs::File::open(entry.path())?.read_to_end(&mut buf)?;
        zip.start_file(&name, options)?;
        zip.write_all(&buf)?;
    }

    zip.finish()?;
    Ok(())
}
