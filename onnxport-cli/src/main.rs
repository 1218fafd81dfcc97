//! onnxport CLI — convert a model and package it with the C++ runtime.
//!
//! Positional model path plus flags for input shape, output directory,
//! model-only mode, and ONNX opset. Conversion errors propagate and
//! terminate the process with a non-zero status.

use clap::Parser;
use onnxport_core::{
    convert_model, package_into_zip, resolve_template_dir, save_model_only, ConvertConfig,
    ConvertOptions, PythonRuntime,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// onnxport: package Keras, PyTorch, and ONNX models for the C++ runtime
#[derive(Parser, Debug)]
#[command(name = "onnxport", version, about, long_about = None)]
struct Cli {
    /// Path to the source model (.keras, .h5, SavedModel dir, .onnx, .pt, .pth)
    model_path: PathBuf,

    /// Shape of the input tensor (required for PyTorch models)
    #[arg(long, num_args = 1.., value_name = "INT")]
    input_shape: Option<Vec<i64>>,

    /// Where to output the resulting C++ runtime
    #[arg(long)]
    output_path: Option<PathBuf>,

    /// Export the model without the C++ runtime
    #[arg(long)]
    model_only: bool,

    /// Which ONNX opset to use
    #[arg(long, default_value_t = 13)]
    onnx_opset: i64,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    let config = ConvertConfig::load(cli.config.as_deref())?;
    let runtime = PythonRuntime::from_config(&config.python);

    let opts = ConvertOptions {
        opset: cli.onnx_opset,
        input_shape: cli.input_shape.clone(),
    };

    println!("Converting model");
    let model = convert_model(&cli.model_path, &opts, &runtime).await?;

    let output_dir = cli.output_path.clone().unwrap_or_else(|| PathBuf::from("."));
    let file_path = if cli.model_only {
        save_model_only(&model, &output_dir)?
    } else {
        println!("Packaging C++ library");
        let template_dir = resolve_template_dir(&config.packaging.template_dir);
        package_into_zip(
            &template_dir,
            &model,
            &output_dir,
            &config.packaging.archive_name,
        )?
    };

    let resolved = std::fs::canonicalize(&file_path).unwrap_or(file_path);
    println!("Exported to {}", resolved.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_parses_all_flags() {
        let cli = Cli::parse_from([
            "onnxport",
            "model.pt",
            "--input-shape",
            "1",
            "100",
            "--output-path",
            "out",
            "--model-only",
            "--onnx-opset",
            "11",
        ]);
        assert_eq!(cli.model_path, PathBuf::from("model.pt"));
        assert_eq!(cli.input_shape, Some(vec![1, 100]));
        assert_eq!(cli.output_path, Some(PathBuf::from("out")));
        assert!(cli.model_only);
        assert_eq!(cli.onnx_opset, 11);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["onnxport", "model.h5"]);
        assert_eq!(cli.onnx_opset, 13);
        assert!(cli.input_shape.is_none());
        assert!(!cli.model_only);
    }

    #[test]
    fn test_cli_debug_asserts() {
        Cli::command().debug_assert();
    }
}
