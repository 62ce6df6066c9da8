//! RGB-D dataset conversion tool.
//!
//! Converts a directory tree of paired RGB photographs, semantic label
//! masks, and depth maps into sharded binary record files for the
//! downstream training/evaluation pipeline. Expects the layout
//! `<root>/images/<split>/`, `<root>/annotations/<split>/`,
//! `<root>/depth/<split>/` and writes into `<root>/records/`.

use clap::Parser;
use rgbd_convert::convert;
use rgbd_data::DepthEncoding;
use std::path::PathBuf;

/// rgbd-convert - RGB-D dataset to sharded record files
#[derive(Parser, Debug)]
#[command(name = "rgbd-convert")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dataset root containing images/, annotations/ and depth/
    dataset_root: PathBuf,

    /// Depth-map encoding convention (jpeg or png)
    #[arg(long, default_value = "jpeg")]
    depth_encoding: String,

    /// Log level filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    let depth_encoding = match args.depth_encoding.as_str() {
        "jpeg" => DepthEncoding::JpegRgb,
        "png" => DepthEncoding::PngGray,
        other => {
            eprintln!("Unknown depth encoding '{other}' (expected 'jpeg' or 'png')");
            std::process::exit(2);
        }
    };

    if let Err(e) = convert::run(&args.dataset_root, depth_encoding) {
        eprintln!("Conversion error: {e}");
        std::process::exit(1);
    }
}
