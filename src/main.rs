//! # wxsgen: The Main Entry Point
//!
//! This module handles Command Line Interface (CLI) parsing, logging
//! initialization, and dispatching into the generation pipeline. The tool
//! is a one-shot batch utility: it scans a prebuilt application folder,
//! renders a WiX WXS installer manifest for it, and exits.
//!
//! Typical usage, from the folder holding the staged Windows build:
//!
//! ```text
//! wxsgen path/to/mview6-windows [output.wxs]
//! ```

use std::path::PathBuf;
use clap::Parser;
use log::{LevelFilter, error};
use simplelog::{Config, SimpleLogger};

mod config;
mod ident;
mod manifest;
mod scanner;
mod xml;

/// The primary Command Line Interface (CLI) configuration.
///
/// Uses `clap` for argument parsing and help generation.
#[derive(Parser)]
#[command(name = "wxsgen")]
#[command(about = "Generate a WiX WXS installer manifest from an application folder", long_about = None)]
struct Cli {
    /// Root of the prebuilt application tree to package.
    root: PathBuf,

    /// Output manifest path. Defaults to the product's manifest filename
    /// in the current directory.
    output: Option<PathBuf>,

    /// Print the manifest to stdout instead of writing the output file.
    #[arg(long)]
    dry_run: bool,

    /// Turn on verbose logging.
    ///
    /// - `-v`: Debug
    /// - `-vv`: Trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    // Determine log level based on verbosity flag
    let log_level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    // Initialize logger
    // We ignore the result here as logging failure shouldn't crash the startup
    let _ = SimpleLogger::init(log_level, Config::default());

    let product = config::ProductConfig::default();
    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(product.default_output));

    match manifest::generate(&cli.root, &output, &product, cli.dry_run) {
        Ok(count) => {
            if !cli.dry_run {
                println!(
                    "Successfully generated {} with {} components",
                    output.display(),
                    count
                );
            }
        }
        Err(e) => {
            error!("Failed to generate manifest: {e:#}");
            std::process::exit(1);
        }
    }
}
