// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use qr_scanner::config::Config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "qr-scanner")]
#[command(about = "Scan QR codes from a camera with live enhancement")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Camera index (/dev/videoN)
    #[arg(short, long, global = true)]
    camera: Option<u32>,

    /// Brightness multiplier (0.1 - 3.0)
    #[arg(short, long, global = true)]
    brightness: Option<f32>,

    /// Contrast multiplier (0.1 - 3.0)
    #[arg(long, global = true)]
    contrast: Option<f32>,

    /// Seconds between two reported scans
    #[arg(long, global = true)]
    cooldown: Option<f64>,

    /// Sleep between capture cycles in milliseconds
    #[arg(long = "interval-ms", global = true)]
    interval_ms: Option<u64>,

    /// Config file (default: ~/.config/qr-scanner/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Live preview in the terminal (default)
    Terminal,

    /// Scan without a preview and print results to stdout
    Scan {
        /// Exit after the first reported code
        #[arg(long)]
        once: bool,
    },

    /// Decode QR codes in an image file
    Decode {
        /// Image to decode
        path: PathBuf,
    },
}

impl Cli {
    /// Command-line values win over the config file
    fn apply_overrides(&self, config: Config) -> Config {
        Config {
            camera_index: self.camera.unwrap_or(config.camera_index),
            brightness: self.brightness.unwrap_or(config.brightness),
            contrast: self.contrast.unwrap_or(config.contrast),
            cooldown_secs: self.cooldown.unwrap_or(config.cooldown_secs),
            frame_interval_ms: self.interval_ms.unwrap_or(config.frame_interval_ms),
            ..config
        }
        .validated()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=qr_scanner=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let config = cli.apply_overrides(file_config);

    match cli.command {
        Some(Commands::Scan { once }) => cli::scan(&config, once),
        Some(Commands::Decode { path }) => {
            cli::decode_image(&path, &config)?;
            Ok(())
        }
        Some(Commands::Terminal) | None => qr_scanner::terminal::run(config, cli.config),
    }
}
