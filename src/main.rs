// SPDX-License-Identifier: GPL-3.0-only

use camera_session::backends::camera::{DisplayRotation, Resolution};
use camera_session::constants::{DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camera-session")]
#[command(about = "Drive the camera session core against a simulated phone camera")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Device profile (JSON); defaults to a built-in phone
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Display rotation in degrees (0, 90, 180, 270)
    #[arg(long, global = true, default_value = "0")]
    rotation: DisplayRotation,

    /// Preview surface size in display orientation, e.g. 1080x1920
    #[arg(long, global = true)]
    surface: Option<Resolution>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the cameras of the device profile
    List,

    /// Show the negotiated stream plan
    Plan {
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Lock focus and take a photo
    Photo {
        /// Output directory (default: ~/Pictures/Camera2VideoImage)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record a video
    Video {
        /// Recording duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,

        /// Output file path (default: ~/Videos/Camera2VideoImage/VIDEO_TIMESTAMP.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camera_session=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let surface = match cli.surface {
        Some(surface) => surface,
        None => Resolution::new(DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT)?,
    };
    let device = cli::DeviceArgs {
        profile: cli.profile,
        rotation: cli.rotation,
        surface,
    };

    match cli.command {
        Commands::List => cli::list_cameras(&device),
        Commands::Plan { json } => cli::show_plan(&device, json),
        Commands::Photo { output } => cli::take_photo(&device, output),
        Commands::Video { duration, output } => cli::record_video(&device, duration, output),
    }
}
