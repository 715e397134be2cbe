use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use timelapse_forge::{
    config::{Config, OutputFormat},
    pipeline::TimelapseEngine,
};

#[derive(Parser)]
#[command(
    name = "timelapse",
    version,
    about = "Create a timelapse video/gif from a set of images",
    long_about = "Orders photos by their EXIF capture time and turns them into a timelapse whose pacing follows the real time between shots (or a fixed rate), then compresses video output to a target size."
)]
struct Cli {
    /// Folder where the images are located [default: input]
    #[arg(short, long)]
    input_folder: Option<PathBuf>,

    /// Folder where the timelapse is saved [default: output]
    #[arg(short, long)]
    output_folder: Option<PathBuf>,

    /// Format of the timelapse (gif, mp4) [default: mp4]
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Name of the timelapse, without extension [default: timelapse]
    #[arg(short, long)]
    name: Option<String>,

    /// Duration of the timelapse in seconds [default: 60]
    #[arg(short, long)]
    duration: Option<u32>,

    /// Size of the timelapse video in MB; mp4 only [default: same as duration]
    #[arg(short, long)]
    size: Option<u32>,

    /// Frame rate of video output [default: 20]
    #[arg(long)]
    fps: Option<u32>,

    /// Every image lasts for an equal amount of time
    #[arg(long)]
    fixed_frame_rate: bool,

    /// Don't stabilize the timelapse
    #[arg(long)]
    no_stabilize: bool,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Layer command-line values over the file or default configuration
    fn apply(self, mut config: Config) -> Config {
        if let Some(input_folder) = self.input_folder {
            config.input_folder = input_folder;
        }
        if let Some(output_folder) = self.output_folder {
            config.output_folder = output_folder;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(name) = self.name {
            config.name = name;
        }
        if let Some(duration) = self.duration {
            config.duration = duration;
        }
        if self.size.is_some() {
            config.size = self.size;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if self.fixed_frame_rate {
            config.fixed_frame_rate = true;
        }
        if self.no_stabilize {
            config.stabilize = false;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting timelapse-forge v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let base = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };
    let config = cli.apply(base);

    if config.format == OutputFormat::Gif && config.size.is_some() {
        info!("--size only applies to mp4 output and will be ignored");
    }

    let engine = TimelapseEngine::new(config)?;
    match engine.create().await {
        Ok(summary) => {
            info!(
                "Saved {} images as {:?} ({:.1} MB)",
                summary.image_count,
                summary.output_path,
                summary.file_size as f64 / 1024.0 / 1024.0
            );
            Ok(())
        }
        Err(e) => {
            error!("{}", e.user_message());
            Err(e.into())
        }
    }
}
