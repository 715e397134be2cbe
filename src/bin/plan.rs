// Dry run: print the schedule a timelapse would use, without encoding anything

use std::path::PathBuf;

use clap::Parser;
use timelapse_forge::{
    config::{Config, OutputFormat},
    encode::BitrateSizer,
    pipeline::{Schedule, TimelapseEngine},
};

#[derive(Parser)]
#[command(name = "timelapse-plan", about = "Show how output time would be shared between images")]
struct Args {
    /// Folder where the images are located
    #[arg(short, long, default_value = "input")]
    input_folder: PathBuf,

    /// Format to plan for (gif, mp4)
    #[arg(short, long, default_value = "mp4")]
    format: OutputFormat,

    /// Duration of the timelapse in seconds
    #[arg(short, long, default_value_t = 60)]
    duration: u32,

    /// Frame rate of video output
    #[arg(long, default_value_t = 20)]
    fps: u32,

    /// Every image lasts for an equal amount of time
    #[arg(long)]
    fixed_frame_rate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let args = Args::parse();
    let config = Config {
        input_folder: args.input_folder,
        format: args.format,
        duration: args.duration,
        fps: args.fps,
        fixed_frame_rate: args.fixed_frame_rate,
        ..Config::default()
    };
    let size_mb = config.effective_size_mb();

    let engine = TimelapseEngine::new(config)?;
    let plan = engine.plan().await?;

    println!(
        "{} images, {}s of capture time, {} pacing",
        plan.sequence.len(),
        plan.sequence.span(),
        plan.mode
    );

    match plan.schedule {
        Schedule::Gif(durations) => {
            for (path, seconds) in durations.iter() {
                println!("{:>10.3}s  {}", seconds, path.display());
            }
            println!("total {:.3}s", durations.total());
        }
        Schedule::Video { frames, fps } => {
            for (path, count) in frames.iter() {
                println!("{:>8} frames  {}", count, path.display());
            }
            let playback = frames.playback_seconds(fps);
            println!(
                "total {} frames ({:.2}s at {} fps), {} of {} images visible",
                frames.total_frames(),
                playback,
                fps,
                frames.visible_images(),
                frames.len()
            );

            // Estimate only: the real compression measures the rendered file
            if playback > 0.0 {
                let target =
                    BitrateSizer::compute(BitrateSizer::target_size_kb_from_mb(size_mb), playback)?;
                println!("~{} bit/s for a {} MB file", target.ffmpeg_bitrate(), size_mb);
            }
        }
    }

    Ok(())
}
