use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task;
use tracing::{debug, info};

use crate::{
    config::{Config, OutputFormat},
    encode::{
        CompressionTarget, EncodedOutput, GifRenderer, Stabilizer, TwoPassCompressor,
        VideoRenderer,
    },
    error::{MediaError, Result},
    pipeline::scratch::ScratchSpace,
    schedule::{DurationAllocation, FrameAllocation, PacingMode, TemporalScheduler},
    sequence::{ImageLoader, TimestampedSequence},
};

/// Main engine that turns a folder of photos into a timelapse
///
/// The engine follows a fixed pipeline:
/// 1. Sequence Loading - Discover images and order them by capture time
/// 2. Scheduling - Allocate output time to every image
/// 3. Rendering - Write a GIF, or a raw video into scratch space
/// 4. Stabilization - Optional, video only
/// 5. Compression - Two-pass encode to the size budget, video only
///
/// Intermediate files live in a [`ScratchSpace`] that is removed however the
/// run ends. Scheduling fails before any encoder is started.
pub struct TimelapseEngine {
    config: Config,
    loader: Arc<ImageLoader>,
}

/// The per-image schedule for the configured output format
#[derive(Debug, Clone)]
pub enum Schedule {
    /// Seconds per image
    Gif(DurationAllocation),
    /// Frames per image at `fps`
    Video { frames: FrameAllocation, fps: u32 },
}

/// Result of steps 1 and 2, without touching any encoder
#[derive(Debug, Clone)]
pub struct SchedulePlan {
    pub sequence: TimestampedSequence,
    pub mode: PacingMode,
    pub schedule: Schedule,
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct TimelapseSummary {
    pub output_path: PathBuf,
    pub image_count: usize,
    pub scheduled_duration: f64,
    pub file_size: u64,
    /// Bit rate of the compression passes, for video output
    pub bitrate: Option<f64>,
}

impl TimelapseEngine {
    /// Create an engine reading EXIF timestamps; the configuration is validated here
    pub fn new(config: Config) -> Result<Self> {
        let loader = ImageLoader::new(config.threads);
        Self::with_loader(config, loader)
    }

    pub fn with_loader(config: Config, loader: ImageLoader) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            loader: Arc::new(loader),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load and schedule only
    pub async fn plan(&self) -> Result<SchedulePlan> {
        let sequence = self.load_sequence().await?;
        let schedule = self.schedule(&sequence)?;

        Ok(SchedulePlan {
            sequence,
            mode: self.config.pacing_mode(),
            schedule,
        })
    }

    /// Run the whole pipeline and write the timelapse
    pub async fn create(&self) -> Result<TimelapseSummary> {
        let output_path = self.config.output_path();

        info!("🎬 Starting timelapse");
        info!("   Input: {:?}", self.config.input_folder);
        info!("   Output: {:?}", output_path);
        info!("   Pacing: {}", self.config.pacing_mode());

        // Steps 1-2: nothing external has run if these fail
        let plan = self.plan().await?;

        tokio::fs::create_dir_all(&self.config.output_folder).await?;
        let scratch = ScratchSpace::create_in(&self.config.output_folder)?;

        let (encoded, target) = match &plan.schedule {
            Schedule::Gif(durations) => (self.render_gif(durations, &scratch).await?, None),
            Schedule::Video { frames, fps } => {
                let (encoded, target) = self.render_video(frames, *fps, &scratch).await?;
                (encoded, Some(target))
            }
        };

        tokio::fs::rename(&encoded.path, &output_path).await?;
        scratch.close()?;

        let file_size = tokio::fs::metadata(&output_path).await?.len();
        info!("🎉 Timelapse complete! Output saved to: {:?}", output_path);
        info!("   Images: {}", plan.sequence.len());
        info!("   Duration: {:.1}s", encoded.duration);
        info!("   File size: {:.1} MB", file_size as f64 / 1024.0 / 1024.0);

        Ok(TimelapseSummary {
            output_path,
            image_count: plan.sequence.len(),
            scheduled_duration: encoded.duration,
            file_size,
            bitrate: target.map(|t| t.bits_per_second()),
        })
    }

    // ==========================================
    // STEP 1: SEQUENCE LOADING
    // ==========================================

    async fn load_sequence(&self) -> Result<TimestampedSequence> {
        info!("📷 Step 1: Reading capture times...");
        let loader = Arc::clone(&self.loader);
        let folder = self.config.input_folder.clone();

        let sequence = task::spawn_blocking(move || loader.load_sequence(&folder))
            .await
            .map_err(|e| MediaError::EncodingFailed {
                reason: format!("image loading task failed: {}", e),
            })??;

        if let (Some(first), Some(last)) = (sequence.first(), sequence.last()) {
            debug!(
                "First image {} at {}, last image {} at {}",
                first.display_name(),
                first.captured_at(),
                last.display_name(),
                last.captured_at()
            );
        }
        Ok(sequence)
    }

    // ==========================================
    // STEP 2: SCHEDULING
    // ==========================================

    fn schedule(&self, sequence: &TimestampedSequence) -> Result<Schedule> {
        info!("⏱️  Step 2: Scheduling {} images...", sequence.len());
        let scheduler =
            TemporalScheduler::new(f64::from(self.config.duration), self.config.pacing_mode());

        let schedule = match self.config.format {
            OutputFormat::Gif => Schedule::Gif(scheduler.durations(sequence)?),
            OutputFormat::Mp4 => Schedule::Video {
                frames: scheduler.frame_counts(sequence, self.config.fps)?,
                fps: self.config.fps,
            },
        };
        Ok(schedule)
    }

    // ==========================================
    // STEPS 3-5: RENDERING
    // ==========================================

    async fn render_gif(
        &self,
        durations: &DurationAllocation,
        scratch: &ScratchSpace,
    ) -> Result<EncodedOutput> {
        info!("🖼️  Step 3: Rendering gif...");
        let renderer = GifRenderer::new(self.config.gif.clone());
        renderer.render(durations, scratch.file("timelapse.gif")).await
    }

    async fn render_video(
        &self,
        frames: &FrameAllocation,
        fps: u32,
        scratch: &ScratchSpace,
    ) -> Result<(EncodedOutput, CompressionTarget)> {
        info!("🎞️  Step 3: Rendering video...");
        let renderer = VideoRenderer::new(self.config.video.clone(), fps);
        let rendered = renderer
            .render(frames, scratch.path(), scratch.file("render.mp4"))
            .await?;

        let source = if self.config.stabilize {
            info!("🪄 Step 4: Stabilizing...");
            let stable = scratch.file("stable.mp4");
            Stabilizer::new(self.config.video.clone())
                .stabilize(&rendered.path, &stable, scratch.path())
                .await?;
            stable
        } else {
            debug!("Stabilization disabled");
            rendered.path.clone()
        };

        info!("📦 Step 5: Compressing to {} MB...", self.config.effective_size_mb());
        let compressed = scratch.file("final.mp4");
        let target = TwoPassCompressor::new(self.config.video.clone())
            .compress(
                &source,
                &compressed,
                self.config.effective_size_mb(),
                scratch.path(),
            )
            .await?;

        Ok((
            EncodedOutput {
                path: compressed.clone(),
                file_size: file_size(&compressed)?,
                ..rendered
            },
            target,
        ))
    }
}

fn file_size(path: &Path) -> Result<u64> {
    Ok(std::fs::metadata(path)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ScheduleError, SequenceError, TimelapseError};
    use crate::sequence::TimestampSource;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    /// Capture time taken from the digits in the file name
    struct NameTimestamps;

    impl TimestampSource for NameTimestamps {
        fn captured_at(&self, path: &Path) -> std::result::Result<i64, SequenceError> {
            let stem = path.file_stem().unwrap().to_string_lossy();
            let digits: String = stem.chars().filter(char::is_ascii_digit).collect();
            digits.parse().map_err(|_| SequenceError::MissingTimestamp {
                path: path.display().to_string(),
                reason: "no digits".to_string(),
            })
        }
    }

    fn write_images(dir: &Path, stamps: &[i64]) {
        for (i, stamp) in stamps.iter().enumerate() {
            let shade = (i * 60 % 255) as u8;
            RgbImage::from_pixel(12, 8, Rgb([shade, 128, 255 - shade]))
                .save(dir.join(format!("shot_{}.png", stamp)))
                .unwrap();
        }
    }

    fn engine(config: Config) -> TimelapseEngine {
        TimelapseEngine::with_loader(config, ImageLoader::with_source(Box::new(NameTimestamps), 2))
            .unwrap()
    }

    fn config_for(input: &Path, output: &Path) -> Config {
        Config {
            input_folder: input.to_path_buf(),
            output_folder: output.to_path_buf(),
            duration: 6,
            ..Config::default()
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = Config {
            duration: 0,
            ..Config::default()
        };
        assert!(TimelapseEngine::new(config).is_err());
    }

    #[tokio::test]
    async fn test_plan_video_schedule() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_images(input.path(), &[100, 110, 130]);

        let plan = engine(config_for(input.path(), output.path())).plan().await.unwrap();

        assert_eq!(plan.sequence.len(), 3);
        assert_eq!(plan.mode, PacingMode::Proportional);
        match plan.schedule {
            // gaps 10s and 20s over a 30s span, 6s at 20 fps
            Schedule::Video { frames, fps } => {
                assert_eq!(fps, 20);
                assert_eq!(frames.amounts(), vec![20, 40, 80]);
            }
            other => panic!("expected a video schedule, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_degenerate_sequence_fails_before_encoding() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        // all images carry the same timestamp
        RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]))
            .save(input.path().join("a_5.png"))
            .unwrap();
        RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]))
            .save(input.path().join("b_5.png"))
            .unwrap();

        let out_dir = output.path().join("out");
        let result = engine(config_for(input.path(), &out_dir)).create().await;

        assert!(matches!(
            result,
            Err(TimelapseError::Schedule(ScheduleError::DegenerateInput { .. }))
        ));
        assert!(!out_dir.exists());
    }

    #[tokio::test]
    async fn test_create_gif_end_to_end() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_images(input.path(), &[0, 30, 90]);

        let mut config = config_for(input.path(), output.path());
        config.format = OutputFormat::Gif;
        config.fixed_frame_rate = true;
        config.gif.optimize = false;

        let summary = engine(config).create().await.unwrap();

        assert_eq!(summary.output_path, output.path().join("timelapse.gif"));
        assert!(summary.output_path.exists());
        assert_eq!(summary.image_count, 3);
        assert!((summary.scheduled_duration - 6.0).abs() < 1e-9);
        assert!(summary.bitrate.is_none());

        // only the finished gif is left behind
        let leftovers: Vec<_> = std::fs::read_dir(output.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }
}
