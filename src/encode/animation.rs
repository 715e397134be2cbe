use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::Command;

use tokio::task;
use tracing::{debug, info, warn};

use crate::config::GifConfig;
use crate::encode::frame::{canvas_size, image_dimensions, Frame};
use crate::encode::tools::{self, GIFSICLE};
use crate::encode::EncodedOutput;
use crate::error::{MediaError, Result};
use crate::schedule::DurationAllocation;

/// Writes a looping animated GIF from a duration allocation
pub struct GifRenderer {
    config: GifConfig,
}

impl GifRenderer {
    pub fn new(config: GifConfig) -> Self {
        Self { config }
    }

    /// Render every image for its allotted time, then optimize if enabled
    pub async fn render<P: AsRef<Path>>(
        &self,
        allocation: &DurationAllocation,
        output_path: P,
    ) -> Result<EncodedOutput> {
        let output_path = output_path.as_ref().to_path_buf();
        let delays = centisecond_delays(&allocation.amounts());
        let frames: Vec<(PathBuf, Vec<u16>)> = allocation
            .iter()
            .zip(delays)
            .filter(|(_, delay)| *delay > 0)
            .map(|((path, _), delay)| (path.to_path_buf(), delay_chunks(delay)))
            .collect();

        if frames.is_empty() {
            return Err(MediaError::EncodingFailed {
                reason: "every image was scheduled for less than 5ms".to_string(),
            }
            .into());
        }

        let skipped = allocation.len() - frames.len();
        if skipped > 0 {
            debug!("{} images round to a zero delay and are left out", skipped);
        }

        info!("Creating gif from {} frames", frames.len());
        let config = self.config.clone();
        let path = output_path.clone();
        let frame_count = frames.len();
        task::spawn_blocking(move || encode_frames(&frames, &config, &path))
            .await
            .map_err(|e| MediaError::EncodingFailed {
                reason: format!("gif encoder task failed: {}", e),
            })??;

        if self.config.optimize {
            self.optimize(&output_path).await?;
        }

        let file_size = std::fs::metadata(&output_path)?.len();
        info!("Gif created: {:.1} MB", file_size as f64 / 1024.0 / 1024.0);

        Ok(EncodedOutput {
            path: output_path,
            duration: allocation.total(),
            frame_count,
            file_size,
        })
    }

    /// Optimize in place with gifsicle, when it is installed
    async fn optimize(&self, path: &Path) -> Result<()> {
        if !tools::is_available(GIFSICLE) {
            warn!("gifsicle not found; skipping gif optimization");
            return Ok(());
        }

        let mut cmd = Command::new(GIFSICLE);
        cmd.args(["--batch", "-O3"]).arg(path);
        tools::run(cmd, "gifsicle").await?;
        debug!("Optimized {:?}", path);
        Ok(())
    }
}

fn encode_frames(
    frames: &[(PathBuf, Vec<u16>)],
    config: &GifConfig,
    output_path: &Path,
) -> Result<()> {
    let first = &frames[0].0;
    let (width, height) = canvas_size(image_dimensions(first)?, config.max_width);
    debug!("Gif canvas is {}x{}", width, height);

    let encoding_failed = |e: gif::EncodingError| MediaError::EncodingFailed {
        reason: format!("gif: {}", e),
    };

    // the gif crate panics outside 1..=30
    let speed = config.speed.clamp(1, 30);
    let writer = BufWriter::new(File::create(output_path)?);
    // canvas_size keeps both sides within u16
    let mut encoder =
        gif::Encoder::new(writer, width as u16, height as u16, &[]).map_err(encoding_failed)?;
    encoder
        .set_repeat(gif::Repeat::Infinite)
        .map_err(encoding_failed)?;

    for (index, (path, delays)) in frames.iter().enumerate() {
        let mut pixels = Frame::open(path)?.fit_to((width, height)).into_raw();
        let mut frame =
            gif::Frame::from_rgba_speed(width as u16, height as u16, &mut pixels, speed);
        // long holds are written as repeats of the same quantized frame
        for delay in delays {
            frame.delay = *delay;
            encoder.write_frame(&frame).map_err(encoding_failed)?;
        }

        debug!("{}/{} frames added to gif", index + 1, frames.len());
    }

    Ok(())
}

/// Convert per-image seconds to GIF delays in hundredths of a second
///
/// Rounds the running total rather than each image, so the delays always add
/// up to the rounded total duration. A single GIF frame holds at most
/// `u16::MAX` centiseconds; see [`delay_chunks`].
pub fn centisecond_delays(durations: &[f64]) -> Vec<u64> {
    let mut elapsed = 0.0;
    let mut emitted: u64 = 0;

    durations
        .iter()
        .map(|seconds| {
            elapsed += seconds.max(0.0);
            let boundary = (elapsed * 100.0).round() as u64;
            let delay = boundary.saturating_sub(emitted);
            emitted = boundary;
            delay
        })
        .collect()
}

/// Split one image's delay into GIF frame delays that sum to it
pub fn delay_chunks(delay: u64) -> Vec<u16> {
    let max = u64::from(u16::MAX);
    let mut chunks = vec![u16::MAX; (delay / max) as usize];
    let rest = delay % max;
    if rest > 0 {
        chunks.push(rest as u16);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{PacingMode, TemporalScheduler};
    use crate::sequence::TimestampedSequence;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn test_delays_preserve_total() {
        let durations = vec![60.0 / 7.0; 7];
        let delays = centisecond_delays(&durations);

        assert_eq!(delays.iter().sum::<u64>(), 6000);
        assert!(delays.iter().all(|&d| d == 857 || d == 858));
    }

    #[test]
    fn test_tiny_durations_round_to_zero() {
        let delays = centisecond_delays(&[1.0, 0.001, 0.002, 0.5]);
        assert_eq!(delays, vec![100, 0, 0, 50]);
    }

    #[test]
    fn test_long_hold_keeps_full_delay() {
        let delays = centisecond_delays(&[1.0, 700.0, 2.0]);
        assert_eq!(delays, vec![100, 70_000, 200]);
        assert_eq!(delays.iter().sum::<u64>(), 70_300);

        let chunks = delay_chunks(70_000);
        assert_eq!(chunks, vec![u16::MAX, 4_465]);
        assert_eq!(chunks.iter().map(|&d| u64::from(d)).sum::<u64>(), 70_000);
    }

    #[test]
    fn test_delay_chunks_edges() {
        assert!(delay_chunks(0).is_empty());
        assert_eq!(delay_chunks(250), vec![250]);
        assert_eq!(delay_chunks(u64::from(u16::MAX)), vec![u16::MAX]);
        assert_eq!(delay_chunks(2 * u64::from(u16::MAX) + 1), vec![u16::MAX, u16::MAX, 1]);
    }

    #[tokio::test]
    async fn test_render_small_gif() {
        let dir = tempdir().unwrap();
        let mut pairs = Vec::new();
        for (i, color) in [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]]
            .into_iter()
            .enumerate()
        {
            let path = dir.path().join(format!("shot_{}.png", i));
            RgbaImage::from_pixel(16, 12, Rgba(color)).save(&path).unwrap();
            pairs.push((path, i as i64 * 30));
        }

        let sequence = TimestampedSequence::from_pairs(pairs).unwrap();
        let allocation = TemporalScheduler::new(3.0, PacingMode::Proportional)
            .durations(&sequence)
            .unwrap();

        let config = GifConfig {
            max_width: 8,
            speed: 30,
            optimize: false,
        };
        let output = dir.path().join("out.gif");
        let encoded = GifRenderer::new(config).render(&allocation, &output).await.unwrap();

        assert_eq!(encoded.frame_count, 3);
        assert!(encoded.file_size > 0);
        let decoder = gif::DecodeOptions::new()
            .read_info(File::open(&output).unwrap())
            .unwrap();
        assert_eq!((decoder.width(), decoder.height()), (8, 6));
    }
}
