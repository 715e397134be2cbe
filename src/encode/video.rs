use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::VideoConfig;
use crate::encode::tools;
use crate::encode::EncodedOutput;
use crate::error::{MediaError, Result};
use crate::schedule::FrameAllocation;

/// Forces even dimensions, which yuv420p requires
const EVEN_DIMENSIONS: &str = "scale=trunc(iw/2)*2:trunc(ih/2)*2";

/// One image held on screen for a number of frames
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatEntry {
    pub path: PathBuf,
    pub frames: u32,
    pub seconds: f64,
}

/// Renders a constant frame rate video from a frame allocation via ffmpeg
///
/// Instead of writing every repeated frame, each image is listed once in an
/// ffmpeg concat script with the time it stays on screen, and the `fps`
/// filter duplicates it into that many frames. Output is capped at the
/// allocation's total frame count.
pub struct VideoRenderer {
    params: VideoConfig,
    fps: u32,
}

impl VideoRenderer {
    pub fn new(params: VideoConfig, fps: u32) -> Self {
        Self { params, fps }
    }

    pub async fn render<P: AsRef<Path>>(
        &self,
        allocation: &FrameAllocation,
        scratch_dir: &Path,
        output_path: P,
    ) -> Result<EncodedOutput> {
        let output_path = output_path.as_ref();
        tools::require(tools::FFMPEG)?;

        let entries = concat_entries(allocation, self.fps);
        if entries.is_empty() {
            return Err(MediaError::EncodingFailed {
                reason: "no image was allocated a single frame".to_string(),
            }
            .into());
        }

        let list_path = scratch_dir.join("frames.txt");
        write_concat_list(&entries, &list_path)?;
        debug!("Wrote concat list with {} entries to {:?}", entries.len(), list_path);

        info!(
            "Rendering {} images into {} frames at {} fps",
            entries.len(),
            allocation.total_frames(),
            self.fps
        );

        let mut cmd = tools::ffmpeg();
        cmd.args(self.encode_args(&list_path, allocation.total_frames(), output_path));
        tools::run(cmd, "ffmpeg render").await?;

        let file_size = std::fs::metadata(output_path)?.len();
        Ok(EncodedOutput {
            path: output_path.to_path_buf(),
            duration: allocation.playback_seconds(self.fps),
            frame_count: allocation.total_frames() as usize,
            file_size,
        })
    }

    fn encode_args(&self, list_path: &Path, total_frames: u64, output_path: &Path) -> Vec<String> {
        vec![
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            list_path.display().to_string(),
            "-vf".to_string(),
            format!("{},fps={}", EVEN_DIMENSIONS, self.fps),
            "-c:v".to_string(),
            self.params.codec.clone(),
            "-pix_fmt".to_string(),
            self.params.pixel_format.clone(),
            "-r".to_string(),
            self.fps.to_string(),
            // the repeated last concat entry can yield one extra frame
            "-frames:v".to_string(),
            total_frames.to_string(),
            output_path.display().to_string(),
        ]
    }
}

/// Concat entries for every image that gets at least one frame
pub fn concat_entries(allocation: &FrameAllocation, fps: u32) -> Vec<ConcatEntry> {
    allocation
        .iter()
        .filter(|(_, frames)| *frames > 0)
        .map(|(path, frames)| ConcatEntry {
            path: path.to_path_buf(),
            frames,
            seconds: f64::from(frames) / f64::from(fps.max(1)),
        })
        .collect()
}

/// Write an ffmpeg concat script
///
/// The concat demuxer ignores the duration of the final entry unless the
/// file is listed once more after it.
pub fn write_concat_list(entries: &[ConcatEntry], list_path: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(list_path)?);
    writeln!(file, "ffconcat version 1.0")?;

    for entry in entries {
        writeln!(file, "file '{}'", escape_path(&entry.path))?;
        writeln!(file, "duration {:.6}", entry.seconds)?;
    }

    if let Some(last) = entries.last() {
        writeln!(file, "file '{}'", escape_path(&last.path))?;
    }

    file.flush()?;
    Ok(())
}

/// Absolute path quoted for a concat script
fn escape_path(path: &Path) -> String {
    let absolute = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf());
    absolute.display().to_string().replace('\'', r"'\''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{PacingMode, TemporalScheduler};
    use crate::sequence::TimestampedSequence;
    use tempfile::tempdir;

    fn allocation() -> FrameAllocation {
        let sequence = TimestampedSequence::from_pairs(vec![
            ("/photos/a.jpg", 0),
            ("/photos/b.jpg", 0),
            ("/photos/c.jpg", 40),
        ])
        .unwrap();
        TemporalScheduler::new(2.0, PacingMode::Proportional)
            .frame_counts(&sequence, 10)
            .unwrap()
    }

    #[test]
    fn test_zero_frame_images_are_skipped() {
        let entries = concat_entries(&allocation(), 10);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, PathBuf::from("/photos/a.jpg"));
        assert_eq!(entries[0].frames, 10);
        assert_eq!(entries[0].seconds, 1.0);
        assert_eq!(entries[1].path, PathBuf::from("/photos/c.jpg"));
        assert_eq!(entries[1].frames, 20);
        assert_eq!(entries[1].seconds, 2.0);
    }

    #[test]
    fn test_concat_list_repeats_last_file() {
        let dir = tempdir().unwrap();
        let list_path = dir.path().join("frames.txt");
        write_concat_list(&concat_entries(&allocation(), 10), &list_path).unwrap();

        let content = std::fs::read_to_string(&list_path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "ffconcat version 1.0",
                "file '/photos/a.jpg'",
                "duration 1.000000",
                "file '/photos/c.jpg'",
                "duration 2.000000",
                "file '/photos/c.jpg'",
            ]
        );
    }

    #[test]
    fn test_quotes_are_escaped() {
        assert_eq!(escape_path(Path::new("/tmp/it's.jpg")), r"/tmp/it'\''s.jpg");
    }

    #[test]
    fn test_encode_args_use_fps() {
        let renderer = VideoRenderer::new(VideoConfig::default(), 24);
        let args = renderer.encode_args(Path::new("list.txt"), 30, Path::new("out.mp4"));

        assert!(args.contains(&"scale=trunc(iw/2)*2:trunc(ih/2)*2,fps=24".to_string()));
        let limit = args.iter().position(|a| a == "-frames:v").unwrap();
        assert_eq!(args[limit + 1], "30");
        assert!(args.contains(&"libx264".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }
}
