use std::path::Path;

use tracing::info;

use crate::config::VideoConfig;
use crate::encode::sizing::{BitrateSizer, CompressionTarget};
use crate::encode::tools;
use crate::error::Result;

/// Squeezes a rendered video towards a target file size
///
/// Measures the video's duration, derives one bit rate from the size
/// budget, and encodes twice at that bit rate: an analysis pass whose output
/// is discarded, then the final pass.
pub struct TwoPassCompressor {
    params: VideoConfig,
}

impl TwoPassCompressor {
    pub fn new(params: VideoConfig) -> Self {
        Self { params }
    }

    pub async fn compress(
        &self,
        input: &Path,
        output: &Path,
        size_mb: u32,
        scratch_dir: &Path,
    ) -> Result<CompressionTarget> {
        info!("Compressing video");
        tools::require(tools::FFPROBE)?;

        let duration = tools::probe_duration(input).await?;
        let target =
            BitrateSizer::compute(BitrateSizer::target_size_kb_from_mb(size_mb), duration)?;
        info!(
            "Targeting {} MB over {:.2}s at {} bit/s",
            size_mb,
            duration,
            target.ffmpeg_bitrate()
        );

        let passlog = scratch_dir.join("ffmpeg2pass");

        let mut first = tools::ffmpeg();
        first.args(self.pass_args(1, input, Path::new(tools::null_device()), &target, &passlog));
        tools::run(first, "compression pass 1").await?;

        let mut second = tools::ffmpeg();
        second.args(self.pass_args(2, input, output, &target, &passlog));
        tools::run(second, "compression pass 2").await?;

        Ok(target)
    }

    fn pass_args(
        &self,
        pass: u8,
        input: &Path,
        output: &Path,
        target: &CompressionTarget,
        passlog: &Path,
    ) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            input.display().to_string(),
            "-c:v".to_string(),
            self.params.codec.clone(),
            "-b:v".to_string(),
            target.ffmpeg_bitrate(),
            "-pix_fmt".to_string(),
            self.params.pixel_format.clone(),
            "-pass".to_string(),
            pass.to_string(),
            "-passlogfile".to_string(),
            passlog.display().to_string(),
            "-an".to_string(),
        ];

        if pass == 1 {
            // the analysis pass writes to the null device, so name the muxer
            args.extend(["-f".to_string(), "mp4".to_string()]);
        }

        args.push(output.display().to_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|arg| arg == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_passes_share_bitrate_and_log() {
        let compressor = TwoPassCompressor::new(VideoConfig::default());
        let target = BitrateSizer::compute(6000.0, 60.0).unwrap();
        let passlog = Path::new("scratch/ffmpeg2pass");

        let first = compressor.pass_args(1, Path::new("in.mp4"), Path::new("/dev/null"), &target, passlog);
        let second = compressor.pass_args(2, Path::new("in.mp4"), Path::new("out.mp4"), &target, passlog);

        assert_eq!(value_after(&first, "-b:v"), Some("762939"));
        assert_eq!(value_after(&first, "-b:v"), value_after(&second, "-b:v"));
        assert_eq!(value_after(&first, "-passlogfile"), value_after(&second, "-passlogfile"));
        assert_eq!(value_after(&first, "-pass"), Some("1"));
        assert_eq!(value_after(&second, "-pass"), Some("2"));

        assert_eq!(value_after(&first, "-f"), Some("mp4"));
        assert_eq!(value_after(&second, "-f"), None);
        assert_eq!(second.last().map(String::as_str), Some("out.mp4"));
    }
}
