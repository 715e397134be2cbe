use std::path::Path;

use tracing::info;

use crate::config::VideoConfig;
use crate::encode::tools;
use crate::error::Result;

/// Removes camera shake with ffmpeg's vid.stab filters
///
/// Runs `vidstabdetect` to measure motion into a transforms file, then
/// `vidstabtransform` to compensate for it. Requires an ffmpeg build with
/// libvidstab.
pub struct Stabilizer {
    params: VideoConfig,
    shakiness: u8,
    smoothing: u32,
}

impl Stabilizer {
    pub fn new(params: VideoConfig) -> Self {
        Self {
            params,
            shakiness: 5,
            smoothing: 30,
        }
    }

    pub async fn stabilize(&self, input: &Path, output: &Path, scratch_dir: &Path) -> Result<()> {
        info!("Stabilizing video");
        let transforms = scratch_dir.join("transforms.trf");

        let mut detect = tools::ffmpeg();
        detect.args(self.detect_args(input, &transforms));
        tools::run(detect, "vidstabdetect").await?;

        let mut transform = tools::ffmpeg();
        transform.args(self.transform_args(input, &transforms, output));
        tools::run(transform, "vidstabtransform").await?;

        info!("Video stabilized");
        Ok(())
    }

    fn detect_args(&self, input: &Path, transforms: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            input.display().to_string(),
            "-vf".to_string(),
            format!(
                "vidstabdetect=shakiness={}:accuracy=15:result={}",
                self.shakiness,
                filter_path(transforms)
            ),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ]
    }

    fn transform_args(&self, input: &Path, transforms: &Path, output: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            input.display().to_string(),
            "-vf".to_string(),
            format!(
                "vidstabtransform=input={}:smoothing={},unsharp=5:5:0.8:3:3:0.4",
                filter_path(transforms),
                self.smoothing
            ),
            "-c:v".to_string(),
            self.params.codec.clone(),
            "-pix_fmt".to_string(),
            self.params.pixel_format.clone(),
            output.display().to_string(),
        ]
    }
}

/// Escape a path for use as a filter option value
fn filter_path(path: &Path) -> String {
    path.display()
        .to_string()
        .replace('\\', "/")
        .replace(':', r"\:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_passes_share_transforms_file() {
        let stabilizer = Stabilizer::new(VideoConfig::default());
        let trf = Path::new("scratch/transforms.trf");

        let detect = stabilizer.detect_args(Path::new("raw.mp4"), trf);
        let transform =
            stabilizer.transform_args(Path::new("raw.mp4"), trf, Path::new("stable.mp4"));

        assert!(detect[3].contains("result=scratch/transforms.trf"));
        assert!(transform[3].contains("input=scratch/transforms.trf"));
        assert_eq!(transform.last().map(String::as_str), Some("stable.mp4"));
    }

    #[test]
    fn test_filter_path_escapes_colons() {
        assert_eq!(filter_path(Path::new(r"C:\tmp\t.trf")), r"C\:/tmp/t.trf");
    }
}
