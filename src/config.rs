use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    schedule::PacingMode,
};

/// Main configuration for a timelapse run
///
/// Built once (defaults, then the optional TOML file, then command-line
/// overrides) and passed by reference to every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder holding the source images
    pub input_folder: PathBuf,

    /// Folder the timelapse is written to
    pub output_folder: PathBuf,

    /// Output container
    pub format: OutputFormat,

    /// Base file name of the output, without extension
    pub name: String,

    /// Target length of the timelapse in seconds
    pub duration: u32,

    /// Target video size in MB; defaults to one MB per second of output
    pub size: Option<u32>,

    /// Give every image the same share of the output
    pub fixed_frame_rate: bool,

    /// Run the stabilization pass on video output
    pub stabilize: bool,

    /// Frame rate of video output
    pub fps: u32,

    /// Worker threads used to read image metadata
    pub threads: usize,

    /// Video encoder settings
    pub video: VideoConfig,

    /// GIF encoder settings
    pub gif: GifConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_folder: PathBuf::from("input"),
            output_folder: PathBuf::from("output"),
            format: OutputFormat::Mp4,
            name: "timelapse".to_string(),
            duration: 60,
            size: None,
            fixed_frame_rate: false,
            stabilize: true,
            fps: 20,
            threads: num_cpus::get(),
            video: VideoConfig::default(),
            gif: GifConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.duration == 0 {
            return Err(invalid("duration", self.duration));
        }

        if self.size == Some(0) {
            return Err(invalid("size", 0));
        }

        if self.fps == 0 {
            return Err(invalid("fps", self.fps));
        }

        if self.threads == 0 {
            return Err(invalid("threads", self.threads));
        }

        if self.name.trim().is_empty() || self.name.contains(['/', '\\']) {
            return Err(invalid("name", &self.name));
        }

        self.video.validate()?;
        self.gif.validate()?;
        Ok(())
    }

    /// Target size in MB, falling back to one MB per second of output
    pub fn effective_size_mb(&self) -> u32 {
        self.size.unwrap_or(self.duration)
    }

    pub fn pacing_mode(&self) -> PacingMode {
        PacingMode::from_fixed_frame_rate(self.fixed_frame_rate)
    }

    /// File name of the final output, e.g. `timelapse.mp4`
    pub fn output_file_name(&self) -> String {
        format!("{}.{}", self.name, self.format.extension())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_folder.join(self.output_file_name())
    }
}

fn invalid<V: ToString>(key: &str, value: V) -> crate::error::TimelapseError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
    .into()
}

/// Output container of a timelapse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Gif,
    #[serde(alias = "video")]
    Mp4,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Mp4 => "mp4",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gif" => Ok(Self::Gif),
            "mp4" | "video" => Ok(Self::Mp4),
            other => Err(format!("unsupported format '{}' (expected gif or mp4)", other)),
        }
    }
}

/// Video encoding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// ffmpeg video codec used for rendering and compression
    pub codec: String,

    /// Pixel format of the rendered video
    pub pixel_format: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
        }
    }
}

impl VideoConfig {
    fn validate(&self) -> Result<()> {
        if self.codec.trim().is_empty() {
            return Err(invalid("video.codec", &self.codec));
        }

        if self.pixel_format.trim().is_empty() {
            return Err(invalid("video.pixel_format", &self.pixel_format));
        }

        Ok(())
    }
}

/// GIF encoding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GifConfig {
    /// Frames wider than this are scaled down, keeping aspect ratio
    pub max_width: u32,

    /// Quantization speed, 1 (best) to 30 (fastest)
    pub speed: i32,

    /// Run gifsicle over the result when it is installed
    pub optimize: bool,
}

impl Default for GifConfig {
    fn default() -> Self {
        Self {
            max_width: 1280,
            speed: 10,
            optimize: true,
        }
    }
}

impl GifConfig {
    fn validate(&self) -> Result<()> {
        if self.max_width == 0 {
            return Err(invalid("gif.max_width", self.max_width));
        }

        if !(1..=30).contains(&self.speed) {
            return Err(invalid("gif.speed", self.speed));
        }

        Ok(())
    }
}
