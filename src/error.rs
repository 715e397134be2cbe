use thiserror::Error;

/// Main error type for the timelapse-forge library
#[derive(Error, Debug)]
pub enum TimelapseError {
    #[error("Scheduling error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Bitrate sizing error: {0}")]
    Sizing(#[from] SizingError),

    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while turning a sequence into an allocation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Invalid scheduling input: {details}")]
    InvalidInput { details: String },

    #[error("Degenerate input for proportional pacing: {details}")]
    DegenerateInput { details: String },
}

/// Errors raised by the bitrate calculation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SizingError {
    #[error("Invalid sizing configuration: {key} = {value}")]
    InvalidConfig { key: String, value: String },
}

/// Errors raised while building a timestamped sequence
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SequenceError {
    #[error("Duplicate image path in sequence: {path}")]
    DuplicatePath { path: String },

    #[error("No capture timestamp for image: {path} ({reason})")]
    MissingTimestamp { path: String, reason: String },

    #[error("Capture times {first} and {last} are too far apart")]
    SpanOverflow { first: i64, last: i64 },
}

/// Errors from image decoding and the external encoders
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("No usable images found in: {path}")]
    NoImagesFound { path: String },

    #[error("Failed to load image: {path} - {reason}")]
    ImageLoadFailed { path: String, reason: String },

    #[error("External tool not available: {tool}")]
    ToolMissing { tool: String },

    #[error("Encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Could not probe media file: {path} - {reason}")]
    ProbeFailed { path: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using TimelapseError
pub type Result<T> = std::result::Result<T, TimelapseError>;

impl ScheduleError {
    pub fn invalid_input<S: Into<String>>(details: S) -> Self {
        Self::InvalidInput { details: details.into() }
    }

    pub fn degenerate<S: Into<String>>(details: S) -> Self {
        Self::DegenerateInput { details: details.into() }
    }
}

impl TimelapseError {
    /// Whether the failure was detected before any encoder ran
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            Self::Schedule(_) | Self::Sizing(_) | Self::Sequence(_) | Self::Config(_)
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Schedule(ScheduleError::DegenerateInput { .. }) => {
                "All images share the same capture time, so proportional pacing is undefined. \
                 Re-run with --fixed-frame-rate."
                    .to_string()
            }
            Self::Media(MediaError::NoImagesFound { path }) => {
                format!("No images with a readable capture time were found in '{}'.", path)
            }
            Self::Media(MediaError::ToolMissing { tool }) => {
                format!("'{}' was not found on PATH. Please install it and try again.", tool)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
