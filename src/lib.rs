//! # Timelapse-Forge
//!
//! Turn a folder of timestamped photos into a timelapse GIF or a
//! size-bounded MP4 whose pacing follows the real time between shots.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use timelapse_forge::{config::Config, pipeline::TimelapseEngine};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config {
//!     input_folder: "photos".into(),
//!     duration: 30,
//!     ..Config::default()
//! };
//!
//! let engine = TimelapseEngine::new(config)?;
//! let summary = engine.create().await?;
//! println!("Wrote {:?}", summary.output_path);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`sequence`] - Image discovery and capture-time ordering
//! - [`schedule`] - Allocation of output time to images
//! - [`encode`] - GIF/video rendering, stabilization and size-targeted compression
//! - [`pipeline`] - The engine that runs the steps in order
//! - [`config`] - Configuration management
//!
//! The scheduler and the bit rate calculation are pure functions and can be
//! used on their own:
//!
//! ```rust
//! use timelapse_forge::encode::BitrateSizer;
//!
//! let target = BitrateSizer::compute(6000.0, 60.0)?;
//! assert_eq!(target.ffmpeg_bitrate(), "762939");
//! # Ok::<(), timelapse_forge::error::SizingError>(())
//! ```

pub mod config;
pub mod encode;
pub mod error;
pub mod pipeline;
pub mod schedule;
pub mod sequence;

// Re-export commonly used types for convenience
pub use crate::{
    config::{Config, OutputFormat},
    error::{Result, TimelapseError},
    pipeline::TimelapseEngine,
    schedule::{PacingMode, TemporalScheduler},
    sequence::{ImageRecord, TimestampedSequence},
};
