//! # Encoding Module
//!
//! Everything that turns a schedule into a file on disk.
//!
//! - [`animation`] writes animated GIFs directly with the `gif` crate
//! - [`video`], [`stabilize`] and [`compress`] drive the `ffmpeg` CLI
//! - [`sizing`] derives the bit rate used by the two-pass compression

pub mod animation;
pub mod compress;
pub mod frame;
pub mod sizing;
pub mod stabilize;
pub mod tools;
pub mod video;

use std::path::PathBuf;

pub use animation::GifRenderer;
pub use compress::TwoPassCompressor;
pub use frame::Frame;
pub use sizing::{BitrateSizer, CompressionTarget, SIZE_CORRECTION};
pub use stabilize::Stabilizer;
pub use video::VideoRenderer;

/// A file written by one of the renderers
#[derive(Debug, Clone)]
pub struct EncodedOutput {
    pub path: PathBuf,
    /// Scheduled playback length in seconds
    pub duration: f64,
    pub frame_count: usize,
    pub file_size: u64,
}
