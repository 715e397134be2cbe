//! # Image Sequence Module
//!
//! Builds the time-ordered list of images a timelapse is made from.
//!
//! Images are discovered in a folder, stamped with their EXIF capture time
//! and sorted ascending by that time. Images captured in the same second
//! keep their discovery (file name) order.

pub mod loader;
pub mod types;

pub use loader::{ExifTimestampSource, ImageLoader, TimestampSource};
pub use types::{ImageRecord, TimestampedSequence};
