//! # Scheduling Module
//!
//! Turns irregular capture timestamps into an output schedule.
//!
//! Two pacing modes are supported:
//!
//! - **Fixed rate**: every image gets `total / count` of the output.
//! - **Proportional**: every image after the first gets a share of the
//!   output proportional to the real time elapsed since the previous image.
//!   The first image is always shown for one second (or `fps` frames).
//!
//! ```rust
//! use timelapse_forge::schedule::{PacingMode, TemporalScheduler};
//! use timelapse_forge::sequence::TimestampedSequence;
//!
//! let sequence = TimestampedSequence::from_pairs(vec![
//!     ("dawn.jpg", 0),
//!     ("noon.jpg", 60),
//!     ("dusk.jpg", 240),
//! ])?;
//!
//! let scheduler = TemporalScheduler::new(24.0, PacingMode::Proportional);
//! let frames = scheduler.frame_counts(&sequence, 20)?;
//! assert_eq!(frames.amounts(), vec![20, 120, 360]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod allocation;
pub mod scheduler;

pub use allocation::{Allocation, AllocationEntry, DurationAllocation, FrameAllocation};
pub use scheduler::{PacingMode, TemporalScheduler, FIRST_IMAGE_SECONDS};
