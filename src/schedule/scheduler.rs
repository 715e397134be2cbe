use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScheduleError;
use crate::schedule::allocation::{
    Allocation, AllocationEntry, DurationAllocation, FrameAllocation,
};
use crate::sequence::TimestampedSequence;

/// On-screen time of the first image in proportional mode, in seconds
///
/// The first image has no predecessor to measure a gap from, so it is
/// always shown for one unit: one second, or `fps` frames.
pub const FIRST_IMAGE_SECONDS: f64 = 1.0;

/// How output time is shared between images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    /// Every image gets the same share of the output
    FixedRate,
    /// Each image's share follows the real time elapsed since the previous image
    Proportional,
}

impl PacingMode {
    pub fn from_fixed_frame_rate(fixed_frame_rate: bool) -> Self {
        if fixed_frame_rate {
            Self::FixedRate
        } else {
            Self::Proportional
        }
    }
}

impl std::fmt::Display for PacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FixedRate => write!(f, "fixed-rate"),
            Self::Proportional => write!(f, "proportional"),
        }
    }
}

/// Spreads a fixed output duration over a timestamped sequence
///
/// The scheduler is a pure function of its inputs: the same sequence,
/// duration and mode always give the same allocation.
///
/// Frame counts are truncated, so a frame allocation can fall short of
/// `fps * total_duration`. The shortfall is left as is.
#[derive(Debug, Clone, Copy)]
pub struct TemporalScheduler {
    total_duration: f64,
    mode: PacingMode,
}

impl TemporalScheduler {
    pub fn new(total_duration: f64, mode: PacingMode) -> Self {
        Self {
            total_duration,
            mode,
        }
    }

    pub fn mode(&self) -> PacingMode {
        self.mode
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Seconds each image stays on screen, for animated-image output
    pub fn durations(
        &self,
        sequence: &TimestampedSequence,
    ) -> Result<DurationAllocation, ScheduleError> {
        self.check_duration()?;
        let span = self.check_sequence(sequence)?;
        let count = sequence.len() as f64;

        let amounts: Vec<f64> = match self.mode {
            PacingMode::FixedRate => {
                let share = self.total_duration / count;
                vec![share; sequence.len()]
            }
            PacingMode::Proportional => std::iter::once(FIRST_IMAGE_SECONDS)
                .chain(
                    sequence
                        .gaps()
                        .map(|gap| gap as f64 * self.total_duration / span),
                )
                .collect(),
        };

        let allocation = Self::assemble(sequence, amounts);
        debug!(
            "Scheduled {} images ({}) over {:.3}s",
            allocation.len(),
            self.mode,
            allocation.total()
        );
        Ok(allocation)
    }

    /// Repeat count of each image at `fps`, for video output
    pub fn frame_counts(
        &self,
        sequence: &TimestampedSequence,
        fps: u32,
    ) -> Result<FrameAllocation, ScheduleError> {
        self.check_duration()?;
        if fps == 0 {
            return Err(ScheduleError::invalid_input("fps must be greater than zero"));
        }
        let span = self.check_sequence(sequence)?;
        let fps_f = f64::from(fps);

        let amounts: Vec<u32> = match self.mode {
            PacingMode::FixedRate => {
                let frames = Self::truncate(fps_f * self.total_duration / sequence.len() as f64);
                vec![frames; sequence.len()]
            }
            PacingMode::Proportional => std::iter::once(fps)
                .chain(sequence.gaps().map(|gap| {
                    Self::truncate(gap as f64 * self.total_duration * fps_f / span)
                }))
                .collect(),
        };

        let allocation = Self::assemble(sequence, amounts);
        debug!(
            "Scheduled {} images ({}) into {} frames at {} fps (requested {:.0})",
            allocation.len(),
            self.mode,
            allocation.total_frames(),
            fps,
            fps_f * self.total_duration
        );
        Ok(allocation)
    }

    fn check_duration(&self) -> Result<(), ScheduleError> {
        if !self.total_duration.is_finite() || self.total_duration <= 0.0 {
            return Err(ScheduleError::invalid_input(format!(
                "total duration must be a positive number of seconds, got {}",
                self.total_duration
            )));
        }
        Ok(())
    }

    /// Returns the span as a float once the sequence is usable for this mode
    fn check_sequence(&self, sequence: &TimestampedSequence) -> Result<f64, ScheduleError> {
        if sequence.is_empty() {
            return Err(ScheduleError::invalid_input("image sequence is empty"));
        }

        let span = sequence.span();
        if self.mode == PacingMode::Proportional && span == 0 {
            return Err(ScheduleError::degenerate(format!(
                "{} image(s) share a single capture time",
                sequence.len()
            )));
        }
        Ok(span as f64)
    }

    fn truncate(frames: f64) -> u32 {
        // `as` saturates, so absurd requests clamp instead of wrapping
        frames.floor() as u32
    }

    fn assemble<T: Copy>(sequence: &TimestampedSequence, amounts: Vec<T>) -> Allocation<T> {
        let entries = sequence
            .iter()
            .zip(amounts)
            .map(|(record, amount)| AllocationEntry {
                path: record.path().to_path_buf(),
                amount,
            })
            .collect();
        Allocation::new(entries)
    }
}
