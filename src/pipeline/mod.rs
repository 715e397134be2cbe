//! # Timelapse Pipeline
//!
//! The engine runs loading, scheduling and encoding in order and owns the
//! scratch space intermediate files are written to.

pub mod engine;
pub mod scratch;

// Re-exports for convenience
pub use engine::{Schedule, SchedulePlan, TimelapseEngine, TimelapseSummary};
pub use scratch::ScratchSpace;
