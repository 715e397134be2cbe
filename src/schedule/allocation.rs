use std::path::{Path, PathBuf};

/// How long one image stays on screen
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationEntry<T> {
    pub path: PathBuf,
    pub amount: T,
}

/// Per-image display quantities, in sequence order
///
/// Built once by the scheduler and handed to a renderer as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation<T> {
    entries: Vec<AllocationEntry<T>>,
}

/// Seconds per image, for animated-image output
pub type DurationAllocation = Allocation<f64>;

/// Repeat count per image, for video output
pub type FrameAllocation = Allocation<u32>;

impl<T: Copy> Allocation<T> {
    pub(crate) fn new(entries: Vec<AllocationEntry<T>>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[AllocationEntry<T>] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, T)> {
        self.entries
            .iter()
            .map(|entry| (entry.path.as_path(), entry.amount))
    }

    pub fn amounts(&self) -> Vec<T> {
        self.entries.iter().map(|entry| entry.amount).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DurationAllocation {
    /// Sum of all per-image durations, in seconds
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.amount).sum()
    }
}

impl FrameAllocation {
    pub fn total_frames(&self) -> u64 {
        self.entries.iter().map(|entry| u64::from(entry.amount)).sum()
    }

    /// Playback length of the rendered video at `fps`
    pub fn playback_seconds(&self, fps: u32) -> f64 {
        if fps == 0 {
            return 0.0;
        }
        self.total_frames() as f64 / f64::from(fps)
    }

    /// Number of images that end up with at least one frame
    pub fn visible_images(&self) -> usize {
        self.entries.iter().filter(|entry| entry.amount > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry<T>(name: &str, amount: T) -> AllocationEntry<T> {
        AllocationEntry {
            path: PathBuf::from(name),
            amount,
        }
    }

    #[test]
    fn test_frame_totals() {
        let allocation = Allocation::new(vec![entry("a", 20u32), entry("b", 0), entry("c", 10)]);
        assert_eq!(allocation.total_frames(), 30);
        assert_eq!(allocation.visible_images(), 2);
        assert_eq!(allocation.playback_seconds(20), 1.5);
        assert_eq!(allocation.playback_seconds(0), 0.0);
    }

    #[test]
    fn test_duration_total_and_order() {
        let allocation = Allocation::new(vec![entry("a", 1.0), entry("b", 2.5)]);
        assert_eq!(allocation.total(), 3.5);

        let paths: Vec<_> = allocation.iter().map(|(path, _)| path.to_path_buf()).collect();
        assert_eq!(paths, vec![PathBuf::from("a"), PathBuf::from("b")]);
    }
}
