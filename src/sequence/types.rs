use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::SequenceError;

/// A single still image and the moment it was captured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    path: PathBuf,
    captured_at: i64,
}

impl ImageRecord {
    /// Create a record from a path and a capture time in seconds since the Unix epoch
    pub fn new<P: Into<PathBuf>>(path: P, captured_at: i64) -> Self {
        Self {
            path: path.into(),
            captured_at,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn captured_at(&self) -> i64 {
        self.captured_at
    }

    /// File name used in log output
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Images ordered by capture time
///
/// Records are sorted ascending by `captured_at`. The sort is stable, so
/// records sharing a timestamp keep the order they were supplied in (the
/// discovery order). Paths are unique, and the span between the first and
/// last capture fits in an `i64`.
#[derive(Debug, Clone, Default)]
pub struct TimestampedSequence {
    records: Vec<ImageRecord>,
}

impl TimestampedSequence {
    /// Build a sequence from records in discovery order
    pub fn new(mut records: Vec<ImageRecord>) -> Result<Self, SequenceError> {
        {
            let mut seen = HashSet::with_capacity(records.len());
            for record in &records {
                if !seen.insert(record.path()) {
                    return Err(SequenceError::DuplicatePath {
                        path: record.path().display().to_string(),
                    });
                }
            }
        }

        // `sort_by_key` is stable
        records.sort_by_key(|record| record.captured_at);

        // every gap is bounded by the span, so one check covers both
        if let (Some(first), Some(last)) = (records.first(), records.last()) {
            if last.captured_at.checked_sub(first.captured_at).is_none() {
                return Err(SequenceError::SpanOverflow {
                    first: first.captured_at,
                    last: last.captured_at,
                });
            }
        }

        Ok(Self { records })
    }

    /// Build a sequence from `(path, captured_at)` pairs in discovery order
    pub fn from_pairs<P, I>(pairs: I) -> Result<Self, SequenceError>
    where
        P: Into<PathBuf>,
        I: IntoIterator<Item = (P, i64)>,
    {
        let records = pairs
            .into_iter()
            .map(|(path, captured_at)| ImageRecord::new(path, captured_at))
            .collect();
        Self::new(records)
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&ImageRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&ImageRecord> {
        self.records.last()
    }

    /// Elapsed capture time between the first and last image, in seconds
    ///
    /// Zero for an empty or single-image sequence, or when every image
    /// shares one timestamp.
    pub fn span(&self) -> i64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => last.captured_at - first.captured_at,
            _ => 0,
        }
    }

    /// Seconds elapsed since the previous image, for each image after the first
    pub fn gaps(&self) -> impl Iterator<Item = i64> + '_ {
        self.records
            .windows(2)
            .map(|pair| pair[1].captured_at - pair[0].captured_at)
    }
}

impl<'a> IntoIterator for &'a TimestampedSequence {
    type Item = &'a ImageRecord;
    type IntoIter = std::slice::Iter<'a, ImageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_sorted_by_capture_time() {
        let sequence = TimestampedSequence::from_pairs(vec![
            ("c.jpg", 300),
            ("a.jpg", 100),
            ("b.jpg", 200),
        ])
        .unwrap();

        let names: Vec<_> = sequence.iter().map(|r| r.display_name()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(sequence.span(), 200);
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let sequence = TimestampedSequence::from_pairs(vec![
            ("late.jpg", 50),
            ("z.jpg", 10),
            ("y.jpg", 10),
            ("x.jpg", 10),
        ])
        .unwrap();

        let names: Vec<_> = sequence.iter().map(|r| r.display_name()).collect();
        assert_eq!(names, vec!["z.jpg", "y.jpg", "x.jpg", "late.jpg"]);
    }

    #[test]
    fn test_duplicate_paths_rejected() {
        let result = TimestampedSequence::from_pairs(vec![("a.jpg", 1), ("a.jpg", 2)]);
        assert_eq!(
            result.unwrap_err(),
            SequenceError::DuplicatePath { path: "a.jpg".to_string() }
        );
    }

    #[test]
    fn test_span_edge_cases() {
        assert_eq!(TimestampedSequence::default().span(), 0);

        let single = TimestampedSequence::from_pairs(vec![("a.jpg", 42)]).unwrap();
        assert_eq!(single.span(), 0);

        let flat = TimestampedSequence::from_pairs(vec![("a.jpg", 7), ("b.jpg", 7)]).unwrap();
        assert_eq!(flat.span(), 0);
    }

    #[test]
    fn test_unrepresentable_span_rejected() {
        let result = TimestampedSequence::from_pairs(vec![("a.jpg", i64::MIN), ("b.jpg", i64::MAX)]);
        assert_eq!(
            result.unwrap_err(),
            SequenceError::SpanOverflow { first: i64::MIN, last: i64::MAX }
        );

        // extreme values are fine while their distance fits
        let near = TimestampedSequence::from_pairs(vec![("a.jpg", i64::MAX - 10), ("b.jpg", i64::MAX)])
            .unwrap();
        assert_eq!(near.span(), 10);
        assert_eq!(near.gaps().collect::<Vec<_>>(), vec![10]);
    }

    #[test]
    fn test_gaps_between_neighbours() {
        let sequence =
            TimestampedSequence::from_pairs(vec![("a.jpg", 0), ("b.jpg", 5), ("c.jpg", 15)])
                .unwrap();
        assert_eq!(sequence.gaps().collect::<Vec<_>>(), vec![5, 10]);
    }
}
