use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, TimeZone};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, MediaError, Result, SequenceError};
use crate::sequence::types::{ImageRecord, TimestampedSequence};

/// Layout of EXIF date/time strings, e.g. `2023:07:14 18:02:55`
const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Supplies the capture time of an image
pub trait TimestampSource: Send + Sync {
    /// Capture time in seconds since the Unix epoch
    fn captured_at(&self, path: &Path) -> std::result::Result<i64, SequenceError>;
}

/// Reads `DateTimeOriginal` from EXIF, falling back to `DateTime`
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifTimestampSource;

impl ExifTimestampSource {
    fn missing(path: &Path, reason: impl Into<String>) -> SequenceError {
        SequenceError::MissingTimestamp {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    fn read_field(exif: &exif::Exif, tag: exif::Tag) -> Option<String> {
        let field = exif.get_field(tag, exif::In::PRIMARY)?;
        match field.value {
            exif::Value::Ascii(ref values) => values
                .first()
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }
}

impl TimestampSource for ExifTimestampSource {
    fn captured_at(&self, path: &Path) -> std::result::Result<i64, SequenceError> {
        let file = File::open(path).map_err(|e| Self::missing(path, e.to_string()))?;
        let mut reader = BufReader::new(file);
        let exif = exif::Reader::new()
            .read_from_container(&mut reader)
            .map_err(|e| Self::missing(path, e.to_string()))?;

        let raw = Self::read_field(&exif, exif::Tag::DateTimeOriginal)
            .or_else(|| Self::read_field(&exif, exif::Tag::DateTime))
            .ok_or_else(|| Self::missing(path, "no DateTimeOriginal or DateTime tag"))?;

        parse_exif_datetime(&raw)
            .ok_or_else(|| Self::missing(path, format!("unparseable date '{}'", raw)))
    }
}

/// Parse an EXIF date/time string as local time
///
/// Local times that do not exist (skipped by a DST change) are read as UTC.
pub fn parse_exif_datetime(raw: &str) -> Option<i64> {
    let cleaned = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    let naive = NaiveDateTime::parse_from_str(cleaned, EXIF_DATETIME_FORMAT).ok()?;

    let timestamp = match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.timestamp(),
        None => naive.and_utc().timestamp(),
    };
    Some(timestamp)
}

/// Discovers images in a folder and builds a [`TimestampedSequence`]
pub struct ImageLoader {
    source: Box<dyn TimestampSource>,
    threads: usize,
}

impl ImageLoader {
    /// Loader that reads EXIF capture times on `threads` worker threads
    pub fn new(threads: usize) -> Self {
        Self::with_source(Box::new(ExifTimestampSource), threads)
    }

    pub fn with_source(source: Box<dyn TimestampSource>, threads: usize) -> Self {
        Self {
            source,
            threads: threads.max(1),
        }
    }

    /// List supported image files in `directory`, sorted by file name
    ///
    /// This order is the discovery order used to break timestamp ties.
    pub fn discover<P: AsRef<Path>>(directory: P) -> Result<Vec<PathBuf>> {
        let directory = directory.as_ref();

        if !directory.is_dir() {
            return Err(MediaError::NoImagesFound {
                path: directory.display().to_string(),
            }
            .into());
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            if path.is_file() && !Self::is_hidden_file(&path) && Self::is_supported(&path) {
                paths.push(path);
            } else {
                debug!("Skipping {:?}", path);
            }
        }

        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }

    /// Discover images in `directory` and order them by capture time
    pub fn load_sequence<P: AsRef<Path>>(&self, directory: P) -> Result<TimestampedSequence> {
        let directory = directory.as_ref();
        let paths = Self::discover(directory)?;
        debug!("Discovered {} candidate images in {:?}", paths.len(), directory);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "threads".to_string(),
                value: format!("{} ({})", self.threads, e),
            })?;

        let source = self.source.as_ref();
        let stamped: Vec<_> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| (path, source.captured_at(path)))
                .collect()
        });

        let mut records = Vec::with_capacity(stamped.len());
        for (path, captured_at) in stamped {
            match captured_at {
                Ok(captured_at) => records.push(ImageRecord::new(path.clone(), captured_at)),
                Err(e) => warn!("Skipping image without capture time: {}", e),
            }
        }

        if records.is_empty() {
            return Err(MediaError::NoImagesFound {
                path: directory.display().to_string(),
            }
            .into());
        }

        let sequence = TimestampedSequence::new(records)?;
        info!("Found {} images spanning {}s", sequence.len(), sequence.span());
        Ok(sequence)
    }

    pub fn is_supported<P: AsRef<Path>>(path: P) -> bool {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) => matches!(
                ext.to_lowercase().as_str(),
                "jpg" | "jpeg" | "png" | "tif" | "tiff" | "webp"
            ),
            None => false,
        }
    }

    fn is_hidden_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
    }
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}
