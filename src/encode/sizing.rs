use tracing::debug;

use crate::error::SizingError;

/// Reconciles binary size units with the decimal bit rates encoders expect
///
/// Equal to 1024^3 / 1000^3. Changing it changes the size of every output.
pub const SIZE_CORRECTION: f64 = 1.073741824;

/// Bit rate shared by both passes of a two-pass encode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionTarget {
    bitrate: f64,
}

impl CompressionTarget {
    /// Target bit rate in bits per second
    pub fn bits_per_second(&self) -> f64 {
        self.bitrate
    }

    /// Value for ffmpeg's `-b:v`, in whole bits per second
    pub fn ffmpeg_bitrate(&self) -> String {
        format!("{}", self.bitrate.round() as u64)
    }
}

/// Derives an encoder bit rate from a desired file size
pub struct BitrateSizer;

impl BitrateSizer {
    /// Bit rate that makes `duration_seconds` of video weigh about `target_size_kb`
    ///
    /// `bitrate = target_size_kb * 1024 * 8 / (1.073741824 * duration_seconds)`
    pub fn compute(
        target_size_kb: f64,
        duration_seconds: f64,
    ) -> Result<CompressionTarget, SizingError> {
        if !target_size_kb.is_finite() || target_size_kb <= 0.0 {
            return Err(SizingError::InvalidConfig {
                key: "target_size_kb".to_string(),
                value: target_size_kb.to_string(),
            });
        }

        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(SizingError::InvalidConfig {
                key: "duration_seconds".to_string(),
                value: duration_seconds.to_string(),
            });
        }

        let bitrate = target_size_kb * 1024.0 * 8.0 / (SIZE_CORRECTION * duration_seconds);
        debug!(
            "Sizing {:.0} KB over {:.3}s -> {:.0} bit/s",
            target_size_kb, duration_seconds, bitrate
        );

        Ok(CompressionTarget { bitrate })
    }

    /// Convert a size in MB to the KB figure [`BitrateSizer::compute`] takes
    pub fn target_size_kb_from_mb(size_mb: u32) -> f64 {
        f64::from(size_mb) * 1000.0
    }
}
