use std::path::Path;

use image::imageops::FilterType;
use image::RgbaImage;

use crate::error::{MediaError, Result};

/// Largest dimension a GIF logical screen can have
const GIF_MAX_DIMENSION: u32 = u16::MAX as u32;

/// A decoded still image, ready to be written as one output frame
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbaImage,
}

impl Frame {
    pub fn new(buffer: RgbaImage) -> Self {
        Self { buffer }
    }

    /// Decode an image file into RGBA
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| MediaError::ImageLoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self::new(image.to_rgba8()))
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Resize to exactly `size` unless the frame already matches it
    pub fn fit_to(self, size: (u32, u32)) -> Self {
        if (self.width(), self.height()) == size {
            return self;
        }

        let resized = image::imageops::resize(&self.buffer, size.0, size.1, FilterType::Lanczos3);
        Self::new(resized)
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.buffer.into_raw()
    }
}

/// Dimensions of an image file, read from its header only
pub fn image_dimensions<P: AsRef<Path>>(path: P) -> Result<(u32, u32)> {
    let path = path.as_ref();
    image::image_dimensions(path).map_err(|e| {
        MediaError::ImageLoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Scale `source` down to at most `max_width` wide, keeping aspect ratio
pub fn canvas_size(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (width, height) = source;
    let limit = max_width.min(GIF_MAX_DIMENSION).max(1);

    let (width, height) = if width > limit {
        let scaled = (height as f64 * limit as f64 / width as f64).round() as u32;
        (limit, scaled)
    } else {
        (width, height)
    };

    (width.max(1), height.clamp(1, GIF_MAX_DIMENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    #[test]
    fn test_canvas_size() {
        assert_eq!(canvas_size((4000, 3000), 1280), (1280, 960));
        assert_eq!(canvas_size((640, 480), 1280), (640, 480));
        assert_eq!(canvas_size((1000, 1), 10), (10, 1));
    }

    #[test]
    fn test_fit_to_resizes_only_when_needed() {
        let frame = Frame::new(RgbaImage::from_pixel(8, 6, Rgba([10, 20, 30, 255])));
        let same = frame.clone().fit_to((8, 6));
        assert_eq!((same.width(), same.height()), (8, 6));

        let smaller = frame.fit_to((4, 3));
        assert_eq!((smaller.width(), smaller.height()), (4, 3));
        assert_eq!(smaller.into_raw().len(), 4 * 3 * 4);
    }

    #[test]
    fn test_open_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        RgbaImage::from_pixel(3, 2, Rgba([255, 0, 0, 255])).save(&path).unwrap();

        let frame = Frame::open(&path).unwrap();
        assert_eq!((frame.width(), frame.height()), (3, 2));
        assert_eq!(image_dimensions(&path).unwrap(), (3, 2));
    }

    #[test]
    fn test_open_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"nope").unwrap();
        assert!(Frame::open(&path).is_err());
    }
}
