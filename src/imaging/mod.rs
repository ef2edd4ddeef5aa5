//! Decoding uploaded or fetched image bytes into a bounded bitmap.

use std::path::{Path, PathBuf};

use image::{imageops, RgbaImage};
use thiserror::Error;

pub const DEFAULT_MAX_DIMENSION: u32 = 1600;

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to load image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Failed to load image: image has no pixels")]
    Empty,
}

pub type ImageLoadResult<T> = std::result::Result<T, ImageLoadError>;

/// A decoded bitmap, already reduced so its longer side fits the max dimension.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    bitmap: RgbaImage,
    natural_width: u32,
    natural_height: u32,
}

impl LoadedImage {
    pub fn from_rgba(bitmap: RgbaImage, max_dimension: u32) -> ImageLoadResult<Self> {
        let (natural_width, natural_height) = bitmap.dimensions();
        if natural_width == 0 || natural_height == 0 {
            return Err(ImageLoadError::Empty);
        }

        let (width, height) = fit_within(natural_width, natural_height, max_dimension);
        let bitmap = if (width, height) == (natural_width, natural_height) {
            bitmap
        } else {
            tracing::debug!(
                natural_width,
                natural_height,
                width,
                height,
                "downscaling image"
            );
            imageops::resize(&bitmap, width, height, imageops::FilterType::Triangle)
        };

        Ok(Self {
            bitmap,
            natural_width,
            natural_height,
        })
    }

    pub fn bitmap(&self) -> &RgbaImage {
        &self.bitmap
    }

    pub fn natural_size(&self) -> (u32, u32) {
        (self.natural_width, self.natural_height)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.bitmap.dimensions()
    }
}

pub fn decode_bytes(bytes: &[u8], max_dimension: u32) -> ImageLoadResult<LoadedImage> {
    let decoded = image::load_from_memory(bytes)?;
    LoadedImage::from_rgba(decoded.to_rgba8(), max_dimension)
}

pub fn load_file(path: &Path, max_dimension: u32) -> ImageLoadResult<LoadedImage> {
    let bytes = std::fs::read(path).map_err(|source| ImageLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let image = decode_bytes(&bytes, max_dimension)?;
    tracing::info!(path = %path.display(), size = ?image.dimensions(), "loaded image file");
    Ok(image)
}

/// Scales down (never up) so the longer side is at most `max_dimension`.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let longest = f64::from(width.max(height));
    let scale = (f64::from(max_dimension.max(1)) / longest).min(1.0);
    let scaled = |value: u32| ((f64::from(value) * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageEncoder, Rgba};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bitmap = RgbaImage::new(width, height);
        for pixel in bitmap.pixels_mut() {
            *pixel = Rgba([200, 40, 40, 255]);
        }
        let mut out = Vec::new();
        image::codecs::png::PngEncoder::new(&mut out)
            .write_image(
                bitmap.as_raw(),
                width,
                height,
                image::ExtendedColorType::Rgba8,
            )
            .expect("encode test png");
        out
    }

    #[test]
    fn fit_within_only_scales_down() {
        assert_eq!(fit_within(3200, 1000, 1600), (1600, 500));
        assert_eq!(fit_within(1000, 3200, 1600), (500, 1600));
        assert_eq!(fit_within(640, 480, 1600), (640, 480));
        assert_eq!(fit_within(5000, 1, 1600), (1600, 1));
    }

    #[test]
    fn decode_bytes_downscales_large_images() {
        let image = decode_bytes(&png_bytes(40, 20), 10).expect("png should decode");
        assert_eq!(image.natural_size(), (40, 20));
        assert_eq!(image.dimensions(), (10, 5));
    }

    #[test]
    fn decode_bytes_rejects_garbage() {
        let err = decode_bytes(b"definitely not an image", 1600).expect_err("garbage input");
        assert!(matches!(err, ImageLoadError::Decode(_)));
        assert!(err.to_string().starts_with("Failed to load image"));
    }

    #[test]
    fn load_file_reports_missing_path() {
        let path = std::env::temp_dir().join("memegen-missing-upload.png");
        let _ = std::fs::remove_file(&path);
        let err = load_file(&path, 1600).expect_err("missing file");
        assert!(matches!(err, ImageLoadError::Read { .. }));
    }
}
