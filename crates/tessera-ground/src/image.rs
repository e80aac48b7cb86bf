//! Tile textures backed by the `image` crate.

use std::path::Path;

use image::{ColorType, DynamicImage, GenericImage, GenericImageView, Rgba};

/// Errors raised by [`Image`] construction and conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImageError {
    /// Only 8-bit grey, RGB and RGBA pixels are supported.
    #[error("unsupported pixel format {0:?}")]
    UnsupportedFormat(ColorType),

    /// A raw buffer does not match the requested dimensions.
    #[error("buffer holds {actual} bytes, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Encoding, decoding or file access failed.
    #[error("image codec error: {0}")]
    Codec(String),
}

impl From<image::ImageError> for ImageError {
    fn from(e: image::ImageError) -> Self {
        ImageError::Codec(e.to_string())
    }
}

/// Pixel layouts an [`Image`] can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Grey,
    Rgb,
    Rgba,
}

impl PixelFormat {
    #[must_use]
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Grey => 1,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

impl TryFrom<ColorType> for PixelFormat {
    type Error = ImageError;

    fn try_from(color: ColorType) -> Result<Self, Self::Error> {
        match color {
            ColorType::L8 => Ok(PixelFormat::Grey),
            ColorType::Rgb8 => Ok(PixelFormat::Rgb),
            ColorType::Rgba8 => Ok(PixelFormat::Rgba),
            other => Err(ImageError::UnsupportedFormat(other)),
        }
    }
}

/// A 2D pixel buffer with RGBA get/set regardless of its storage format.
///
/// Reads of formats without alpha report 255; writes to them drop alpha, and
/// writes to grey images store the luma of the colour.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    format: PixelFormat,
    buffer: DynamicImage,
}

impl Image {
    /// A zero-filled image.
    #[must_use]
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let buffer = match format {
            PixelFormat::Grey => DynamicImage::new_luma8(width, height),
            PixelFormat::Rgb => DynamicImage::new_rgb8(width, height),
            PixelFormat::Rgba => DynamicImage::new_rgba8(width, height),
        };
        Self { format, buffer }
    }

    /// An image filled with one colour.
    #[must_use]
    pub fn filled(width: u32, height: u32, format: PixelFormat, pixel: [u8; 4]) -> Self {
        let mut image = Self::new(width, height, format);
        image.fill(pixel);
        image
    }

    /// Wrap raw interleaved pixel bytes.
    ///
    /// # Errors
    ///
    /// [`ImageError::DimensionMismatch`] if `data` is not exactly
    /// `width * height * channels` bytes.
    pub fn from_raw(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, ImageError> {
        let expected = width as usize * height as usize * format.channels();
        let actual = data.len();
        if actual != expected {
            return Err(ImageError::DimensionMismatch { expected, actual });
        }
        let buffer = match format {
            PixelFormat::Grey => {
                image::GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
            }
            PixelFormat::Rgb => {
                image::RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
            }
            PixelFormat::Rgba => {
                image::RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8)
            }
        };
        buffer
            .map(|buffer| Self { format, buffer })
            .ok_or(ImageError::DimensionMismatch { expected, actual })
    }

    /// Adopt a decoded image.
    ///
    /// # Errors
    ///
    /// [`ImageError::UnsupportedFormat`] for anything but 8-bit grey, RGB or
    /// RGBA.
    pub fn from_dynamic(buffer: DynamicImage) -> Result<Self, ImageError> {
        let format = PixelFormat::try_from(buffer.color())?;
        Ok(Self { format, buffer })
    }

    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Pixel at `(x, y)` as RGBA.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the image.
    #[must_use]
    pub fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
        self.buffer.get_pixel(x, y).0
    }

    /// Overwrite the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the image.
    pub fn set_rgba(&mut self, x: u32, y: u32, pixel: [u8; 4]) {
        self.buffer.put_pixel(x, y, Rgba(pixel));
    }

    pub fn fill(&mut self, pixel: [u8; 4]) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                self.set_rgba(x, y, pixel);
            }
        }
    }

    /// A copy of this image in another pixel format.
    #[must_use]
    pub fn convert(&self, format: PixelFormat) -> Image {
        let buffer = match format {
            PixelFormat::Grey => DynamicImage::ImageLuma8(self.buffer.to_luma8()),
            PixelFormat::Rgb => DynamicImage::ImageRgb8(self.buffer.to_rgb8()),
            PixelFormat::Rgba => DynamicImage::ImageRgba8(self.buffer.to_rgba8()),
        };
        Image { format, buffer }
    }

    /// Decode a PNG or JPEG file.
    ///
    /// # Errors
    ///
    /// [`ImageError::Codec`] if the file cannot be read or decoded,
    /// [`ImageError::UnsupportedFormat`] for pixel formats other than 8-bit
    /// grey, RGB or RGBA.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        Self::from_dynamic(image::open(path)?)
    }

    /// Encode to a file, the format following the extension.
    ///
    /// # Errors
    ///
    /// [`ImageError::Codec`] if encoding or writing fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        self.buffer.save(path)?;
        Ok(())
    }
}

/// Quantise a channel value in `[0, 1]` to a byte, saturating outside.
#[must_use]
pub fn from_float(value: f64) -> u8 {
    if value >= 1.0 {
        255
    } else if value <= 0.0 {
        0
    } else {
        (value * 255.0).round() as u8
    }
}

/// Byte channel value as `[0, 1]`.
#[must_use]
pub fn to_float(value: u8) -> f64 {
    f64::from(value) / 255.0
}
