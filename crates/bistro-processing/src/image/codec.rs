//! Image codec capability
//!
//! The preprocessor only needs three primitives: decode to RGBA pixels, resize, and
//! encode JPEG. They sit behind [`ImageCodec`] so another backend can be swapped in;
//! [`NativeImageCodec`] implements them with the `image` crate.

use crate::preprocess::PreprocessError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageBuffer, ImageDecoder, ImageReader, RgbImage, Rgba};
use std::io::Cursor;

/// Decoded image as tightly packed RGBA8 pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels_len", &self.pixels.len())
            .finish()
    }
}

pub trait ImageCodec: Send + Sync {
    fn decode(&self, data: &[u8]) -> Result<DecodedImage, PreprocessError>;

    fn resize(
        &self,
        image: &DecodedImage,
        width: u32,
        height: u32,
    ) -> Result<DecodedImage, PreprocessError>;

    /// Encode as baseline JPEG; `quality` is in (0, 1].
    fn encode_jpeg(&self, image: &DecodedImage, quality: f32) -> Result<Vec<u8>, PreprocessError>;
}

/// [`ImageCodec`] backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeImageCodec;

impl NativeImageCodec {
    fn view(image: &DecodedImage) -> Result<ImageBuffer<Rgba<u8>, &[u8]>, PreprocessError> {
        ImageBuffer::from_raw(image.width, image.height, image.pixels.as_slice()).ok_or_else(|| {
            PreprocessError::ImageEncode(format!(
                "pixel buffer of {} bytes does not match {}x{}",
                image.pixels.len(),
                image.width,
                image.height
            ))
        })
    }
}

impl ImageCodec for NativeImageCodec {
    /// Decodes and applies the EXIF orientation, so width and height are as displayed.
    fn decode(&self, data: &[u8]) -> Result<DecodedImage, PreprocessError> {
        let mut decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| PreprocessError::ImageDecode(e.to_string()))?
            .into_decoder()
            .map_err(|e| PreprocessError::ImageDecode(e.to_string()))?;

        // Unreadable metadata is treated as upright.
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

        let mut img = DynamicImage::from_decoder(decoder)
            .map_err(|e| PreprocessError::ImageDecode(e.to_string()))?;
        if orientation != Orientation::NoTransforms {
            tracing::debug!(orientation = ?orientation, "Applying EXIF orientation");
            img.apply_orientation(orientation);
        }

        let rgba = img.to_rgba8();
        Ok(DecodedImage {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        })
    }

    fn resize(
        &self,
        image: &DecodedImage,
        width: u32,
        height: u32,
    ) -> Result<DecodedImage, PreprocessError> {
        if image.width == width && image.height == height {
            return Ok(image.clone());
        }

        // Bilinear, the same smoothing a canvas applies when drawing scaled images.
        let source = Self::view(image)?;
        let resized = image::imageops::resize(&source, width, height, FilterType::Triangle);
        Ok(DecodedImage {
            width,
            height,
            pixels: resized.into_raw(),
        })
    }

    fn encode_jpeg(&self, image: &DecodedImage, quality: f32) -> Result<Vec<u8>, PreprocessError> {
        Self::view(image)?;
        // JPEG has no alpha channel.
        let rgb_pixels: Vec<u8> = image
            .pixels
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        let rgb = RgbImage::from_raw(image.width, image.height, rgb_pixels).ok_or_else(|| {
            PreprocessError::ImageEncode("failed to build RGB buffer".to_string())
        })?;

        let quality = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
        let mut buf = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|e| PreprocessError::ImageEncode(format!("JPEG encode failed: {e}")))?;

        Ok(buf.into_inner())
    }
}
