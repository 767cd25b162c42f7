//! Asset preprocessing
//!
//! Turns an [`UploadRequest`] into the [`ProcessedAsset`] that is actually stored,
//! according to the configured [`PreprocessPolicy`]:
//!
//! - `Compress`: decode, bound the longest side, re-encode as JPEG (`.jpg`)
//! - `PassThrough`: original bytes and MIME type, extension from the file name

use bistro_core::{CompressOptions, PreprocessPolicy, ProcessedAsset, UploadRequest};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::image::{bounded_dimensions, ImageCodec, NativeImageCodec};

/// Image preprocessing errors
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Failed to encode image: {0}")]
    ImageEncode(String),

    #[error("Invalid compress options: {0}")]
    InvalidOptions(String),

    #[error("Image task failed: {0}")]
    Task(String),
}

pub struct AssetPreprocessor {
    codec: Arc<dyn ImageCodec>,
}

impl Default for AssetPreprocessor {
    fn default() -> Self {
        Self::new(Arc::new(NativeImageCodec))
    }
}

impl AssetPreprocessor {
    pub fn new(codec: Arc<dyn ImageCodec>) -> Self {
        Self { codec }
    }

    /// Produce the asset to store. The request is only read.
    pub fn process(
        &self,
        request: &UploadRequest,
        policy: &PreprocessPolicy,
    ) -> Result<ProcessedAsset, PreprocessError> {
        match policy {
            PreprocessPolicy::Compress(options) => self.compress(&request.bytes, options),
            PreprocessPolicy::PassThrough => Ok(ProcessedAsset {
                bytes: request.bytes.clone(),
                mime_type: request.declared_mime_type.clone(),
                file_extension: extension_for(
                    &request.original_file_name,
                    &request.declared_mime_type,
                ),
            }),
        }
    }

    fn compress(
        &self,
        data: &[u8],
        options: &CompressOptions,
    ) -> Result<ProcessedAsset, PreprocessError> {
        validate_options(options)?;

        let decoded = self.codec.decode(data)?;
        let (width, height) =
            bounded_dimensions(decoded.width, decoded.height, options.max_dimension);

        tracing::debug!(
            source_width = decoded.width,
            source_height = decoded.height,
            target_width = width,
            target_height = height,
            quality = options.quality,
            "Compressing image to JPEG"
        );

        let resized = self.codec.resize(&decoded, width, height)?;
        let bytes = self.codec.encode_jpeg(&resized, options.quality)?;

        Ok(ProcessedAsset {
            bytes,
            mime_type: "image/jpeg".to_string(),
            file_extension: "jpg".to_string(),
        })
    }
}

fn validate_options(options: &CompressOptions) -> Result<(), PreprocessError> {
    if options.max_dimension == 0 {
        return Err(PreprocessError::InvalidOptions(
            "max_dimension must be at least 1".to_string(),
        ));
    }
    if !(options.quality > 0.0 && options.quality <= 1.0) {
        return Err(PreprocessError::InvalidOptions(format!(
            "quality must be in (0, 1], got {}",
            options.quality
        )));
    }
    Ok(())
}

/// Object extension for a pass-through upload.
///
/// Taken from the original file name (lowercased); falls back to the MIME type,
/// then to `bin`.
pub fn extension_for(original_file_name: &str, mime_type: &str) -> String {
    if let Some(ext) = Path::new(original_file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
    {
        return ext.to_lowercase();
    }

    match mime_type.to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/avif" => "avif",
        _ => "bin",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::DecodedImage;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::Mutex;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 120, 200]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    /// Records the sizes it was asked for without touching pixels.
    #[derive(Default)]
    struct RecordingCodec {
        source: (u32, u32),
        resized_to: Mutex<Option<(u32, u32)>>,
        quality: Mutex<Option<f32>>,
    }

    impl ImageCodec for RecordingCodec {
        fn decode(&self, _data: &[u8]) -> Result<DecodedImage, PreprocessError> {
            Ok(DecodedImage {
                width: self.source.0,
                height: self.source.1,
                pixels: Vec::new(),
            })
        }

        fn resize(
            &self,
            _image: &DecodedImage,
            width: u32,
            height: u32,
        ) -> Result<DecodedImage, PreprocessError> {
            *self.resized_to.lock().unwrap() = Some((width, height));
            Ok(DecodedImage {
                width,
                height,
                pixels: Vec::new(),
            })
        }

        fn encode_jpeg(
            &self,
            _image: &DecodedImage,
            quality: f32,
        ) -> Result<Vec<u8>, PreprocessError> {
            *self.quality.lock().unwrap() = Some(quality);
            Ok(vec![0xFF, 0xD8, 0xFF, 0xD9])
        }
    }

    #[test]
    fn test_compress_uses_codec_with_bounded_size() {
        let codec = Arc::new(RecordingCodec {
            source: (5000, 2500),
            ..Default::default()
        });
        let preprocessor = AssetPreprocessor::new(codec.clone());
        let request = UploadRequest::new(vec![1, 2, 3], "image/webp", "terrace.webp");

        let asset = preprocessor
            .process(&request, &PreprocessPolicy::compress())
            .unwrap();

        assert_eq!(*codec.resized_to.lock().unwrap(), Some((1920, 960)));
        assert_eq!(*codec.quality.lock().unwrap(), Some(0.85));
        assert_eq!(asset.mime_type, "image/jpeg");
        assert_eq!(asset.file_extension, "jpg");
        assert_eq!(asset.bytes, vec![0xFF, 0xD8, 0xFF, 0xD9]);
        // Caller data untouched.
        assert_eq!(request.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_compress_png_to_jpeg() {
        let preprocessor = AssetPreprocessor::default();
        let request = UploadRequest::new(png_bytes(80, 60), "image/png", "menu.png");

        let asset = preprocessor
            .process(&request, &PreprocessPolicy::compress())
            .unwrap();

        assert_eq!(asset.mime_type, "image/jpeg");
        assert_eq!(asset.file_extension, "jpg");
        let decoded = image::load_from_memory_with_format(&asset.bytes, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (80, 60));
    }

    #[test]
    fn test_compress_bounds_rotated_photo() {
        use crate::image::codec::tests::{jpeg_bytes, tag_orientation};

        let preprocessor = AssetPreprocessor::default();
        let portrait = tag_orientation(&jpeg_bytes(80, 40), 6);
        let request = UploadRequest::new(portrait, "image/jpeg", "phone.jpg");
        let policy = PreprocessPolicy::Compress(CompressOptions {
            max_dimension: 20,
            quality: 0.85,
        });

        let asset = preprocessor.process(&request, &policy).unwrap();

        let decoded = image::load_from_memory_with_format(&asset.bytes, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 20));
    }

    #[test]
    fn test_compress_rejects_undecodable_bytes() {
        let preprocessor = AssetPreprocessor::default();
        let request = UploadRequest::new(b"definitely not pixels".to_vec(), "image/png", "x.png");

        let err = preprocessor
            .process(&request, &PreprocessPolicy::compress())
            .unwrap_err();
        assert!(matches!(err, PreprocessError::ImageDecode(_)), "got {err:?}");
    }

    #[test]
    fn test_compress_rejects_invalid_options() {
        let preprocessor = AssetPreprocessor::default();
        let request = UploadRequest::new(png_bytes(4, 4), "image/png", "x.png");

        for options in [
            CompressOptions { max_dimension: 0, quality: 0.85 },
            CompressOptions { max_dimension: 1920, quality: 0.0 },
            CompressOptions { max_dimension: 1920, quality: 1.5 },
        ] {
            let err = preprocessor
                .process(&request, &PreprocessPolicy::Compress(options))
                .unwrap_err();
            assert!(matches!(err, PreprocessError::InvalidOptions(_)), "got {err:?}");
        }
    }

    #[test]
    fn test_passthrough_keeps_bytes_and_mime() {
        let preprocessor = AssetPreprocessor::default();
        let request = UploadRequest::new(b"GIF89a...".to_vec(), "image/gif", "Storefront.GIF");

        let asset = preprocessor
            .process(&request, &PreprocessPolicy::PassThrough)
            .unwrap();

        assert_eq!(asset.bytes, request.bytes);
        assert_eq!(asset.mime_type, "image/gif");
        assert_eq!(asset.file_extension, "gif");
    }

    #[test]
    fn test_passthrough_does_not_decode() {
        let preprocessor = AssetPreprocessor::default();
        let request = UploadRequest::new(b"opaque".to_vec(), "image/heic", "photo.heic");

        let asset = preprocessor
            .process(&request, &PreprocessPolicy::PassThrough)
            .unwrap();
        assert_eq!(asset.file_extension, "heic");
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("dish.JPEG", "image/jpeg"), "jpeg");
        assert_eq!(extension_for("archive.tar.png", "image/png"), "png");
        assert_eq!(extension_for("no_extension", "image/png"), "png");
        assert_eq!(extension_for("no_extension", "image/jpeg"), "jpg");
        assert_eq!(extension_for("", "image/webp"), "webp");
        assert_eq!(extension_for("trailing.", "application/octet-stream"), "bin");
    }
}
