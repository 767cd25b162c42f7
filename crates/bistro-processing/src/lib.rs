//! Bistro Image Processing Library
//!
//! This crate prepares restaurant images for publishing and runs the upload
//! pipeline: validate → preprocess → token → key → store → public URL.

pub mod image;
pub mod preprocess;
pub mod upload;
pub mod validator;

// Re-export commonly used types
pub use crate::image::{bounded_dimensions, DecodedImage, ImageCodec, NativeImageCodec};
pub use preprocess::{extension_for, AssetPreprocessor, PreprocessError};
pub use upload::{PublishError, UploadOrchestrator};
pub use validator::{RequestValidator, ValidationError};
