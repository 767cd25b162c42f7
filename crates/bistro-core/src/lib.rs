//! Bistro Core Library
//!
//! This crate provides the configuration, shared models and constants used by
//! the image publishing crates (`bistro-storage`, `bistro-processing`) and the CLI.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod policy;

// Re-export commonly used types
pub use config::UploadConfig;
pub use error::ConfigError;
pub use models::{ProcessedAsset, ServiceAccountCredential, UploadRequest, UploadResult};
pub use policy::{CompressOptions, PreprocessPolicy};
