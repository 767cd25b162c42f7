use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::constants::{DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DIMENSION};
use crate::error::ConfigError;

/// Settings for the compress policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressOptions {
    /// Neither output side exceeds this many pixels.
    pub max_dimension: u32,
    /// JPEG quality in (0, 1].
    pub quality: f32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// How an image is prepared before it is sent to storage.
///
/// Chosen once when the upload pipeline is built. Both variants are supported
/// in production; there is no implicit default beyond what configuration selects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreprocessPolicy {
    /// Decode, bound the longest side, re-encode as JPEG.
    Compress(CompressOptions),
    /// Send the original bytes and MIME type untouched.
    PassThrough,
}

impl PreprocessPolicy {
    pub fn compress() -> Self {
        PreprocessPolicy::Compress(CompressOptions::default())
    }

    pub fn is_compress(&self) -> bool {
        matches!(self, PreprocessPolicy::Compress(_))
    }
}

impl FromStr for PreprocessPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compress" => Ok(PreprocessPolicy::compress()),
            "passthrough" | "pass-through" | "pass_through" => Ok(PreprocessPolicy::PassThrough),
            other => Err(ConfigError::invalid(
                "UPLOAD_POLICY",
                format!("unknown policy '{}' (expected compress or passthrough)", other),
            )),
        }
    }
}

impl Display for PreprocessPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PreprocessPolicy::Compress(_) => write!(f, "compress"),
            PreprocessPolicy::PassThrough => write!(f, "passthrough"),
        }
    }
}
