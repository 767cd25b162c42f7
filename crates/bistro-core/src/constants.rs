//! Fixed protocol values and configuration defaults.

/// OAuth token endpoint used for the JWT bearer grant.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Object storage JSON API base.
pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";

/// Base for public object URLs: `{base}/{bucket}/{object}`.
pub const DEFAULT_PUBLIC_BASE_URL: &str = "https://storage.googleapis.com";

/// OAuth scope requested for uploads.
pub const STORAGE_READ_WRITE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";

pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for a signed assertion, in seconds.
pub const ASSERTION_LIFETIME_SECS: u64 = 3600;

/// A cached token is reused only while it has at least this many seconds left.
pub const TOKEN_REFRESH_MARGIN_SECS: u64 = 60;

pub const DEFAULT_KEY_PREFIX: &str = "restaurants";
pub const DEFAULT_KEY_SUFFIX_LENGTH: usize = 6;
pub const BASE36_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

/// Longest side allowed after compression, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 1920;

/// JPEG quality in (0, 1].
pub const DEFAULT_JPEG_QUALITY: f32 = 0.85;

pub const DEFAULT_MAX_FILE_SIZE_MB: usize = 20;
