//! Data passed between the caller, the preprocessor and storage.

use serde::Serialize;
use std::fmt;

/// Service-account identity used to sign token assertions.
#[derive(Clone)]
pub struct ServiceAccountCredential {
    pub issuer_email: String,
    pub private_key_pem: String,
}

impl ServiceAccountCredential {
    /// Build a credential from an env-style PEM where newlines are escaped as `\n`.
    pub fn from_escaped_pem(issuer_email: impl Into<String>, escaped_pem: &str) -> Self {
        Self {
            issuer_email: issuer_email.into(),
            private_key_pem: escaped_pem.replace("\\n", "\n"),
        }
    }
}

impl fmt::Debug for ServiceAccountCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountCredential")
            .field("issuer_email", &self.issuer_email)
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

/// Raw file handed over by the caller.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub declared_mime_type: String,
    pub original_file_name: String,
}

impl UploadRequest {
    pub fn new(
        bytes: Vec<u8>,
        declared_mime_type: impl Into<String>,
        original_file_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            declared_mime_type: declared_mime_type.into(),
            original_file_name: original_file_name.into(),
        }
    }
}

/// Bytes ready to be stored, with the MIME type and key extension to use.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessedAsset {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Extension without the leading dot.
    pub file_extension: String,
}

/// Outcome of a successful upload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UploadResult {
    pub public_url: String,
    pub object_name: String,
}
