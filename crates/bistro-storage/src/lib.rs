//! Bistro Storage Library
//!
//! This crate talks to the object store: it turns a service-account key into
//! short-lived bearer tokens ([`auth`]), names new objects ([`keys`]) and
//! performs the authenticated media upload ([`gcs`]).
//!
//! # Object key format
//!
//! `{prefix}/{unix_millis}_{random_suffix}.{extension}`, e.g.
//! `restaurants/1718000000000_k3f9zq.jpg`. Key generation lives in [`keys`]
//! so every caller produces the same layout.

pub mod auth;
pub mod clock;
pub mod gcs;
pub mod keys;
pub mod traits;

// Re-export commonly used types
pub use auth::{AuthError, CachedToken, CredentialSigner, TokenCache, TokenSource};
pub use clock::{Clock, ManualClock, SystemClock};
pub use gcs::GcsStorage;
pub use keys::KeyGenerator;
pub use traits::{Storage, StorageResult, StoredObject, UploadError};
