//! Upload pipeline: validate → preprocess → token → key → store → public URL.

mod error;
mod pipeline;

pub use error::PublishError;
pub use pipeline::UploadOrchestrator;
