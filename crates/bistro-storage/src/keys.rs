//! Object key generation.
//!
//! Key format: `{prefix}/{unix_millis}_{suffix}.{extension}`. Uniqueness is best effort:
//! a millisecond timestamp plus a random suffix, with no collision check against the store.

use bistro_core::constants::{BASE36_ALPHABET, DEFAULT_KEY_PREFIX, DEFAULT_KEY_SUFFIX_LENGTH};
use bistro_core::{ConfigError, UploadConfig};
use rand::Rng;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};

/// Builds object keys under a fixed prefix.
#[derive(Clone)]
pub struct KeyGenerator {
    prefix: String,
    alphabet: Vec<char>,
    suffix_length: usize,
    clock: Arc<dyn Clock>,
}

impl KeyGenerator {
    pub fn new(
        prefix: impl Into<String>,
        alphabet: &str,
        suffix_length: usize,
    ) -> Result<Self, ConfigError> {
        let alphabet: Vec<char> = alphabet.chars().collect();
        if alphabet.is_empty() {
            return Err(ConfigError::invalid("UPLOAD_KEY_ALPHABET", "must not be empty"));
        }
        if suffix_length == 0 {
            return Err(ConfigError::invalid(
                "UPLOAD_KEY_SUFFIX_LENGTH",
                "must be at least 1",
            ));
        }

        Ok(Self {
            prefix: prefix.into().trim_matches('/').to_string(),
            alphabet,
            suffix_length,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn from_config(config: &UploadConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.key_prefix(),
            &config.key_alphabet,
            config.key_suffix_length,
        )
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of distinct suffixes this generator can produce.
    pub fn suffix_space(&self) -> f64 {
        (self.alphabet.len() as f64).powi(self.suffix_length as i32)
    }

    /// Generate a key for an object with the given extension (with or without a leading dot).
    pub fn generate(&self, extension: &str) -> String {
        let extension = extension.trim_start_matches('.');
        let millis = self.clock.now_epoch_millis();
        let suffix = self.random_suffix();

        let file_name = if extension.is_empty() {
            format!("{}_{}", millis, suffix)
        } else {
            format!("{}_{}.{}", millis, suffix, extension)
        };

        if self.prefix.is_empty() {
            file_name
        } else {
            format!("{}/{}", self.prefix, file_name)
        }
    }

    fn random_suffix(&self) -> String {
        let mut rng = rand::rng();
        (0..self.suffix_length)
            .map(|_| self.alphabet[rng.random_range(0..self.alphabet.len())])
            .collect()
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            alphabet: BASE36_ALPHABET.chars().collect(),
            suffix_length: DEFAULT_KEY_SUFFIX_LENGTH,
            clock: Arc::new(SystemClock),
        }
    }
}
