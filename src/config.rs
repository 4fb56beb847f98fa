//! # Configuration Management
//!
//! Centralized configuration for the codec runtime.
//!
//! The reflection graph and the interpreter codecs are deliberately free of
//! hidden tunables; the few limits that exist (recursion depth, buffer
//! sizing) live here so hosts can adjust them per deployment.
//!
//! ## Configuration Sources
//! - TOML files via `from_toml_file()`
//! - TOML strings via `from_toml()`
//! - Environment variable overrides via `from_env()`
//! - Direct instantiation with defaults
//!
//! ## Security Considerations
//! - The recursion limit bounds stack growth when decoding deeply nested or
//!   hostile messages.
//! - Pool sizing bounds how much buffer memory idles between encodes.

use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Default maximum nesting depth while decoding.
pub const DEFAULT_MAX_RECURSION_DEPTH: u32 = 100;

/// Default operation-list capacity for a fresh `Writer`.
pub const DEFAULT_WRITER_CAPACITY: usize = 16;

/// Default number of buffers kept by a `BufferPool`.
pub const DEFAULT_POOL_SIZE: usize = 32;

/// Runtime limits and sizing knobs for the codec.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Maximum message nesting depth tolerated by the decoder.
    pub max_recursion_depth: u32,

    /// Initial operation-list capacity of writers created by the runtime.
    pub writer_capacity: usize,

    /// Number of reusable output buffers pre-allocated per pool.
    pub pool_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            writer_capacity: DEFAULT_WRITER_CAPACITY,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl CodecConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| CodecError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| CodecError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config = toml::from_str::<Self>(content)
            .map_err(|e| CodecError::ConfigError(format!("Failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables, starting from defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(depth) = std::env::var("PROTO_CODEC_MAX_RECURSION_DEPTH") {
            if let Ok(val) = depth.parse::<u32>() {
                config.max_recursion_depth = val;
            }
        }

        if let Ok(capacity) = std::env::var("PROTO_CODEC_WRITER_CAPACITY") {
            if let Ok(val) = capacity.parse::<usize>() {
                config.writer_capacity = val;
            }
        }

        if let Ok(size) = std::env::var("PROTO_CODEC_POOL_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.pool_size = val;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants that would otherwise surface as confusing runtime
    /// failures deep inside a decode.
    pub fn validate(&self) -> Result<()> {
        if self.max_recursion_depth == 0 {
            return Err(CodecError::ConfigError(
                "max_recursion_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
