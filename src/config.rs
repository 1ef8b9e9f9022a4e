//! Configuration for the frame codec.

use crate::error::{H3Error, H3Result};
use serde::{Deserialize, Serialize};

/// Limits applied by the frame decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest payload buffered for a frame that is parsed as a whole.
    ///
    /// Known frames over this limit are `H3_EXCESSIVE_LOAD`. Unknown frames
    /// over it are discarded without being buffered and are never delivered
    /// to the caller; they only show up in `DecoderStats::frames_skipped`.
    pub max_frame_payload: u64,

    /// DATA frames up to this length are delivered whole; longer ones are
    /// forwarded in pieces as their bytes arrive.
    pub data_chunk_threshold: usize,

    /// Largest decoded field section accepted in HEADERS / PUSH_PROMISE
    pub max_field_section_size: u64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_frame_payload: 65536,
            data_chunk_threshold: 16384,
            max_field_section_size: u64::MAX,
        }
    }
}

impl CodecConfig {
    /// Create a new codec configuration builder
    pub fn builder() -> CodecConfigBuilder {
        CodecConfigBuilder::default()
    }

    /// Check that the limits are usable.
    pub fn validate(&self) -> H3Result<()> {
        if self.max_frame_payload == 0 {
            return Err(H3Error::config("max_frame_payload must be non-zero"));
        }
        if self.max_field_section_size == 0 {
            return Err(H3Error::config("max_field_section_size must be non-zero"));
        }
        Ok(())
    }
}

/// Builder for codec configuration.
#[derive(Debug, Default)]
pub struct CodecConfigBuilder {
    config: CodecConfig,
}

impl CodecConfigBuilder {
    /// Set maximum buffered frame payload
    pub fn max_frame_payload(mut self, size: u64) -> Self {
        self.config.max_frame_payload = size;
        self
    }

    /// Set the DATA streaming threshold
    pub fn data_chunk_threshold(mut self, size: usize) -> Self {
        self.config.data_chunk_threshold = size;
        self
    }

    /// Set maximum field section size
    pub fn max_field_section_size(mut self, size: u64) -> Self {
        self.config.max_field_section_size = size;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> H3Result<CodecConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
