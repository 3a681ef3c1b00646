//! Runtime configuration.

use serde::{Deserialize, Serialize};

use crate::codec::{StringCodec, StringDecoding};
use crate::error::{HidError, HidResult};

/// Wide-character capacity of the buffer used for live string queries.
pub const DEFAULT_STRING_BUFFER_LEN: usize = 256;

/// Message used when the native layer reports a failure without a reason.
pub const GENERIC_ERROR_MESSAGE: &str = "HID communication problem";

/// Path given to descriptors whose native record carried no path.
pub const MISSING_PATH_SENTINEL: &str = "?";

/// Configuration for a [`HidContext`](crate::context::HidContext) and the
/// sessions it opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HidConfig {
    /// How native wide strings are decoded.
    pub string_decoding: StringDecoding,
    /// Capacity (in wide characters, terminator included) of the buffer used
    /// by session string queries.
    pub string_buffer_len: usize,
    /// Substituted when the native layer has no error string.
    pub fallback_error_message: String,
    /// Path assigned to descriptors without a native path.
    pub missing_path: String,
}

impl Default for HidConfig {
    fn default() -> Self {
        Self {
            string_decoding: StringDecoding::default(),
            string_buffer_len: DEFAULT_STRING_BUFFER_LEN,
            fallback_error_message: GENERIC_ERROR_MESSAGE.to_string(),
            missing_path: MISSING_PATH_SENTINEL.to_string(),
        }
    }
}

impl HidConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HidError::InvalidConfiguration`] if any value is unusable.
    pub fn validate(&self) -> HidResult<()> {
        if self.string_buffer_len < 2 {
            return Err(HidError::invalid_configuration(
                "string_buffer_len must leave room for at least one character and a terminator",
            ));
        }
        if self.fallback_error_message.is_empty() {
            return Err(HidError::invalid_configuration(
                "fallback_error_message must not be empty",
            ));
        }
        if self.missing_path.is_empty() {
            return Err(HidError::invalid_configuration(
                "missing_path must not be empty",
            ));
        }
        Ok(())
    }

    /// Codec matching `string_decoding`.
    #[must_use]
    pub fn codec(&self) -> StringCodec {
        StringCodec::new(self.string_decoding)
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> HidConfigBuilder {
        HidConfigBuilder::default()
    }
}

/// Builder for [`HidConfig`].
#[derive(Debug, Default)]
pub struct HidConfigBuilder {
    config: HidConfig,
}

impl HidConfigBuilder {
    /// Set the wide-string decoding mode.
    #[must_use]
    pub fn string_decoding(mut self, decoding: StringDecoding) -> Self {
        self.config.string_decoding = decoding;
        self
    }

    /// Set the string query buffer capacity.
    #[must_use]
    pub fn string_buffer_len(mut self, len: usize) -> Self {
        self.config.string_buffer_len = len;
        self
    }

    /// Set the generic error message.
    #[must_use]
    pub fn fallback_error_message(mut self, message: impl Into<String>) -> Self {
        self.config.fallback_error_message = message.into();
        self
    }

    /// Set the missing-path sentinel.
    #[must_use]
    pub fn missing_path(mut self, sentinel: impl Into<String>) -> Self {
        self.config.missing_path = sentinel.into();
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> HidResult<HidConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
