//! Error types for the fallible edges (config files, WAV export)
//!
//! Synthesis itself never fails: degenerate input is clamped.

use thiserror::Error;

/// Result type for audio operations
pub type Result<T> = std::result::Result<T, AudioError>;

/// Errors raised outside the per-sample path
#[derive(Debug, Error)]
pub enum AudioError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings or config JSON could not be parsed or produced
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WAV encoding failed
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// A tuning value is outside its usable range
    #[error("invalid config '{field}': {message}")]
    InvalidConfig {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },
}

impl AudioError {
    /// Creates an invalid config error
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_message() {
        let err = AudioError::invalid("bpm", "must be positive");
        let text = err.to_string();
        assert!(text.contains("bpm"));
        assert!(text.contains("must be positive"));
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("nope");
        let err: AudioError = parse.unwrap_err().into();
        assert!(matches!(err, AudioError::Json(_)));
    }
}
