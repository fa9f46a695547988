// Typed errors with thiserror. Surface meaningful messages to JS.
// Nothing here is fatal to a running show: callers log and carry on.

use thiserror::Error;

/// Slideshow error types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlideshowError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Slideshow already started")]
    AlreadyStarted,

    #[error("Slideshow has been torn down")]
    TornDown,

    #[error("Unknown slide id {0}")]
    UnknownSlide(u32),

    #[error("Audio playback failed: {0}")]
    AudioPlayback(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SlideshowError {
    fn from(err: serde_json::Error) -> Self {
        SlideshowError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SlideshowError::InvalidConfig("missing field".to_string());
        assert!(err.to_string().contains("missing field"));
        assert_eq!(SlideshowError::UnknownSlide(9).to_string(), "Unknown slide id 9");
    }

    #[test]
    fn serde_errors_convert() {
        let err: SlideshowError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, SlideshowError::Serialization(_)));
    }
}
