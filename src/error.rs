// Engine error module
// Construction-time and contract errors raised by the animation core

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The asset set did not contain exactly four frames
    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    /// A configuration value is outside its documented range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Destination buffer length does not match width * height * 4
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Scaled frames were requested before the target size was known
    #[error("frames have not been scaled yet; call set_target_dimensions first")]
    FramesNotScaled,
}

impl EngineError {
    pub fn invalid_asset(msg: impl Into<String>) -> Self {
        Self::InvalidAsset(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(EngineError::invalid_asset("x")
            .to_string()
            .starts_with("invalid asset:"));
        assert!(EngineError::invalid_config("x")
            .to_string()
            .starts_with("invalid configuration:"));
        let mismatch = EngineError::BufferSizeMismatch {
            expected: 16,
            actual: 12,
        };
        assert_eq!(
            mismatch.to_string(),
            "buffer size mismatch: expected 16 bytes, got 12"
        );
    }
}
