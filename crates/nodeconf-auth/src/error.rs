//! Key material error types.

/// Error decoding or validating key material.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// Input is not valid base64 (standard or URL-safe).
    #[error("invalid key encoding: {0}")]
    Encoding(String),

    /// Decoded key has the wrong length.
    #[error("invalid key length: {got} (expected {expected})")]
    Length { expected: usize, got: usize },
}

impl KeyError {
    /// Create an encoding error from any error type.
    #[inline]
    pub fn encoding<E: std::fmt::Display>(err: E) -> Self {
        Self::Encoding(err.to_string())
    }
}
