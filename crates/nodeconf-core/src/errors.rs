//! Error category constants for logging.
//!
//! These constants provide consistent error classification across all crates.

/// Value object failed construction-time validation.
pub const ERROR_VALIDATION: &str = "validation";
/// A tag or SID reference could not be resolved.
pub const ERROR_REFERENCE: &str = "reference";
/// Credential derivation produced nothing for the given input.
pub const ERROR_DERIVATION: &str = "derivation";
/// Configuration (manifest) error.
pub const ERROR_CONFIG: &str = "config";
/// I/O error.
pub const ERROR_IO: &str = "io";
/// Serialization error.
pub const ERROR_SERIALIZE: &str = "serialize";
