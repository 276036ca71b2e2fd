//! Default configuration values.
//!
//! Centralized default constants and limits for use across all crates.

// ============================================================================
// Protocol Defaults
// ============================================================================

/// Transport reported when a protocol has no transport selection.
pub const DEFAULT_TRANSPORT: &str = "tcp";
/// Minimum length for passwords stored on a protocol config.
pub const MIN_PASSWORD_LEN: usize = 8;
/// uTLS fingerprint used when Reality is selected without one.
pub const DEFAULT_REALITY_FINGERPRINT: &str = "chrome";
/// Maximum Reality short ID length in hex characters.
pub const MAX_SHORT_ID_HEX_LEN: usize = 16;
/// Length of an X25519 key in bytes.
pub const X25519_KEY_LEN: usize = 32;

// ============================================================================
// Credential Defaults
// ============================================================================

/// Random bytes in a generated Reality short ID.
pub const SHORT_ID_BYTES: usize = 8;
/// Hex length of a legacy (non-2022) derived password.
pub const LEGACY_PASSWORD_HEX_LEN: usize = 64;

// ============================================================================
// Routing / DNS Limits
// ============================================================================

/// Maximum keys in a custom outbound settings map.
pub const MAX_CUSTOM_OUTBOUND_SETTINGS: usize = 50;
/// Maximum DNS servers in a single DNS config.
pub const MAX_DNS_SERVERS: usize = 20;
/// Maximum DNS rules in a single DNS config.
pub const MAX_DNS_RULES: usize = 50;
/// Maximum length of a DNS server tag.
pub const MAX_DNS_TAG_LEN: usize = 64;
/// Maximum length of a hostname (RFC 1123).
pub const MAX_HOSTNAME_LEN: usize = 253;

// ============================================================================
// Sync Defaults
// ============================================================================

/// Default config version stamped on config-sync messages.
pub const DEFAULT_SYNC_VERSION: u64 = 1;
/// Default full-sync flag on config-sync messages.
pub const DEFAULT_FULL_SYNC: bool = true;

// ============================================================================
// Logging Defaults
// ============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default log format (pretty, compact, json).
pub const DEFAULT_LOG_FORMAT: &str = "pretty";
/// Default log output (stderr, stdout).
pub const DEFAULT_LOG_OUTPUT: &str = "stderr";

// ============================================================================
// Pagination Defaults
// ============================================================================

/// Page size used when the caller passes zero.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Upper bound for a requested page size.
pub const MAX_PAGE_SIZE: usize = 100;
