//! Deterministic secret derivation.
//!
//! Every secret here is `HMAC-SHA256(salt, token)` post-processed into the
//! shape a protocol expects. Nothing is stored: the same token always yields
//! the same secret, so a node's server keys can be regenerated at any time
//! from its token hash.
//!
//! An empty token or a method with no derivable secret yields an empty
//! string rather than an error.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use nodeconf_core::ciphers::{LEGACY_METHODS, ss2022_key_len};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Salt for node server keys (SS server PSK, Trojan/Hysteria2/AnyTLS/TUIC
/// server passwords).
const SERVER_KEY_SALT: &[u8] = b"nodeconf:server-key:v1";
/// Salt for per-subscriber SS2022 user keys.
const USER_KEY_SALT: &[u8] = b"nodeconf:ss2022-user-key:v1";
/// Salt for derived UUID identities.
const UUID_SALT: &[u8] = b"nodeconf:uuid:v1";

/// Compute `HMAC-SHA256(salt, token)`.
///
/// Returns `None` for an empty token.
fn hmac_sha256(salt: &[u8], token: &str) -> Option<[u8; 32]> {
    if token.is_empty() {
        return None;
    }
    let mut mac = HmacSha256::new_from_slice(salt).ok()?;
    mac.update(token.as_bytes());
    let digest = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Some(out)
}

/// Derive the 32-byte server secret for a token.
#[inline]
pub fn derive_server_secret(token: &str) -> Option<[u8; 32]> {
    hmac_sha256(SERVER_KEY_SALT, token)
}

/// Derive a 64-character hex password from a token.
///
/// Used for Trojan server passwords and every other password-based protocol
/// that needs a stable node-level secret.
///
/// # Example
/// ```
/// use nodeconf_auth::derive_password;
///
/// let password = derive_password("node-token-hash");
/// assert_eq!(password.len(), 64);
/// assert!(derive_password("").is_empty());
/// ```
pub fn derive_password(token: &str) -> String {
    derive_server_secret(token)
        .map(hex::encode)
        .unwrap_or_default()
}

/// Derive the Trojan server password for a node token.
#[inline]
pub fn derive_trojan_password(token: &str) -> String {
    derive_password(token)
}

/// Derive the Shadowsocks server key for `method`.
///
/// - SS2022 methods: standard base64 of the first 16 or 32 HMAC bytes,
///   depending on the cipher.
/// - Legacy methods: 64-character hex password.
/// - Anything else: empty string.
pub fn derive_ss_password(token: &str, method: &str) -> String {
    encode_for_method(derive_server_secret(token), method)
}

/// Derive a per-subscriber SS2022 user key.
///
/// Clients of a multi-user SS2022 node authenticate with
/// `server_key:user_key`; the user half comes from here so it never collides
/// with a node's server key derived from the same token. Legacy methods have
/// no user key and yield an empty string.
pub fn derive_ss2022_user_key(token: &str, method: &str) -> String {
    match ss2022_key_len(method) {
        Some(len) => hmac_sha256(USER_KEY_SALT, token)
            .map(|secret| STANDARD.encode(&secret[..len]))
            .unwrap_or_default(),
        None => String::new(),
    }
}

/// Derive a version-4 formatted UUID from a token.
///
/// Gives uuid-based protocols (VLESS, VMess, TUIC) a stable identity for
/// node-to-node links without storing one.
pub fn derive_uuid(token: &str) -> String {
    hmac_sha256(UUID_SALT, token)
        .map(|secret| {
            let mut bytes = [0u8; 16];
            bytes.copy_from_slice(&secret[..16]);
            uuid::Builder::from_random_bytes(bytes)
                .into_uuid()
                .to_string()
        })
        .unwrap_or_default()
}

fn encode_for_method(secret: Option<[u8; 32]>, method: &str) -> String {
    let Some(secret) = secret else {
        return String::new();
    };
    if let Some(len) = ss2022_key_len(method) {
        return STANDARD.encode(&secret[..len]);
    }
    if LEGACY_METHODS.contains(&method) {
        return hex::encode(secret);
    }
    String::new()
}
