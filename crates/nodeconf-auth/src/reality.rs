//! Reality key material.
//!
//! Unlike the HMAC-derived secrets, Reality keypairs and short IDs are random.
//! They cannot be regenerated from a token, so whoever calls
//! [`RealityKeyPair::generate`] or [`generate_short_id`] owns persisting the
//! result.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use nodeconf_core::defaults::{SHORT_ID_BYTES, X25519_KEY_LEN};
use rand::RngCore;
use x25519_dalek::{X25519_BASEPOINT_BYTES, x25519};

use crate::error::KeyError;

/// An X25519 keypair encoded the way Xray/sing-box configs expect
/// (base64url, no padding).
#[derive(Clone, PartialEq, Eq)]
pub struct RealityKeyPair {
    private_key: String,
    public_key: String,
}

impl RealityKeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut scalar = [0u8; X25519_KEY_LEN];
        rand::thread_rng().fill_bytes(&mut scalar);
        Self::from_private_bytes(scalar)
    }

    /// Build a keypair from raw private key bytes.
    ///
    /// The scalar is clamped per RFC 7748 before use, and the clamped form is
    /// what gets encoded as the private key.
    pub fn from_private_bytes(mut scalar: [u8; X25519_KEY_LEN]) -> Self {
        clamp_scalar(&mut scalar);
        let public = x25519(scalar, X25519_BASEPOINT_BYTES);
        Self {
            private_key: URL_SAFE_NO_PAD.encode(scalar),
            public_key: URL_SAFE_NO_PAD.encode(public),
        }
    }

    /// Rebuild a keypair from an encoded private key.
    pub fn from_private_key(encoded: &str) -> Result<Self, KeyError> {
        Ok(Self::from_private_bytes(decode_key(encoded)?))
    }

    /// Encoded private key (server side only).
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Encoded public key (`pbk` in client links).
    pub fn public_key(&self) -> &str {
        &self.public_key
    }
}

impl fmt::Debug for RealityKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealityKeyPair")
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Clamp an X25519 scalar per RFC 7748 section 5.
#[inline]
pub fn clamp_scalar(scalar: &mut [u8; X25519_KEY_LEN]) {
    scalar[0] &= 248;
    scalar[31] &= 127;
    scalar[31] |= 64;
}

/// Generate a Reality short ID: 8 random bytes, hex encoded.
pub fn generate_short_id() -> String {
    let mut bytes = [0u8; SHORT_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Decode a 32-byte X25519 key from any common base64 alphabet.
///
/// Accepts URL-safe and standard alphabets, padded or not, since panels and
/// CLI tools disagree on which one to print.
pub fn decode_key(encoded: &str) -> Result<[u8; X25519_KEY_LEN], KeyError> {
    let encoded = encoded.trim();
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .or_else(|_| URL_SAFE.decode(encoded))
        .or_else(|_| STANDARD_NO_PAD.decode(encoded))
        .or_else(|_| STANDARD.decode(encoded))
        .map_err(KeyError::encoding)?;
    let got = bytes.len();
    bytes.try_into().map_err(|_| KeyError::Length {
        expected: X25519_KEY_LEN,
        got,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 7748 section 6.1 test vector (Alice).
    const ALICE_PRIVATE: &str = "77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a";
    const ALICE_PUBLIC: &str = "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a";

    #[test]
    fn rfc7748_vector() {
        let mut scalar = [0u8; 32];
        scalar.copy_from_slice(&hex::decode(ALICE_PRIVATE).unwrap());
        let pair = RealityKeyPair::from_private_bytes(scalar);
        let public = URL_SAFE_NO_PAD.decode(pair.public_key()).unwrap();
        assert_eq!(hex::encode(public), ALICE_PUBLIC);
    }

    #[test]
    fn generated_keys_are_43_chars() {
        let pair = RealityKeyPair::generate();
        assert_eq!(pair.private_key().len(), 43);
        assert_eq!(pair.public_key().len(), 43);
        assert_ne!(pair.private_key(), pair.public_key());
    }

    #[test]
    fn private_key_is_clamped() {
        let pair = RealityKeyPair::from_private_bytes([0xff; 32]);
        let private = decode_key(pair.private_key()).unwrap();
        assert_eq!(private[0] & 7, 0);
        assert_eq!(private[31] & 128, 0);
        assert_eq!(private[31] & 64, 64);
    }

    #[test]
    fn roundtrip_from_private_key() {
        let pair = RealityKeyPair::generate();
        let rebuilt = RealityKeyPair::from_private_key(pair.private_key()).unwrap();
        assert_eq!(pair, rebuilt);
    }

    #[test]
    fn decode_accepts_standard_alphabet() {
        let pair = RealityKeyPair::generate();
        let raw = decode_key(pair.public_key()).unwrap();
        assert_eq!(decode_key(&STANDARD.encode(raw)).unwrap(), raw);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let err = decode_key(&URL_SAFE_NO_PAD.encode([1u8; 16])).unwrap_err();
        assert!(matches!(err, KeyError::Length { expected: 32, got: 16 }));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode_key("not base64 at all!"), Err(KeyError::Encoding(_))));
    }

    #[test]
    fn short_id_is_16_hex() {
        let sid = generate_short_id();
        assert_eq!(sid.len(), 16);
        assert!(sid.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(sid, generate_short_id());
    }

    #[test]
    fn debug_redacts_private_key() {
        let pair = RealityKeyPair::generate();
        let dbg = format!("{pair:?}");
        assert!(!dbg.contains(pair.private_key()));
        assert!(dbg.contains(pair.public_key()));
    }
}
