//! Shadowsocks cipher tables.
//!
//! Read-only lookup tables shared by protocol validation and credential
//! derivation.

/// SS2022 methods paired with their pre-shared key length in bytes.
pub const SS2022_METHODS: &[(&str, usize)] = &[
    ("2022-blake3-aes-128-gcm", 16),
    ("2022-blake3-aes-256-gcm", 32),
    ("2022-blake3-chacha20-poly1305", 32),
];

/// Legacy (password based) Shadowsocks methods.
pub const LEGACY_METHODS: &[&str] = &[
    "aes-128-gcm",
    "aes-192-gcm",
    "aes-256-gcm",
    "chacha20-ietf-poly1305",
    "xchacha20-ietf-poly1305",
    "aes-128-ctr",
    "aes-192-ctr",
    "aes-256-ctr",
    "aes-128-cfb",
    "aes-192-cfb",
    "aes-256-cfb",
    "chacha20-ietf",
    "xchacha20",
    "none",
];

/// Key length for an SS2022 method, `None` for anything else.
pub fn ss2022_key_len(method: &str) -> Option<usize> {
    SS2022_METHODS
        .iter()
        .find(|(name, _)| *name == method)
        .map(|(_, len)| *len)
}

/// Whether `method` is an SS2022 method.
#[inline]
pub fn is_ss2022_method(method: &str) -> bool {
    ss2022_key_len(method).is_some()
}

/// Whether `method` is any supported Shadowsocks method.
pub fn is_supported_method(method: &str) -> bool {
    is_ss2022_method(method) || LEGACY_METHODS.contains(&method)
}
