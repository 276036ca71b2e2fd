//! TLS client settings shared by TLS-capable protocols.

use nodeconf_core::host::is_valid_host;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// uTLS fingerprints understood by common clients.
pub const FINGERPRINTS: &[&str] = &[
    "chrome",
    "firefox",
    "safari",
    "ios",
    "android",
    "edge",
    "360",
    "qq",
    "random",
    "randomized",
];

/// Client-facing TLS settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TlsSettings {
    /// Server name indication.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sni: String,
    /// uTLS fingerprint, empty for the client default.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fingerprint: String,
    /// Skip certificate verification.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_insecure: bool,
    /// ALPN protocols.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
}

impl TlsSettings {
    /// TLS settings with only an SNI.
    pub fn with_sni(sni: impl Into<String>) -> Self {
        Self {
            sni: sni.into(),
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self, protocol: &'static str) -> Result<(), ProtocolError> {
        if !self.sni.is_empty() && !is_valid_host(&self.sni) {
            return Err(ProtocolError::invalid(
                protocol,
                "tls.sni",
                format!("not a hostname: {}", self.sni),
            ));
        }
        validate_fingerprint(protocol, &self.fingerprint)?;
        if self.alpn.iter().any(|p| p.trim().is_empty()) {
            return Err(ProtocolError::invalid(
                protocol,
                "tls.alpn",
                "empty protocol name",
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_fingerprint(
    protocol: &'static str,
    fingerprint: &str,
) -> Result<(), ProtocolError> {
    if !fingerprint.is_empty() && !FINGERPRINTS.contains(&fingerprint) {
        return Err(ProtocolError::unsupported(
            protocol,
            "tls.fingerprint",
            fingerprint,
        ));
    }
    Ok(())
}
