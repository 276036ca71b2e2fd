//! User-defined outbounds referenced by `custom_<tag>` actions.

use std::collections::BTreeMap;

use nodeconf_core::defaults::MAX_CUSTOM_OUTBOUND_SETTINGS;
use nodeconf_core::host::is_valid_host;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RouteError;
use crate::outbound::CUSTOM_PREFIX;

/// Outbound protocols a custom outbound may use.
pub const CUSTOM_PROTOCOLS: &[&str] = &[
    "socks",
    "http",
    "shadowsocks",
    "vmess",
    "vless",
    "trojan",
    "hysteria2",
    "tuic",
    "anytls",
    "wireguard",
];

/// An outbound defined inline in a route config.
///
/// `settings` carries protocol-specific fields passed through verbatim to
/// the proxy server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomOutbound {
    tag: String,
    #[serde(rename = "type")]
    protocol: String,
    server: String,
    server_port: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    settings: BTreeMap<String, Value>,
}

impl CustomOutbound {
    pub fn new(
        tag: impl Into<String>,
        protocol: impl Into<String>,
        server: impl Into<String>,
        server_port: u16,
        settings: BTreeMap<String, Value>,
    ) -> Result<Self, RouteError> {
        let outbound = Self {
            tag: tag.into(),
            protocol: protocol.into(),
            server: server.into(),
            server_port,
            settings,
        };
        outbound.validate()?;
        Ok(outbound)
    }

    pub fn validate(&self) -> Result<(), RouteError> {
        let suffix = self.tag.strip_prefix(CUSTOM_PREFIX).unwrap_or_default();
        if suffix.trim().is_empty() {
            return Err(RouteError::custom(
                &self.tag,
                format!("tag must be {CUSTOM_PREFIX}<name>"),
            ));
        }
        if !CUSTOM_PROTOCOLS.contains(&self.protocol.as_str()) {
            return Err(RouteError::custom(
                &self.tag,
                format!("unsupported protocol: {}", self.protocol),
            ));
        }
        if !is_valid_host(&self.server) {
            return Err(RouteError::custom(
                &self.tag,
                format!("invalid server: {}", self.server),
            ));
        }
        if self.server_port == 0 {
            return Err(RouteError::custom(&self.tag, "server_port must be 1..=65535"));
        }
        if self.settings.len() > MAX_CUSTOM_OUTBOUND_SETTINGS {
            return Err(RouteError::custom(
                &self.tag,
                format!(
                    "too many settings: {} (max {MAX_CUSTOM_OUTBOUND_SETTINGS})",
                    self.settings.len()
                ),
            ));
        }
        if self.settings.keys().any(|k| k.trim().is_empty()) {
            return Err(RouteError::custom(&self.tag, "empty settings key"));
        }
        Ok(())
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn settings(&self) -> &BTreeMap<String, Value> {
        &self.settings
    }
}
