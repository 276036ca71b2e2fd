//! Shadowsocks (legacy AEAD/stream and SS2022).

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use nodeconf_core::ciphers::{is_ss2022_method, is_supported_method};
use serde::{Deserialize, Serialize};

use crate::Credential;
use crate::error::ProtocolError;
use crate::uri::{Query, UriTarget, encode};

const PROTOCOL: &str = "shadowsocks";

/// SIP003 plugins clients are expected to ship.
pub const PLUGINS: &[&str] = &["obfs-local", "simple-obfs", "v2ray-plugin", "xray-plugin"];

/// Raw Shadowsocks settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShadowsocksParams {
    pub method: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub plugin: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub plugin_opts: String,
}

/// Validated Shadowsocks settings.
///
/// The password or PSK is never part of the config; it is derived from the
/// node token when needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ShadowsocksParams", into = "ShadowsocksParams")]
pub struct ShadowsocksConfig {
    method: String,
    plugin: String,
    plugin_opts: String,
}

impl ShadowsocksConfig {
    pub fn new(params: ShadowsocksParams) -> Result<Self, ProtocolError> {
        let config = Self {
            method: params.method,
            plugin: params.plugin,
            plugin_opts: params.plugin_opts,
        };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ProtocolError> {
        if self.method.is_empty() {
            return Err(ProtocolError::missing(PROTOCOL, "method"));
        }
        if !is_supported_method(&self.method) {
            return Err(ProtocolError::unsupported(PROTOCOL, "method", &self.method));
        }
        if self.plugin.is_empty() {
            if !self.plugin_opts.is_empty() {
                return Err(ProtocolError::invalid(
                    PROTOCOL,
                    "plugin_opts",
                    "set without a plugin",
                ));
            }
        } else if !PLUGINS.contains(&self.plugin.as_str()) {
            return Err(ProtocolError::unsupported(PROTOCOL, "plugin", &self.plugin));
        }
        Ok(())
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Plugin name, empty when no plugin is used.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn plugin_opts(&self) -> &str {
        &self.plugin_opts
    }

    /// Whether the method is one of the SS2022 ciphers.
    pub fn is_2022(&self) -> bool {
        is_ss2022_method(&self.method)
    }

    /// SIP002 share link.
    ///
    /// SS2022 user info is percent-encoded, legacy user info is base64url.
    pub fn to_uri(&self, target: &UriTarget<'_>, credential: &Credential) -> String {
        let userinfo = if self.is_2022() {
            format!("{}:{}", encode(&self.method), encode(&credential.password))
        } else {
            URL_SAFE_NO_PAD.encode(format!("{}:{}", self.method, credential.password))
        };
        let mut query = Query::new();
        if !self.plugin.is_empty() {
            let plugin = if self.plugin_opts.is_empty() {
                self.plugin.clone()
            } else {
                format!("{};{}", self.plugin, self.plugin_opts)
            };
            query.push("plugin", plugin);
        }
        format!(
            "ss://{userinfo}@{}{}{}",
            target.authority(),
            query.finish(),
            target.fragment()
        )
    }
}

impl TryFrom<ShadowsocksParams> for ShadowsocksConfig {
    type Error = ProtocolError;

    fn try_from(params: ShadowsocksParams) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}

impl From<ShadowsocksConfig> for ShadowsocksParams {
    fn from(config: ShadowsocksConfig) -> Self {
        Self {
            method: config.method,
            plugin: config.plugin,
            plugin_opts: config.plugin_opts,
        }
    }
}
