//! Protocol configuration value objects for nodeconf.
//!
//! Each supported wire protocol has a validated, immutable config type:
//! constructing one from its `*Params` either yields a config whose
//! preconditions all hold or a [`ProtocolError`]. Deserialization goes
//! through the same constructors, so a config loaded from disk is as
//! trustworthy as one built in code.
//!
//! [`ProtocolConfig`] is the closed sum over all of them. It also renders
//! client share links given a [`UriTarget`] and a [`Credential`].
//!
//! # Example
//!
//! ```
//! use nodeconf_proto::{Credential, ProtocolConfig, TrojanConfig, TrojanParams, UriTarget};
//!
//! let config = ProtocolConfig::Trojan(TrojanConfig::new(TrojanParams::default()).unwrap());
//! let uri = config.subscription_uri(
//!     &UriTarget::new("node.example.com", 443, "Tokyo"),
//!     &Credential::password("secret"),
//! );
//! assert_eq!(uri, "trojan://secret@node.example.com:443?security=tls&type=tcp#Tokyo");
//! ```

mod anytls;
mod congestion;
mod error;
mod hysteria2;
mod shadowsocks;
mod tls;
mod transport;
mod trojan;
mod tuic;
mod uri;
mod vless;
mod vmess;

use std::fmt;
use std::str::FromStr;

use nodeconf_auth::{derive_password, derive_ss2022_user_key, derive_ss_password, derive_uuid};
use nodeconf_core::defaults::DEFAULT_TRANSPORT;
use serde::{Deserialize, Serialize};

pub use anytls::{AnyTlsConfig, AnyTlsParams};
pub use congestion::CongestionControl;
pub use error::ProtocolError;
pub use hysteria2::{Hysteria2Config, Hysteria2Params, OBFS_SALAMANDER};
pub use shadowsocks::{PLUGINS as SS_PLUGINS, ShadowsocksConfig, ShadowsocksParams};
pub use tls::{FINGERPRINTS, TlsSettings};
pub use transport::{Transport, TransportSettings};
pub use trojan::{TrojanConfig, TrojanParams};
pub use tuic::{DEFAULT_ALPN as TUIC_DEFAULT_ALPN, TuicConfig, TuicParams, UdpRelayMode};
pub use uri::UriTarget;
pub use vless::{
    FLOW_VISION, FLOW_VISION_UDP443, RealitySettings, VlessConfig, VlessParams, VlessSecurity,
};
pub use vmess::{VmessConfig, VmessParams, VmessSecurity};

/// Protocol identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Shadowsocks,
    Trojan,
    Vless,
    Vmess,
    Hysteria2,
    Tuic,
    AnyTls,
}

impl Protocol {
    pub const ALL: [Protocol; 7] = [
        Protocol::Shadowsocks,
        Protocol::Trojan,
        Protocol::Vless,
        Protocol::Vmess,
        Protocol::Hysteria2,
        Protocol::Tuic,
        Protocol::AnyTls,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Shadowsocks => "shadowsocks",
            Protocol::Trojan => "trojan",
            Protocol::Vless => "vless",
            Protocol::Vmess => "vmess",
            Protocol::Hysteria2 => "hysteria2",
            Protocol::Tuic => "tuic",
            Protocol::AnyTls => "anytls",
        }
    }

    /// Whether clients authenticate with a UUID rather than a password.
    pub fn uses_uuid(&self) -> bool {
        matches!(self, Protocol::Vless | Protocol::Vmess | Protocol::Tuic)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Protocol::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .or(match s {
                "ss" => Some(Protocol::Shadowsocks),
                "hy2" => Some(Protocol::Hysteria2),
                _ => None,
            })
            .ok_or_else(|| format!("unknown protocol: {s}"))
    }
}

/// Client-side secret material for a share link.
///
/// UUID-based protocols read `uuid`, password-based ones read `password`,
/// TUIC reads both.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credential {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub password: String,
}

impl Credential {
    pub fn new(uuid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            password: password.into(),
        }
    }

    /// Credential carrying only a UUID.
    pub fn uuid(uuid: impl Into<String>) -> Self {
        Self::new(uuid, String::new())
    }

    /// Credential carrying only a password.
    pub fn password(password: impl Into<String>) -> Self {
        Self::new(String::new(), password)
    }

    /// Derive a subscriber's credential for a node.
    ///
    /// `subscription_token` identifies the subscriber, `node_token` the
    /// node. SS2022 yields the multi-user `server_key:user_key` form; legacy
    /// Shadowsocks has no per-user keys and gets the node password. Empty
    /// tokens yield empty fields.
    pub fn derive(subscription_token: &str, node_token: &str, config: &ProtocolConfig) -> Self {
        match config {
            ProtocolConfig::Shadowsocks(ss) => {
                let server = derive_ss_password(node_token, ss.method());
                if !ss.is_2022() {
                    return Self::password(server);
                }
                let user = derive_ss2022_user_key(subscription_token, ss.method());
                if server.is_empty() || user.is_empty() {
                    return Self::default();
                }
                Self::password(format!("{server}:{user}"))
            }
            ProtocolConfig::Trojan(_) | ProtocolConfig::Hysteria2(_) | ProtocolConfig::AnyTls(_) => {
                Self::password(derive_password(subscription_token))
            }
            ProtocolConfig::Vless(_) | ProtocolConfig::Vmess(_) => {
                Self::uuid(derive_uuid(subscription_token))
            }
            ProtocolConfig::Tuic(_) => Self::new(
                derive_uuid(subscription_token),
                derive_password(subscription_token),
            ),
        }
    }

    /// Whether neither field is set.
    pub fn is_empty(&self) -> bool {
        self.uuid.is_empty() && self.password.is_empty()
    }
}

/// Protocol-specific node settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum ProtocolConfig {
    Shadowsocks(ShadowsocksConfig),
    Trojan(TrojanConfig),
    Vless(VlessConfig),
    Vmess(VmessConfig),
    Hysteria2(Hysteria2Config),
    Tuic(TuicConfig),
    AnyTls(AnyTlsConfig),
}

impl ProtocolConfig {
    pub fn protocol(&self) -> Protocol {
        match self {
            ProtocolConfig::Shadowsocks(_) => Protocol::Shadowsocks,
            ProtocolConfig::Trojan(_) => Protocol::Trojan,
            ProtocolConfig::Vless(_) => Protocol::Vless,
            ProtocolConfig::Vmess(_) => Protocol::Vmess,
            ProtocolConfig::Hysteria2(_) => Protocol::Hysteria2,
            ProtocolConfig::Tuic(_) => Protocol::Tuic,
            ProtocolConfig::AnyTls(_) => Protocol::AnyTls,
        }
    }

    /// Transport name reported to agents: the stream transport for
    /// TCP-based protocols, `quic` for Hysteria2 and TUIC.
    pub fn transport_protocol(&self) -> &'static str {
        match self {
            ProtocolConfig::Shadowsocks(_) | ProtocolConfig::AnyTls(_) => DEFAULT_TRANSPORT,
            ProtocolConfig::Trojan(c) => c.transport().kind.as_str(),
            ProtocolConfig::Vless(c) => c.transport().kind.as_str(),
            ProtocolConfig::Vmess(c) => c.transport().kind.as_str(),
            ProtocolConfig::Hysteria2(_) | ProtocolConfig::Tuic(_) => "quic",
        }
    }

    /// Stream transport settings, for protocols that have them.
    pub fn transport(&self) -> Option<&TransportSettings> {
        match self {
            ProtocolConfig::Trojan(c) => Some(c.transport()),
            ProtocolConfig::Vless(c) => Some(c.transport()),
            ProtocolConfig::Vmess(c) => Some(c.transport()),
            _ => None,
        }
    }

    /// TLS settings, for protocols where TLS is in effect.
    pub fn tls(&self) -> Option<&TlsSettings> {
        match self {
            ProtocolConfig::Shadowsocks(_) => None,
            ProtocolConfig::Trojan(c) => Some(c.tls()),
            ProtocolConfig::Vless(c) => (c.security() != VlessSecurity::None).then_some(c.tls()),
            ProtocolConfig::Vmess(c) => c.tls(),
            ProtocolConfig::Hysteria2(c) => Some(c.tls()),
            ProtocolConfig::Tuic(c) => Some(c.tls()),
            ProtocolConfig::AnyTls(c) => Some(c.tls()),
        }
    }

    /// One-line human summary, e.g. `vless reality/tcp flow=xtls-rprx-vision`.
    pub fn describe(&self) -> String {
        match self {
            ProtocolConfig::Shadowsocks(c) => {
                let mut out = format!("shadowsocks {}", c.method());
                if !c.plugin().is_empty() {
                    out.push_str(&format!(" plugin={}", c.plugin()));
                }
                out
            }
            ProtocolConfig::Trojan(c) => format!("trojan tls/{}", c.transport().kind),
            ProtocolConfig::Vless(c) => {
                let mut out = format!("vless {}/{}", c.security(), c.transport().kind);
                if !c.flow().is_empty() {
                    out.push_str(&format!(" flow={}", c.flow()));
                }
                out
            }
            ProtocolConfig::Vmess(c) => format!(
                "vmess {}/{} cipher={}",
                if c.tls().is_some() { "tls" } else { "none" },
                c.transport().kind,
                c.security()
            ),
            ProtocolConfig::Hysteria2(c) => {
                let mut out = format!("hysteria2 cc={}", c.congestion_control());
                if let Some(obfs) = c.obfs() {
                    out.push_str(&format!(" obfs={obfs}"));
                }
                out
            }
            ProtocolConfig::Tuic(c) => format!(
                "tuic cc={} udp={}",
                c.congestion_control(),
                c.udp_relay_mode()
            ),
            ProtocolConfig::AnyTls(c) => format!(
                "anytls idle={}s/{}s",
                c.idle_session_check_interval_secs(),
                c.idle_session_timeout_secs()
            ),
        }
    }

    /// Re-check every construction precondition.
    ///
    /// Always passes for values built through constructors or serde; useful
    /// as a guard at trust boundaries.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            ProtocolConfig::Shadowsocks(c) => c.validate(),
            ProtocolConfig::Trojan(c) => c.validate(),
            ProtocolConfig::Vless(c) => c.validate(),
            ProtocolConfig::Vmess(c) => c.validate(),
            ProtocolConfig::Hysteria2(c) => c.validate(),
            ProtocolConfig::Tuic(c) => c.validate(),
            ProtocolConfig::AnyTls(c) => c.validate(),
        }
    }

    /// Client share link. VMess uses the query-string form; see
    /// [`VmessConfig::to_json_uri`] for the base64 JSON form.
    pub fn subscription_uri(&self, target: &UriTarget<'_>, credential: &Credential) -> String {
        match self {
            ProtocolConfig::Shadowsocks(c) => c.to_uri(target, credential),
            ProtocolConfig::Trojan(c) => c.to_uri(target, credential),
            ProtocolConfig::Vless(c) => c.to_uri(target, credential),
            ProtocolConfig::Vmess(c) => c.to_uri(target, credential),
            ProtocolConfig::Hysteria2(c) => c.to_uri(target, credential),
            ProtocolConfig::Tuic(c) => c.to_uri(target, credential),
            ProtocolConfig::AnyTls(c) => c.to_uri(target, credential),
        }
    }
}
