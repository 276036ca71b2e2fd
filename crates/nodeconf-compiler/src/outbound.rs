//! Outbound descriptors for node-to-node and custom outbounds.
//!
//! Descriptors follow the sing-box outbound layout: `tag`, `type`, server
//! endpoint, auth fields, then optional `tls` and `transport` objects.

use std::collections::BTreeMap;

use nodeconf_auth::{derive_password, derive_ss_password, derive_uuid};
use nodeconf_proto::{ProtocolConfig, TlsSettings, Transport, TransportSettings, VlessSecurity};
use nodeconf_rules::CustomOutbound;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::dto::non_empty;
use crate::error::CompileError;
use crate::node::NodeView;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundDto {
    pub tag: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub server: String,
    pub server_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<u16>,
    /// VMess cipher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_opts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub congestion_control: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udp_relay_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs: Option<ObfsDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_mbps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_mbps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutboundTlsDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<OutboundTransportDto>,
    /// Extra protocol settings of custom outbounds, inlined.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl OutboundDto {
    fn new(tag: &str, kind: &str, server: &str, server_port: u16) -> Self {
        Self {
            tag: tag.to_string(),
            kind: kind.to_string(),
            server: server.to_string(),
            server_port,
            method: None,
            password: None,
            uuid: None,
            flow: None,
            alter_id: None,
            security: None,
            plugin: None,
            plugin_opts: None,
            congestion_control: None,
            udp_relay_mode: None,
            obfs: None,
            up_mbps: None,
            down_mbps: None,
            tls: None,
            transport: None,
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObfsDto {
    #[serde(rename = "type")]
    pub kind: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundTlsDto {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utls: Option<UtlsDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reality: Option<RealityDto>,
}

impl OutboundTlsDto {
    fn from_settings(tls: &TlsSettings) -> Self {
        Self {
            enabled: true,
            server_name: non_empty(&tls.sni),
            insecure: tls.allow_insecure,
            alpn: tls.alpn.clone(),
            utls: non_empty(&tls.fingerprint).map(|fingerprint| UtlsDto {
                enabled: true,
                fingerprint,
            }),
            reality: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtlsDto {
    pub enabled: bool,
    pub fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealityDto {
    pub enabled: bool,
    pub public_key: String,
    pub short_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundTransportDto {
    #[serde(rename = "type")]
    pub kind: Transport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

impl OutboundTransportDto {
    /// `None` for plain TCP, which needs no transport object.
    fn from_settings(transport: &TransportSettings) -> Option<Self> {
        if transport.kind == Transport::Tcp {
            return None;
        }
        Some(Self {
            kind: transport.kind,
            host: non_empty(&transport.host),
            path: non_empty(&transport.path),
            service_name: non_empty(&transport.service_name),
        })
    }
}

/// Descriptor for reaching another node. The tag is the node SID and the
/// auth material comes from that node's own token.
pub fn node_outbound<N: NodeView>(node: &N) -> Result<OutboundDto, CompileError> {
    let token = node.token_hash();
    if token.is_empty() {
        return Err(CompileError::EmptyToken(node.sid().to_string()));
    }

    let config = node.protocol_config();
    let mut out = OutboundDto::new(
        node.sid(),
        config.protocol().as_str(),
        node.effective_server_address(),
        node.agent_port(),
    );

    match config {
        ProtocolConfig::Shadowsocks(c) => {
            out.method = Some(c.method().to_string());
            out.password = non_empty(&derive_ss_password(token, c.method()));
            out.plugin = non_empty(c.plugin());
            out.plugin_opts = non_empty(c.plugin_opts());
        }
        ProtocolConfig::Trojan(c) => {
            out.password = non_empty(&derive_password(token));
            out.tls = Some(OutboundTlsDto::from_settings(c.tls()));
            out.transport = OutboundTransportDto::from_settings(c.transport());
        }
        ProtocolConfig::Vless(c) => {
            out.uuid = non_empty(&derive_uuid(token));
            out.flow = non_empty(c.flow());
            out.transport = OutboundTransportDto::from_settings(c.transport());
            out.tls = match c.security() {
                VlessSecurity::None => None,
                VlessSecurity::Tls => Some(OutboundTlsDto::from_settings(c.tls())),
                VlessSecurity::Reality => {
                    let mut tls = OutboundTlsDto::from_settings(c.tls());
                    tls.utls = Some(UtlsDto {
                        enabled: true,
                        fingerprint: c.effective_fingerprint().to_string(),
                    });
                    tls.reality = Some(RealityDto {
                        enabled: true,
                        public_key: c.reality().public_key.clone(),
                        short_id: c.reality().short_id.clone(),
                    });
                    Some(tls)
                }
            };
        }
        ProtocolConfig::Vmess(c) => {
            out.uuid = non_empty(&derive_uuid(token));
            out.alter_id = Some(c.alter_id());
            out.security = Some(c.security().as_str().to_string());
            out.tls = c.tls().map(OutboundTlsDto::from_settings);
            out.transport = OutboundTransportDto::from_settings(c.transport());
        }
        ProtocolConfig::Hysteria2(c) => {
            out.password = non_empty(&derive_password(token));
            out.up_mbps = c.up_mbps();
            out.down_mbps = c.down_mbps();
            out.obfs = c.obfs().zip(c.obfs_password()).map(|(kind, password)| ObfsDto {
                kind: kind.to_string(),
                password: password.to_string(),
            });
            out.tls = Some(OutboundTlsDto::from_settings(c.tls()));
        }
        ProtocolConfig::Tuic(c) => {
            out.uuid = Some(c.uuid().to_string());
            out.password = non_empty(&derive_password(token));
            out.congestion_control = Some(c.congestion_control().as_str().to_string());
            out.udp_relay_mode = Some(c.udp_relay_mode().as_str().to_string());
            let mut tls = OutboundTlsDto::from_settings(c.tls());
            tls.alpn = c.effective_alpn();
            out.tls = Some(tls);
        }
        ProtocolConfig::AnyTls(c) => {
            out.password = non_empty(c.password());
            out.tls = Some(OutboundTlsDto::from_settings(c.tls()));
        }
    }

    debug!(tag = %out.tag, kind = %out.kind, "node outbound");
    Ok(out)
}

/// Descriptor for a custom outbound; its settings are inlined.
pub fn custom_outbound(custom: &CustomOutbound) -> OutboundDto {
    let mut out = OutboundDto::new(
        custom.tag(),
        custom.protocol(),
        custom.server(),
        custom.server_port(),
    );
    out.extra = custom.settings().clone();
    out
}

#[cfg(test)]
mod tests {
    use nodeconf_proto::{
        Hysteria2Config, Hysteria2Params, RealitySettings, ShadowsocksConfig, ShadowsocksParams,
        VlessConfig, VlessParams,
    };
    use serde_json::json;

    use super::*;
    use crate::node::Node;

    const PUBLIC_KEY: &str = "hSDwCYkwp1R0i33ctD73Wg2_Og0mOBr066SpjqqbTmo";

    #[test]
    fn empty_token_rejected() {
        let config = ProtocolConfig::Hysteria2(Hysteria2Config::new(Hysteria2Params::default()).unwrap());
        let node = Node::new("node_b", "b.example.com", 443, "", config);
        assert!(matches!(node_outbound(&node), Err(CompileError::EmptyToken(sid)) if sid == "node_b"));
    }

    #[test]
    fn shadowsocks_uses_node_key() {
        let config = ProtocolConfig::Shadowsocks(
            ShadowsocksConfig::new(ShadowsocksParams {
                method: "2022-blake3-aes-256-gcm".into(),
                ..ShadowsocksParams::default()
            })
            .unwrap(),
        );
        let node = Node::new("node_ss", "10.0.0.2", 8388, "tok", config);
        let out = node_outbound(&node).unwrap();
        assert_eq!(out.kind, "shadowsocks");
        assert_eq!(
            out.password.as_deref(),
            Some(derive_ss_password("tok", "2022-blake3-aes-256-gcm").as_str())
        );
        assert!(out.tls.is_none());
    }

    #[test]
    fn vless_reality_descriptor() {
        let config = ProtocolConfig::Vless(
            VlessConfig::new(VlessParams {
                security: VlessSecurity::Reality,
                tls: TlsSettings::with_sni("www.microsoft.com"),
                reality: RealitySettings {
                    public_key: PUBLIC_KEY.into(),
                    short_id: "6ba85179e30d4fc2".into(),
                    ..RealitySettings::default()
                },
                ..VlessParams::default()
            })
            .unwrap(),
        );
        let node = Node::new("node_r", "r.example.com", 443, "tok", config);
        let value = serde_json::to_value(node_outbound(&node).unwrap()).unwrap();
        assert_eq!(value["tag"], "node_r");
        assert_eq!(value["type"], "vless");
        assert_eq!(value["uuid"], derive_uuid("tok"));
        assert_eq!(
            value["tls"],
            json!({
                "enabled": true,
                "server_name": "www.microsoft.com",
                "utls": {"enabled": true, "fingerprint": "chrome"},
                "reality": {"enabled": true, "public_key": PUBLIC_KEY, "short_id": "6ba85179e30d4fc2"}
            })
        );
        assert!(value.get("transport").is_none());
    }

    #[test]
    fn custom_settings_inlined() {
        let mut settings = BTreeMap::new();
        settings.insert("private_key".to_string(), json!("abc"));
        let custom = CustomOutbound::new("custom_wg", "wireguard", "1.2.3.4", 51820, settings).unwrap();
        let value = serde_json::to_value(custom_outbound(&custom)).unwrap();
        assert_eq!(
            value,
            json!({
                "tag": "custom_wg",
                "type": "wireguard",
                "server": "1.2.3.4",
                "server_port": 51820,
                "private_key": "abc"
            })
        );
    }
}
