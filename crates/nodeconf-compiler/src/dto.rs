//! Wire documents produced by the compiler.
//!
//! The REST response and the hub push config share [`NodeConfigBase`]; the
//! push config adds [`ProtocolExtensions`] on top. Route and DNS sections
//! are converted field for field into plain-string DTOs so the agent never
//! needs the typed model.

use std::collections::BTreeMap;

use nodeconf_dns::{DnsConfig, DnsRule, DnsServer, DnsStrategy};
use nodeconf_proto::{Protocol, TransportSettings};
use nodeconf_rules::{
    CustomOutbound, Network, RouteConfig, RouteRule, RuleSetEntry, RuleSetFormat, SniffProtocol,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::outbound::OutboundDto;

/// Protocol-agnostic part of every compiled document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfigBase {
    pub node_id: String,
    pub protocol: Protocol,
    pub server_host: String,
    pub server_port: u16,
    pub transport_protocol: String,
    #[serde(flatten)]
    pub fields: ProtocolFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteConfigDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsConfigDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbounds: Option<Vec<OutboundDto>>,
}

/// Synchronous REST response for an agent pulling its config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfigResponse {
    #[serde(flatten)]
    pub base: NodeConfigBase,
}

/// Config carried in a hub `config_sync` push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubNodeConfig {
    #[serde(flatten)]
    pub base: NodeConfigBase,
    #[serde(flatten)]
    pub extensions: ProtocolExtensions,
}

/// Server-side protocol fields. Only those relevant to the protocol are set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProtocolFields {
    /// Shadowsocks cipher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Server password or SS key derived from the node token, or the
    /// configured AnyTLS password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_opts: Option<String>,
    /// TUIC server UUID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_insecure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_session_check_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_session_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_idle_session: Option<u32>,
}

impl ProtocolFields {
    /// Copy non-empty stream transport fields.
    pub(crate) fn set_transport(&mut self, transport: &TransportSettings) {
        self.host = non_empty(&transport.host);
        self.path = non_empty(&transport.path);
        self.service_name = non_empty(&transport.service_name);
    }
}

/// Fields only the push config carries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProtocolExtensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    /// VLESS security mode or VMess cipher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reality_public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reality_private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reality_short_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reality_spider_x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub congestion_control: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_mbps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_mbps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udp_relay_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_sni: Option<bool>,
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfigDto {
    pub rules: Vec<RouteRuleDto>,
    #[serde(rename = "final")]
    pub final_action: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_outbounds: Vec<CustomOutboundDto>,
    #[serde(default, rename = "rule_set", skip_serializing_if = "Vec::is_empty")]
    pub rule_sets: Vec<RuleSetDto>,
}

impl From<&RouteConfig> for RouteConfigDto {
    fn from(config: &RouteConfig) -> Self {
        Self {
            rules: config.rules().iter().map(RouteRuleDto::from).collect(),
            final_action: config.final_action().to_string(),
            custom_outbounds: config
                .custom_outbounds()
                .iter()
                .map(CustomOutboundDto::from)
                .collect(),
            rule_sets: config.rule_sets().iter().map(RuleSetDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouteRuleDto {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_suffix: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_keyword: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_regex: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_cidr: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_ip_cidr: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_is_private: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geoip: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geosite: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port: Vec<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_port: Vec<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protocol: Vec<SniffProtocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_set: Vec<String>,
    pub outbound: String,
}

impl From<&RouteRule> for RouteRuleDto {
    fn from(rule: &RouteRule) -> Self {
        Self {
            domain: rule.domain().to_vec(),
            domain_suffix: rule.domain_suffix().to_vec(),
            domain_keyword: rule.domain_keyword().to_vec(),
            domain_regex: rule.domain_regex().to_vec(),
            ip_cidr: rule.ip_cidr().iter().map(ToString::to_string).collect(),
            source_ip_cidr: rule.source_ip_cidr().iter().map(ToString::to_string).collect(),
            ip_is_private: rule.ip_is_private(),
            geoip: rule.geoip().to_vec(),
            geosite: rule.geosite().to_vec(),
            port: rule.port().to_vec(),
            source_port: rule.source_port().to_vec(),
            protocol: rule.protocol().to_vec(),
            network: rule.network(),
            rule_set: rule.rule_set().to_vec(),
            outbound: rule.outbound().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomOutboundDto {
    pub tag: String,
    #[serde(rename = "type")]
    pub protocol: String,
    pub server: String,
    pub server_port: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: BTreeMap<String, Value>,
}

impl From<&CustomOutbound> for CustomOutboundDto {
    fn from(custom: &CustomOutbound) -> Self {
        Self {
            tag: custom.tag().to_string(),
            protocol: custom.protocol().to_string(),
            server: custom.server().to_string(),
            server_port: custom.server_port(),
            settings: custom.settings().clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetDto {
    pub tag: String,
    pub url: String,
    pub format: RuleSetFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_detour: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_interval: Option<String>,
}

impl From<&RuleSetEntry> for RuleSetDto {
    fn from(entry: &RuleSetEntry) -> Self {
        Self {
            tag: entry.tag().to_string(),
            url: entry.url().to_string(),
            format: entry.format(),
            download_detour: entry.download_detour().map(ToString::to_string),
            update_interval: entry.update_interval().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsConfigDto {
    pub servers: Vec<DnsServerDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<DnsRuleDto>,
    #[serde(rename = "final")]
    pub final_server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<DnsStrategy>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_cache: bool,
}

impl From<&DnsConfig> for DnsConfigDto {
    fn from(config: &DnsConfig) -> Self {
        Self {
            servers: config.servers().iter().map(DnsServerDto::from).collect(),
            rules: config.rules().iter().map(DnsRuleDto::from).collect(),
            final_server: config.final_server().to_string(),
            strategy: config.strategy(),
            disable_cache: config.disable_cache(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsServerDto {
    pub tag: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_resolver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<DnsStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detour: Option<String>,
}

impl From<&DnsServer> for DnsServerDto {
    fn from(server: &DnsServer) -> Self {
        Self {
            tag: server.tag().to_string(),
            address: server.address().to_string(),
            address_resolver: server.address_resolver().map(str::to_string),
            strategy: server.strategy(),
            detour: server.detour().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRuleDto {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_suffix: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_keyword: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geosite: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geoip: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_set: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outbound: Vec<String>,
    pub server: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_cache: bool,
}

impl From<&DnsRule> for DnsRuleDto {
    fn from(rule: &DnsRule) -> Self {
        Self {
            domain: rule.domain().to_vec(),
            domain_suffix: rule.domain_suffix().to_vec(),
            domain_keyword: rule.domain_keyword().to_vec(),
            geosite: rule.geosite().to_vec(),
            geoip: rule.geoip().to_vec(),
            rule_set: rule.rule_set().to_vec(),
            outbound: rule.outbound().to_vec(),
            server: rule.server().to_string(),
            disable_cache: rule.disable_cache(),
        }
    }
}

#[cfg(test)]
mod tests {
    use nodeconf_rules::OutboundType;
    use serde_json::json;

    use super::*;

    #[test]
    fn route_rule_flattens_typed_fields() {
        let rule = RouteRule::builder(OutboundType::node("node_b"))
            .ip_cidr(["10.0.0.0/8".parse::<ipnet::IpNet>().unwrap()])
            .port([443u16])
            .network(Network::Tcp)
            .build()
            .unwrap();
        let dto = RouteRuleDto::from(&rule);
        assert_eq!(
            serde_json::to_value(&dto).unwrap(),
            json!({
                "ip_cidr": ["10.0.0.0/8"],
                "port": [443],
                "network": "tcp",
                "outbound": "node_b"
            })
        );
    }

    #[test]
    fn route_config_keys() {
        let config = RouteConfig::new(OutboundType::Direct);
        let value = serde_json::to_value(RouteConfigDto::from(&config)).unwrap();
        assert_eq!(value, json!({"rules": [], "final": "direct"}));
    }

    #[test]
    fn route_with_custom_outbounds_reloads_equal() {
        fn total_eq<T: Eq>(a: &T, b: &T) -> bool {
            a == b
        }

        let config: RouteConfig = serde_json::from_value(json!({
            "rules": [{"domain_suffix": [".corp"], "outbound": "custom_wg"}],
            "final": "direct",
            "custom_outbounds": [{
                "tag": "custom_wg", "type": "wireguard", "server": "192.0.2.9",
                "server_port": 51820, "settings": {"mtu": 1420, "reserved": [0, 0, 0]}
            }]
        }))
        .unwrap();
        let dto = RouteConfigDto::from(&config);
        let reloaded: RouteConfigDto =
            serde_json::from_value(serde_json::to_value(&dto).unwrap()).unwrap();
        assert!(total_eq(&dto, &reloaded));
        assert_eq!(reloaded.custom_outbounds[0].settings["mtu"], 1420);
    }

    #[test]
    fn dns_server_detour_is_string() {
        let server = DnsServer::new("remote", "tls://1.1.1.1")
            .with_detour(OutboundType::Proxy)
            .with_strategy(DnsStrategy::Ipv4Only);
        let value = serde_json::to_value(DnsServerDto::from(&server)).unwrap();
        assert_eq!(
            value,
            json!({
                "tag": "remote",
                "address": "tls://1.1.1.1",
                "strategy": "ipv4_only",
                "detour": "proxy"
            })
        );
    }

    #[test]
    fn empty_fields_omitted() {
        let mut fields = ProtocolFields::default();
        fields.set_transport(&TransportSettings::grpc("gun"));
        let value = serde_json::to_value(&fields).unwrap();
        assert_eq!(value, json!({"service_name": "gun"}));
    }
}
