//! Route rule definitions.

use ipnet::IpNet;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::outbound::OutboundType;

/// Transport-layer network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Tcp,
    Udp,
}

/// Application protocol detected by sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SniffProtocol {
    Http,
    Tls,
    Quic,
    Dns,
    Stun,
    Bittorrent,
    Dtls,
    Ssh,
    Rdp,
}

/// One routing rule: match conditions plus an outbound.
///
/// Conditions of different kinds are ANDed by the consuming engine, values
/// within one kind are ORed. A rule without conditions matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    domain: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    domain_suffix: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    domain_keyword: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    domain_regex: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    ip_cidr: Vec<IpNet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    source_ip_cidr: Vec<IpNet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ip_is_private: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    geoip: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    geosite: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    port: Vec<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    source_port: Vec<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    protocol: Vec<SniffProtocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    network: Option<Network>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    rule_set: Vec<String>,
    outbound: OutboundType,
}

impl RouteRule {
    /// Start building a rule that sends matches to `outbound`.
    pub fn builder(outbound: OutboundType) -> RouteRuleBuilder {
        RouteRuleBuilder::new(outbound)
    }

    /// Catch-all rule.
    pub fn catch_all(outbound: OutboundType) -> Self {
        Self {
            domain: Vec::new(),
            domain_suffix: Vec::new(),
            domain_keyword: Vec::new(),
            domain_regex: Vec::new(),
            ip_cidr: Vec::new(),
            source_ip_cidr: Vec::new(),
            ip_is_private: None,
            geoip: Vec::new(),
            geosite: Vec::new(),
            port: Vec::new(),
            source_port: Vec::new(),
            protocol: Vec::new(),
            network: None,
            rule_set: Vec::new(),
            outbound,
        }
    }

    /// The outbound must be well formed and every `domain_regex` must
    /// compile. No condition is required.
    pub fn validate(&self) -> Result<(), RouteError> {
        self.outbound.validate()?;
        for pattern in &self.domain_regex {
            Regex::new(pattern).map_err(|e| RouteError::InvalidRegex {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Whether the rule has no match conditions.
    pub fn is_catch_all(&self) -> bool {
        self.domain.is_empty()
            && self.domain_suffix.is_empty()
            && self.domain_keyword.is_empty()
            && self.domain_regex.is_empty()
            && self.ip_cidr.is_empty()
            && self.source_ip_cidr.is_empty()
            && self.ip_is_private.is_none()
            && self.geoip.is_empty()
            && self.geosite.is_empty()
            && self.port.is_empty()
            && self.source_port.is_empty()
            && self.protocol.is_empty()
            && self.network.is_none()
            && self.rule_set.is_empty()
    }

    /// Copy this rule into a builder for editing.
    pub fn to_builder(&self) -> RouteRuleBuilder {
        RouteRuleBuilder { rule: self.clone() }
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn domain_suffix(&self) -> &[String] {
        &self.domain_suffix
    }

    pub fn domain_keyword(&self) -> &[String] {
        &self.domain_keyword
    }

    pub fn domain_regex(&self) -> &[String] {
        &self.domain_regex
    }

    pub fn ip_cidr(&self) -> &[IpNet] {
        &self.ip_cidr
    }

    pub fn source_ip_cidr(&self) -> &[IpNet] {
        &self.source_ip_cidr
    }

    pub fn ip_is_private(&self) -> Option<bool> {
        self.ip_is_private
    }

    pub fn geoip(&self) -> &[String] {
        &self.geoip
    }

    pub fn geosite(&self) -> &[String] {
        &self.geosite
    }

    pub fn port(&self) -> &[u16] {
        &self.port
    }

    pub fn source_port(&self) -> &[u16] {
        &self.source_port
    }

    pub fn protocol(&self) -> &[SniffProtocol] {
        &self.protocol
    }

    pub fn network(&self) -> Option<Network> {
        self.network
    }

    pub fn rule_set(&self) -> &[String] {
        &self.rule_set
    }

    pub fn outbound(&self) -> &OutboundType {
        &self.outbound
    }
}

/// Builder for [`RouteRule`].
///
/// Setters copy their inputs; `build` validates.
#[derive(Debug, Clone)]
pub struct RouteRuleBuilder {
    rule: RouteRule,
}

macro_rules! list_setters {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $name<I, T>(&mut self, values: I) -> &mut Self
            where
                I: IntoIterator<Item = T>,
                T: Into<$ty>,
            {
                self.rule.$name.extend(values.into_iter().map(Into::into));
                self
            }
        )*
    };
}

impl RouteRuleBuilder {
    pub fn new(outbound: OutboundType) -> Self {
        Self {
            rule: RouteRule::catch_all(outbound),
        }
    }

    list_setters! {
        domain: String,
        domain_suffix: String,
        domain_keyword: String,
        domain_regex: String,
        ip_cidr: IpNet,
        source_ip_cidr: IpNet,
        geoip: String,
        geosite: String,
        port: u16,
        source_port: u16,
        protocol: SniffProtocol,
        rule_set: String,
    }

    pub fn ip_is_private(&mut self, value: bool) -> &mut Self {
        self.rule.ip_is_private = Some(value);
        self
    }

    pub fn network(&mut self, network: Network) -> &mut Self {
        self.rule.network = Some(network);
        self
    }

    pub fn outbound(&mut self, outbound: OutboundType) -> &mut Self {
        self.rule.outbound = outbound;
        self
    }

    pub fn build(&self) -> Result<RouteRule, RouteError> {
        self.rule.validate()?;
        Ok(self.rule.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rule_is_catch_all() {
        let rule = RouteRule::builder(OutboundType::Direct).build().unwrap();
        assert!(rule.is_catch_all());
    }

    #[test]
    fn builder_sets_conditions() {
        let rule = RouteRule::builder(OutboundType::node("node_hk"))
            .domain_suffix(["google.com", "youtube.com"])
            .ip_cidr(["10.0.0.0/8".parse::<IpNet>().unwrap()])
            .port([443u16, 8443])
            .protocol([SniffProtocol::Tls])
            .network(Network::Tcp)
            .build()
            .unwrap();
        assert!(!rule.is_catch_all());
        assert_eq!(rule.domain_suffix(), ["google.com", "youtube.com"]);
        assert_eq!(rule.port(), [443, 8443]);
        assert_eq!(rule.network(), Some(Network::Tcp));
        assert_eq!(rule.outbound().node_sid(), Some("node_hk"));
    }

    #[test]
    fn invalid_outbound_rejected() {
        let err = RouteRule::builder(OutboundType::custom("custom_"))
            .domain(["a.com"])
            .build()
            .unwrap_err();
        assert_eq!(err, RouteError::InvalidOutbound("custom_".into()));
    }

    #[test]
    fn domain_regex_must_compile() {
        let err = RouteRule::builder(OutboundType::Block)
            .domain_regex([r"^ads\.", "([unclosed"])
            .build()
            .unwrap_err();
        assert!(matches!(err, RouteError::InvalidRegex { ref pattern, .. } if pattern == "([unclosed"));

        let rule = RouteRule::builder(OutboundType::Block)
            .domain_regex([r"^ads\.[a-z]+\.com$"])
            .build()
            .unwrap();
        assert_eq!(rule.domain_regex(), [r"^ads\.[a-z]+\.com$"]);
    }

    #[test]
    fn malformed_cidr_cannot_deserialize() {
        let json = serde_json::json!({"ip_cidr": ["10.0.0.0/33"], "outbound": "direct"});
        assert!(serde_json::from_value::<RouteRule>(json).is_err());
    }

    #[test]
    fn serde_shape() {
        let json = serde_json::json!({
            "geosite": ["cn"],
            "protocol": ["quic"],
            "network": "udp",
            "outbound": "block"
        });
        let rule: RouteRule = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(rule.protocol(), [SniffProtocol::Quic]);
        assert_eq!(serde_json::to_value(&rule).unwrap(), json);
    }

    #[test]
    fn to_builder_edits_copy() {
        let rule = RouteRule::builder(OutboundType::Proxy)
            .geoip(["cn"])
            .build()
            .unwrap();
        let edited = rule.to_builder().outbound(OutboundType::Direct).build().unwrap();
        assert_eq!(rule.outbound(), &OutboundType::Proxy);
        assert_eq!(edited.outbound(), &OutboundType::Direct);
        assert_eq!(edited.geoip(), ["cn"]);
    }
}
