//! DNS configuration: servers, rules and the final server.

use std::collections::HashSet;

use nodeconf_core::defaults::{MAX_DNS_RULES, MAX_DNS_SERVERS};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DnsError;
use crate::rule::DnsRule;
use crate::server::{DnsServer, DnsStrategy};

/// A node's DNS setup.
///
/// Deserialized configs skip the setters, so [`DnsConfig::validate`]
/// repeats every check they make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsConfig {
    #[serde(default)]
    servers: Vec<DnsServer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    rules: Vec<DnsRule>,
    #[serde(rename = "final")]
    final_server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    strategy: Option<DnsStrategy>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    disable_cache: bool,
}

impl DnsConfig {
    /// Empty config whose unmatched queries go to `final_server`.
    pub fn new(final_server: impl Into<String>) -> Self {
        Self {
            servers: Vec::new(),
            rules: Vec::new(),
            final_server: final_server.into(),
            strategy: None,
            disable_cache: false,
        }
    }

    pub fn builder(final_server: impl Into<String>) -> DnsConfigBuilder {
        DnsConfigBuilder::new(final_server)
    }

    pub fn to_builder(&self) -> DnsConfigBuilder {
        DnsConfigBuilder {
            config: self.clone(),
        }
    }

    pub fn servers(&self) -> &[DnsServer] {
        &self.servers
    }

    pub fn rules(&self) -> &[DnsRule] {
        &self.rules
    }

    pub fn final_server(&self) -> &str {
        &self.final_server
    }

    pub fn strategy(&self) -> Option<DnsStrategy> {
        self.strategy
    }

    pub fn disable_cache(&self) -> bool {
        self.disable_cache
    }

    pub fn server(&self, tag: &str) -> Option<&DnsServer> {
        self.servers.iter().find(|s| s.tag() == tag)
    }

    /// Check the whole config.
    ///
    /// Fails when limits are exceeded, a server or rule is malformed,
    /// server tags repeat, or a resolver, rule or `final` names a server
    /// that is not defined.
    pub fn validate(&self) -> Result<(), DnsError> {
        if self.servers.len() > MAX_DNS_SERVERS {
            return Err(DnsError::TooManyServers {
                count: self.servers.len(),
                max: MAX_DNS_SERVERS,
            });
        }
        if self.rules.len() > MAX_DNS_RULES {
            return Err(DnsError::TooManyRules {
                count: self.rules.len(),
                max: MAX_DNS_RULES,
            });
        }

        let mut tags = HashSet::new();
        for server in &self.servers {
            server.validate()?;
            if !tags.insert(server.tag()) {
                return Err(DnsError::DuplicateTag(server.tag().to_string()));
            }
        }
        for server in &self.servers {
            if let Some(resolver) = server.address_resolver()
                && !tags.contains(resolver)
            {
                return Err(DnsError::UndefinedServer {
                    location: format!("server {} address_resolver", server.tag()),
                    tag: resolver.to_string(),
                });
            }
        }

        for (index, rule) in self.rules.iter().enumerate() {
            rule.validate_at(index)?;
            if !tags.contains(rule.server()) {
                return Err(DnsError::UndefinedServer {
                    location: format!("rule[{index}]"),
                    tag: rule.server().to_string(),
                });
            }
        }

        if !tags.contains(self.final_server.as_str()) {
            return Err(DnsError::UndefinedServer {
                location: "final".to_string(),
                tag: self.final_server.clone(),
            });
        }
        Ok(())
    }

    /// Node SIDs used as server detours, deduplicated in first-seen order.
    pub fn referenced_node_sids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.servers
            .iter()
            .filter_map(|s| s.detour().and_then(|d| d.node_sid()))
            .filter(|sid| seen.insert(*sid))
            .map(str::to_string)
            .collect()
    }

    pub fn has_node_references(&self) -> bool {
        self.servers
            .iter()
            .any(|s| s.detour().is_some_and(|d| d.node_sid().is_some()))
    }

    /// Custom outbound tags used as server detours, deduplicated.
    pub fn referenced_custom_tags(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.servers
            .iter()
            .filter_map(|s| s.detour().and_then(|d| d.custom_tag()))
            .filter(|tag| seen.insert(*tag))
            .map(str::to_string)
            .collect()
    }
}

/// Builder for [`DnsConfig`].
///
/// `set_servers` and `add_server` reject duplicate tags up front; failed
/// calls leave the builder unchanged.
#[derive(Debug, Clone)]
pub struct DnsConfigBuilder {
    config: DnsConfig,
}

impl DnsConfigBuilder {
    pub fn new(final_server: impl Into<String>) -> Self {
        Self {
            config: DnsConfig::new(final_server),
        }
    }

    pub fn final_server(&mut self, tag: impl Into<String>) -> &mut Self {
        self.config.final_server = tag.into();
        self
    }

    pub fn strategy(&mut self, strategy: DnsStrategy) -> &mut Self {
        self.config.strategy = Some(strategy);
        self
    }

    pub fn disable_cache(&mut self, disable: bool) -> &mut Self {
        self.config.disable_cache = disable;
        self
    }

    /// Replace all servers.
    pub fn set_servers(&mut self, servers: Vec<DnsServer>) -> Result<&mut Self, DnsError> {
        if servers.len() > MAX_DNS_SERVERS {
            return Err(DnsError::TooManyServers {
                count: servers.len(),
                max: MAX_DNS_SERVERS,
            });
        }
        let mut tags = HashSet::new();
        for server in &servers {
            server.validate()?;
            if !tags.insert(server.tag()) {
                return Err(DnsError::DuplicateTag(server.tag().to_string()));
            }
        }
        self.config.servers = servers;
        Ok(self)
    }

    pub fn add_server(&mut self, server: DnsServer) -> Result<&mut Self, DnsError> {
        if self.config.servers.len() >= MAX_DNS_SERVERS {
            return Err(DnsError::TooManyServers {
                count: self.config.servers.len() + 1,
                max: MAX_DNS_SERVERS,
            });
        }
        server.validate()?;
        if self.config.server(server.tag()).is_some() {
            return Err(DnsError::DuplicateTag(server.tag().to_string()));
        }
        self.config.servers.push(server);
        Ok(self)
    }

    pub fn add_rule(&mut self, rule: DnsRule) -> Result<&mut Self, DnsError> {
        let index = self.config.rules.len();
        if index >= MAX_DNS_RULES {
            return Err(DnsError::TooManyRules {
                count: index + 1,
                max: MAX_DNS_RULES,
            });
        }
        rule.validate_at(index)?;
        self.config.rules.push(rule);
        Ok(self)
    }

    pub fn build(&self) -> Result<DnsConfig, DnsError> {
        self.config.validate()?;
        debug!(
            servers = self.config.servers.len(),
            rules = self.config.rules.len(),
            final_server = %self.config.final_server,
            "built dns config"
        );
        Ok(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use nodeconf_rules::OutboundType;

    use super::*;

    fn server(tag: &str) -> DnsServer {
        DnsServer::new(tag, "8.8.8.8")
    }

    #[test]
    fn undefined_final() {
        let err = DnsConfig::new("remote").validate().unwrap_err();
        assert_eq!(err.to_string(), "final references undefined server tag: remote");
    }

    #[test]
    fn valid_config() {
        let mut builder = DnsConfig::builder("remote");
        builder
            .add_server(DnsServer::new("local", "local"))
            .unwrap()
            .add_server(
                DnsServer::new("remote", "https://dns.google/dns-query")
                    .with_address_resolver("local")
                    .with_detour(OutboundType::node("node_us")),
            )
            .unwrap()
            .add_rule(DnsRule::builder("local").geosite(["cn"]).build().unwrap())
            .unwrap();
        let config = builder.build().unwrap();
        assert_eq!(config.servers().len(), 2);
        assert_eq!(config.referenced_node_sids(), ["node_us"]);
        assert!(config.has_node_references());
    }

    #[test]
    fn undefined_rule_server() {
        let mut builder = DnsConfig::builder("a");
        builder.add_server(server("a")).unwrap();
        builder.add_rule(DnsRule::builder("b").build().unwrap()).unwrap();
        assert_eq!(
            builder.build().unwrap_err().to_string(),
            "rule[0] references undefined server tag: b"
        );
    }

    #[test]
    fn undefined_resolver() {
        let mut config = DnsConfig::new("a");
        config.servers = vec![server("a").with_address_resolver("ghost")];
        assert!(matches!(
            config.validate(),
            Err(DnsError::UndefinedServer { ref tag, .. }) if tag == "ghost"
        ));
    }

    #[test]
    fn duplicate_tags_in_setters_and_validate() {
        let mut builder = DnsConfig::builder("a");
        assert!(matches!(
            builder.set_servers(vec![server("a"), server("a")]),
            Err(DnsError::DuplicateTag(_))
        ));
        builder.add_server(server("a")).unwrap();
        assert!(builder.add_server(server("a")).is_err());

        let mut config = DnsConfig::new("a");
        config.servers = vec![server("a"), server("a")];
        assert_eq!(config.validate(), Err(DnsError::DuplicateTag("a".into())));
    }

    #[test]
    fn server_limit() {
        let servers: Vec<DnsServer> = (0..=MAX_DNS_SERVERS).map(|i| server(&format!("s{i}"))).collect();
        let mut builder = DnsConfig::builder("s0");
        assert!(matches!(
            builder.set_servers(servers.clone()),
            Err(DnsError::TooManyServers { .. })
        ));
        builder.set_servers(servers[..MAX_DNS_SERVERS].to_vec()).unwrap();
        assert!(builder.add_server(server("extra")).is_err());
        assert!(builder.build().is_ok());
    }

    #[test]
    fn rule_limit() {
        let mut config = DnsConfig::new("a");
        config.servers = vec![server("a")];
        config.rules = (0..=MAX_DNS_RULES)
            .map(|_| DnsRule::builder("a").build().unwrap())
            .collect();
        assert!(matches!(config.validate(), Err(DnsError::TooManyRules { .. })));
    }

    #[test]
    fn custom_detours() {
        let mut config = DnsConfig::new("a");
        config.servers = vec![
            server("a").with_detour(OutboundType::custom("custom_x")),
            server("b").with_detour(OutboundType::custom("custom_x")),
            server("c").with_detour(OutboundType::Direct),
        ];
        assert_eq!(config.referenced_custom_tags(), ["custom_x"]);
        assert!(!config.has_node_references());
    }

    #[test]
    fn serde_final_key() {
        let config: DnsConfig = serde_json::from_value(serde_json::json!({
            "servers": [{"tag": "local", "address": "local"}],
            "final": "local",
            "strategy": "prefer_ipv4"
        }))
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.strategy(), Some(DnsStrategy::PreferIpv4));
        assert_eq!(serde_json::to_value(&config).unwrap()["final"], "local");
    }
}
