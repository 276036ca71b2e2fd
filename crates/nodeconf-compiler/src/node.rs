//! Read-only view of a node aggregate.

use nodeconf_dns::DnsConfig;
use nodeconf_proto::{Protocol, ProtocolConfig};
use nodeconf_rules::RouteConfig;
use serde::{Deserialize, Serialize};

/// What the compiler needs to know about a node.
///
/// Persistence layers implement this for their own aggregate; [`Node`] is
/// the serde-loadable implementation used by manifests and tests.
pub trait NodeView {
    /// Node SID, e.g. `node_tokyo1`.
    fn sid(&self) -> &str;

    fn protocol_config(&self) -> &ProtocolConfig;

    /// Always agrees with [`NodeView::protocol_config`].
    fn protocol(&self) -> Protocol {
        self.protocol_config().protocol()
    }

    /// Address clients and peer nodes connect to.
    fn effective_server_address(&self) -> &str;

    /// Port the proxy server listens on.
    fn agent_port(&self) -> u16;

    /// Port advertised in subscription links.
    fn subscription_port(&self) -> u16;

    /// Secret the node's server keys are derived from.
    fn token_hash(&self) -> &str;

    fn route_config(&self) -> Option<&RouteConfig>;

    fn dns_config(&self) -> Option<&DnsConfig>;
}

/// A node as stored in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub sid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub server_address: String,
    /// Overrides `server_address` for clients, e.g. behind NAT or a CDN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_address: Option<String>,
    pub agent_port: u16,
    /// Defaults to `agent_port`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_port: Option<u16>,
    #[serde(default)]
    pub token_hash: String,
    pub protocol_config: ProtocolConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsConfig>,
}

impl Node {
    pub fn new(
        sid: impl Into<String>,
        server_address: impl Into<String>,
        agent_port: u16,
        token_hash: impl Into<String>,
        protocol_config: ProtocolConfig,
    ) -> Self {
        Self {
            sid: sid.into(),
            name: String::new(),
            server_address: server_address.into(),
            public_address: None,
            agent_port,
            subscription_port: None,
            token_hash: token_hash.into(),
            protocol_config,
            route: None,
            dns: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_public_address(mut self, address: impl Into<String>) -> Self {
        self.public_address = Some(address.into());
        self
    }

    pub fn with_subscription_port(mut self, port: u16) -> Self {
        self.subscription_port = Some(port);
        self
    }

    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.route = Some(route);
        self
    }

    pub fn with_dns(mut self, dns: DnsConfig) -> Self {
        self.dns = Some(dns);
        self
    }

    /// Display name, falling back to the SID.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.sid
        } else {
            &self.name
        }
    }
}

impl NodeView for Node {
    fn sid(&self) -> &str {
        &self.sid
    }

    fn protocol_config(&self) -> &ProtocolConfig {
        &self.protocol_config
    }

    fn effective_server_address(&self) -> &str {
        match self.public_address.as_deref() {
            Some(addr) if !addr.is_empty() => addr,
            _ => &self.server_address,
        }
    }

    fn agent_port(&self) -> u16 {
        self.agent_port
    }

    fn subscription_port(&self) -> u16 {
        self.subscription_port.unwrap_or(self.agent_port)
    }

    fn token_hash(&self) -> &str {
        &self.token_hash
    }

    fn route_config(&self) -> Option<&RouteConfig> {
        self.route.as_ref()
    }

    fn dns_config(&self) -> Option<&DnsConfig> {
        self.dns.as_ref()
    }
}
