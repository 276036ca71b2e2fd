//! Node config compilation.
//!
//! Both entry points run the same pipeline: protocol fields, route and DNS
//! sections, then outbounds for every referenced node and custom outbound.
//! Any failure aborts the whole document.

use std::collections::HashSet;

use nodeconf_auth::{derive_password, derive_ss_password, derive_trojan_password};
use nodeconf_hub::{ConfigSyncData, HubMessage, SyncOptions};
use nodeconf_proto::{ProtocolConfig, VlessSecurity};
use tracing::{debug, warn};

use crate::dto::{
    DnsConfigDto, HubNodeConfig, NodeConfigBase, NodeConfigResponse, ProtocolExtensions,
    ProtocolFields, RouteConfigDto, non_empty,
};
use crate::error::CompileError;
use crate::node::NodeView;
use crate::outbound::{custom_outbound, node_outbound};

/// Push message produced by [`compile_config_sync`].
pub type ConfigSyncMessage = HubMessage<ConfigSyncData<HubNodeConfig>>;

/// Compile the REST config document for `node`.
///
/// `referenced` must contain every node the route or DNS config points at;
/// extra entries are ignored. `None` yields `Ok(None)`.
pub fn compile_node_config<N: NodeView>(
    node: Option<&N>,
    referenced: &[N],
) -> Result<Option<NodeConfigResponse>, CompileError> {
    let Some(node) = node else {
        return Ok(None);
    };
    let base = compile_base(node, referenced)?;
    Ok(Some(NodeConfigResponse { base }))
}

/// Compile the hub `config_sync` message for `node`.
pub fn compile_config_sync<N: NodeView>(
    node: Option<&N>,
    referenced: &[N],
    sync: SyncOptions,
) -> Result<Option<ConfigSyncMessage>, CompileError> {
    let Some(node) = node else {
        return Ok(None);
    };
    let base = compile_base(node, referenced)?;
    let extensions = protocol_extensions(node.protocol_config());
    debug!(
        node_id = %node.sid(),
        version = sync.version,
        full_sync = sync.full_sync,
        "compiled config sync"
    );
    Ok(Some(HubMessage::config_sync(
        node.sid(),
        sync,
        HubNodeConfig { base, extensions },
    )))
}

fn compile_base<N: NodeView>(node: &N, referenced: &[N]) -> Result<NodeConfigBase, CompileError> {
    let config = node.protocol_config();
    let sid = node.sid();
    debug!(node_id = %sid, protocol = %config.protocol(), "compiling node config");

    config.validate()?;
    let fields = protocol_fields(node);

    let route = match node.route_config() {
        Some(route) => {
            route.validate()?;
            Some(route)
        }
        None => None,
    };
    let dns = match node.dns_config() {
        Some(dns) => {
            dns.validate()?;
            for tag in dns.referenced_custom_tags() {
                if route.and_then(|r| r.custom_outbound(&tag)).is_none() {
                    return Err(CompileError::UndefinedDnsDetour(tag));
                }
            }
            Some(dns)
        }
        None => None,
    };

    let mut outbounds = Vec::new();
    for ref_sid in referenced_sids(node) {
        let target = referenced
            .iter()
            .find(|n| n.sid() == ref_sid)
            .ok_or_else(|| CompileError::MissingReferencedNode(ref_sid.clone()))?;
        outbounds.push(node_outbound(target)?);
    }
    if let Some(route) = route {
        outbounds.extend(route.custom_outbounds().iter().map(custom_outbound));
    }
    debug!(node_id = %sid, outbounds = outbounds.len(), "resolved outbounds");

    Ok(NodeConfigBase {
        node_id: sid.to_string(),
        protocol: config.protocol(),
        server_host: node.effective_server_address().to_string(),
        server_port: node.agent_port(),
        transport_protocol: config.transport_protocol().to_string(),
        fields,
        route: route.map(RouteConfigDto::from),
        dns: dns.map(DnsConfigDto::from),
        outbounds: (!outbounds.is_empty()).then_some(outbounds),
    })
}

/// Node SIDs referenced by the route config then the DNS detours,
/// deduplicated in first-seen order.
pub fn referenced_sids<N: NodeView>(node: &N) -> Vec<String> {
    let mut sids = node
        .route_config()
        .map(|r| r.referenced_node_sids())
        .unwrap_or_default();
    if let Some(dns) = node.dns_config() {
        let mut seen: HashSet<String> = sids.iter().cloned().collect();
        sids.extend(
            dns.referenced_node_sids()
                .into_iter()
                .filter(|sid| seen.insert(sid.clone())),
        );
    }
    sids
}

fn protocol_fields<N: NodeView>(node: &N) -> ProtocolFields {
    let token = node.token_hash();
    let mut fields = ProtocolFields::default();

    match node.protocol_config() {
        ProtocolConfig::Shadowsocks(c) => {
            fields.method = Some(c.method().to_string());
            fields.password = derived(node, derive_ss_password(token, c.method()));
            fields.plugin = non_empty(c.plugin());
            fields.plugin_opts = non_empty(c.plugin_opts());
        }
        ProtocolConfig::Trojan(c) => {
            fields.password = derived(node, derive_trojan_password(token));
            fields.set_transport(c.transport());
        }
        ProtocolConfig::Vless(c) => fields.set_transport(c.transport()),
        ProtocolConfig::Vmess(c) => fields.set_transport(c.transport()),
        ProtocolConfig::Hysteria2(_) => {}
        ProtocolConfig::Tuic(c) => {
            fields.uuid = Some(c.uuid().to_string());
            fields.password = derived(node, derive_password(token));
        }
        ProtocolConfig::AnyTls(c) => {
            fields.password = Some(c.password().to_string());
            fields.idle_session_check_interval = Some(c.idle_session_check_interval_secs());
            fields.idle_session_timeout = Some(c.idle_session_timeout_secs());
            fields.min_idle_session = Some(c.min_idle_session());
        }
    }

    if let Some(tls) = node.protocol_config().tls() {
        fields.sni = non_empty(&tls.sni);
        fields.fingerprint = non_empty(&tls.fingerprint);
        fields.allow_insecure = tls.allow_insecure.then_some(true);
    }
    if let ProtocolConfig::Vless(c) = node.protocol_config()
        && c.security() == VlessSecurity::Reality
    {
        fields.fingerprint = Some(c.effective_fingerprint().to_string());
    }
    fields
}

/// A node's own server key. An empty token still compiles but leaves the
/// key out.
fn derived<N: NodeView>(node: &N, secret: String) -> Option<String> {
    if secret.is_empty() {
        warn!(
            node_id = %node.sid(),
            protocol = %node.protocol(),
            "server key derivation produced nothing, token is empty"
        );
        return None;
    }
    Some(secret)
}

fn protocol_extensions(config: &ProtocolConfig) -> ProtocolExtensions {
    let mut ext = ProtocolExtensions::default();
    match config {
        ProtocolConfig::Shadowsocks(_) | ProtocolConfig::Trojan(_) => {}
        ProtocolConfig::Vless(c) => {
            ext.flow = non_empty(c.flow());
            ext.security = Some(c.security().as_str().to_string());
            if c.security() == VlessSecurity::Reality {
                let reality = c.reality();
                ext.reality_public_key = non_empty(&reality.public_key);
                ext.reality_private_key = non_empty(&reality.private_key);
                ext.reality_short_id = non_empty(&reality.short_id);
                ext.reality_spider_x = non_empty(&reality.spider_x);
            }
            if c.security() != VlessSecurity::None {
                ext.alpn = c.tls().alpn.clone();
            }
        }
        ProtocolConfig::Vmess(c) => {
            ext.alter_id = Some(c.alter_id());
            ext.security = Some(c.security().as_str().to_string());
            if let Some(tls) = c.tls() {
                ext.alpn = tls.alpn.clone();
            }
        }
        ProtocolConfig::Hysteria2(c) => {
            ext.congestion_control = Some(c.congestion_control().as_str().to_string());
            ext.obfs = c.obfs().map(str::to_string);
            ext.obfs_password = c.obfs_password().map(str::to_string);
            ext.up_mbps = c.up_mbps();
            ext.down_mbps = c.down_mbps();
            ext.alpn = c.tls().alpn.clone();
        }
        ProtocolConfig::Tuic(c) => {
            ext.congestion_control = Some(c.congestion_control().as_str().to_string());
            ext.udp_relay_mode = Some(c.udp_relay_mode().as_str().to_string());
            ext.alpn = c.effective_alpn();
            ext.disable_sni = c.disable_sni().then_some(true);
        }
        ProtocolConfig::AnyTls(c) => ext.alpn = c.tls().alpn.clone(),
    }
    ext
}
