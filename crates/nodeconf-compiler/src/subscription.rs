//! Subscription links for end-user clients.

use nodeconf_proto::{Credential, ProtocolConfig, UriTarget};
use tracing::warn;

use crate::node::NodeView;

/// Derive the credential a subscriber uses on `node`.
pub fn derive_credential<N: NodeView>(subscription_token: &str, node: &N) -> Credential {
    let credential =
        Credential::derive(subscription_token, node.token_hash(), node.protocol_config());
    if credential.is_empty() {
        warn!(node_id = %node.sid(), protocol = %node.protocol(), "credential derivation produced nothing");
    }
    credential
}

/// Share link for `node` at its advertised address and subscription port.
pub fn subscription_uri<N: NodeView>(node: &N, credential: &Credential, remarks: &str) -> String {
    let target = UriTarget::new(
        node.effective_server_address(),
        node.subscription_port(),
        remarks,
    );
    node.protocol_config().subscription_uri(&target, credential)
}

/// VMess base64 JSON link; `None` for other protocols.
pub fn vmess_json_uri<N: NodeView>(
    node: &N,
    credential: &Credential,
    remarks: &str,
) -> Option<String> {
    let ProtocolConfig::Vmess(config) = node.protocol_config() else {
        return None;
    };
    let target = UriTarget::new(
        node.effective_server_address(),
        node.subscription_port(),
        remarks,
    );
    Some(config.to_json_uri(&target, credential))
}

#[cfg(test)]
mod tests {
    use nodeconf_proto::{TrojanConfig, TrojanParams, VmessConfig, VmessParams};

    use super::*;
    use crate::node::Node;

    #[test]
    fn uses_public_address_and_subscription_port() {
        let config = ProtocolConfig::Trojan(TrojanConfig::new(TrojanParams::default()).unwrap());
        let node = Node::new("node_a", "10.0.0.1", 443, "tok", config)
            .with_public_address("edge.example.com")
            .with_subscription_port(8443);
        let uri = subscription_uri(&node, &Credential::password("pw"), "Edge");
        assert_eq!(uri, "trojan://pw@edge.example.com:8443?security=tls&type=tcp#Edge");
        assert!(vmess_json_uri(&node, &Credential::password("pw"), "Edge").is_none());
    }

    #[test]
    fn derived_credential_is_per_subscriber() {
        let config = ProtocolConfig::Trojan(TrojanConfig::new(TrojanParams::default()).unwrap());
        let node = Node::new("node_a", "10.0.0.1", 443, "tok", config);
        let a = derive_credential("sub-a", &node);
        let b = derive_credential("sub-b", &node);
        assert_ne!(a, b);
        assert_eq!(a.password.len(), 64);
        assert!(derive_credential("", &node).is_empty());
    }

    #[test]
    fn vmess_json_link() {
        let config = ProtocolConfig::Vmess(VmessConfig::new(VmessParams::default()).unwrap());
        let node = Node::new("node_vm", "10.0.0.1", 10086, "tok", config);
        let credential = derive_credential("sub", &node);
        let uri = vmess_json_uri(&node, &credential, "VM").unwrap();
        assert!(uri.starts_with("vmess://"));
    }
}
