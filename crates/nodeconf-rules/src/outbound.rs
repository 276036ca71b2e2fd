//! Outbound references used as rule actions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RouteError;

/// Prefix of node-reference outbounds; the full string is the node SID.
pub const NODE_PREFIX: &str = "node_";
/// Prefix of custom outbound tags.
pub const CUSTOM_PREFIX: &str = "custom_";

/// Where matched traffic goes.
///
/// Serialized as a plain string: `direct`, `block`, `proxy`, a node SID
/// (`node_<id>`) or a custom outbound tag (`custom_<tag>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutboundType {
    /// Connect directly.
    Direct,
    /// Drop the connection.
    Block,
    /// Use the node's default proxy path.
    Proxy,
    /// Chain through another node, by SID.
    Node(String),
    /// Use a custom outbound defined in the route config, by tag.
    Custom(String),
}

impl OutboundType {
    /// Node reference from a SID such as `node_a`.
    pub fn node(sid: impl Into<String>) -> Self {
        OutboundType::Node(sid.into())
    }

    /// Custom reference from a tag such as `custom_vpn1`.
    pub fn custom(tag: impl Into<String>) -> Self {
        OutboundType::Custom(tag.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            OutboundType::Direct => "direct",
            OutboundType::Block => "block",
            OutboundType::Proxy => "proxy",
            OutboundType::Node(sid) => sid,
            OutboundType::Custom(tag) => tag,
        }
    }

    pub fn is_preset(&self) -> bool {
        matches!(
            self,
            OutboundType::Direct | OutboundType::Block | OutboundType::Proxy
        )
    }

    /// Referenced node SID, if this is a node reference.
    pub fn node_sid(&self) -> Option<&str> {
        match self {
            OutboundType::Node(sid) => Some(sid),
            _ => None,
        }
    }

    /// Referenced custom outbound tag, if this is a custom reference.
    pub fn custom_tag(&self) -> Option<&str> {
        match self {
            OutboundType::Custom(tag) => Some(tag),
            _ => None,
        }
    }

    /// Check the reference shape: matching prefix and a non-empty suffix.
    pub fn validate(&self) -> Result<(), RouteError> {
        let ok = match self {
            OutboundType::Direct | OutboundType::Block | OutboundType::Proxy => true,
            OutboundType::Node(sid) => has_suffix(sid, NODE_PREFIX),
            OutboundType::Custom(tag) => has_suffix(tag, CUSTOM_PREFIX),
        };
        if ok {
            Ok(())
        } else {
            Err(RouteError::InvalidOutbound(self.as_str().to_string()))
        }
    }
}

fn has_suffix(value: &str, prefix: &str) -> bool {
    value
        .strip_prefix(prefix)
        .is_some_and(|suffix| !suffix.trim().is_empty())
}

impl fmt::Display for OutboundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutboundType {
    type Err = RouteError;

    /// Classify by prefix. A bare prefix (`node_`) parses but fails
    /// [`OutboundType::validate`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(OutboundType::Direct),
            "block" => Ok(OutboundType::Block),
            "proxy" => Ok(OutboundType::Proxy),
            _ if s.starts_with(NODE_PREFIX) => Ok(OutboundType::Node(s.to_string())),
            _ if s.starts_with(CUSTOM_PREFIX) => Ok(OutboundType::Custom(s.to_string())),
            _ => Err(RouteError::InvalidOutbound(s.to_string())),
        }
    }
}

impl TryFrom<String> for OutboundType {
    type Error = RouteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutboundType> for String {
    fn from(outbound: OutboundType) -> Self {
        match outbound {
            OutboundType::Node(s) | OutboundType::Custom(s) => s,
            preset => preset.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_shapes() {
        assert_eq!("direct".parse(), Ok(OutboundType::Direct));
        assert_eq!("block".parse(), Ok(OutboundType::Block));
        assert_eq!("proxy".parse(), Ok(OutboundType::Proxy));
        assert_eq!("node_a".parse(), Ok(OutboundType::node("node_a")));
        assert_eq!("custom_vpn1".parse(), Ok(OutboundType::custom("custom_vpn1")));
        assert_eq!(
            "reject".parse::<OutboundType>(),
            Err(RouteError::InvalidOutbound("reject".into()))
        );
    }

    #[test]
    fn bare_prefix_fails_validation() {
        let outbound: OutboundType = "node_".parse().unwrap();
        assert!(outbound.validate().is_err());
        assert!(OutboundType::custom("custom_ ").validate().is_err());
        assert!(OutboundType::custom("vpn").validate().is_err());
        assert!(OutboundType::node("node_hk").validate().is_ok());
    }

    #[test]
    fn accessors() {
        assert_eq!(OutboundType::node("node_x").node_sid(), Some("node_x"));
        assert_eq!(OutboundType::node("node_x").custom_tag(), None);
        assert_eq!(OutboundType::custom("custom_y").custom_tag(), Some("custom_y"));
        assert!(OutboundType::Block.is_preset());
        assert!(!OutboundType::custom("custom_y").is_preset());
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&OutboundType::node("node_a")).unwrap();
        assert_eq!(json, "\"node_a\"");
        let back: OutboundType = serde_json::from_str("\"direct\"").unwrap();
        assert_eq!(back, OutboundType::Direct);
        assert!(serde_json::from_str::<OutboundType>("\"warp\"").is_err());
    }
}
