//! Config compiler for nodeconf.
//!
//! Turns a node aggregate (anything implementing [`NodeView`]) plus the
//! nodes it references into either a REST [`NodeConfigResponse`] or a hub
//! `config_sync` message, and renders per-subscriber share links.
//!
//! # Example
//!
//! ```
//! use nodeconf_compiler::{Node, compile_node_config};
//! use nodeconf_proto::{ProtocolConfig, TrojanConfig, TrojanParams};
//!
//! let config = ProtocolConfig::Trojan(TrojanConfig::new(TrojanParams::default()).unwrap());
//! let node = Node::new("node_tokyo", "203.0.113.7", 443, "token", config);
//! let doc = compile_node_config(Some(&node), &[]).unwrap().unwrap();
//! assert_eq!(doc.base.node_id, "node_tokyo");
//! assert_eq!(doc.base.transport_protocol, "tcp");
//! ```

pub mod compile;
pub mod dto;
pub mod error;
pub mod node;
pub mod outbound;
pub mod subscription;

pub use compile::{ConfigSyncMessage, compile_config_sync, compile_node_config, referenced_sids};
pub use dto::{
    DnsConfigDto, HubNodeConfig, NodeConfigBase, NodeConfigResponse, ProtocolExtensions,
    ProtocolFields, RouteConfigDto,
};
pub use error::CompileError;
pub use node::{Node, NodeView};
pub use outbound::OutboundDto;
pub use subscription::{derive_credential, subscription_uri, vmess_json_uri};
