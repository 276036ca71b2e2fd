//! # nodeconf
//!
//! Compiles proxy node definitions into the configuration documents that
//! node agents consume.
//!
//! ## Crates
//!
//! - [`nodeconf_core`] - Defaults, cipher tables and shared helpers
//! - [`nodeconf_auth`] - Credential derivation and Reality keys
//! - [`nodeconf_proto`] - Protocol configs and subscription links
//! - [`nodeconf_rules`] - Routing rules and outbound references
//! - [`nodeconf_dns`] - DNS servers and rules
//! - [`nodeconf_hub`] - Hub push-message schema
//! - [`nodeconf_compiler`] - REST and hub document compiler
//! - [`nodeconf_config`] - Manifest loading and validation

pub mod cli;

pub use nodeconf_auth as auth;
pub use nodeconf_compiler as compiler;
pub use nodeconf_config as config;
pub use nodeconf_core as core;
pub use nodeconf_dns as dns;
pub use nodeconf_hub as hub;
pub use nodeconf_proto as proto;
pub use nodeconf_rules as rules;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use nodeconf_compiler::{
        CompileError, Node, NodeView, compile_config_sync, compile_node_config, subscription_uri,
    };
    pub use nodeconf_config::{NodeManifest, load_manifest, validate_manifest};
    pub use nodeconf_dns::DnsConfig;
    pub use nodeconf_proto::{Credential, ProtocolConfig};
    pub use nodeconf_rules::RouteConfig;
}
