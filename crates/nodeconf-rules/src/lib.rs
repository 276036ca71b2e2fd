//! Routing model for nodeconf.
//!
//! Describes how a node routes proxied traffic: an ordered list of
//! [`RouteRule`]s evaluated first-match-wins by the proxy server, a final
//! action, user-defined [`CustomOutbound`]s and remote [`RuleSetEntry`]s.
//!
//! This crate validates structure and cross references only; matching is
//! the proxy server's job.
//!
//! # Example
//!
//! ```
//! use nodeconf_rules::{OutboundType, RouteConfig, RouteRule};
//!
//! let mut builder = RouteConfig::builder(OutboundType::Proxy);
//! builder
//!     .add_rule(
//!         RouteRule::builder(OutboundType::Direct)
//!             .geosite(["cn"])
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap()
//!     .add_rule(
//!         RouteRule::builder(OutboundType::node("node_hk"))
//!             .domain_suffix(["openai.com"])
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let config = builder.build().unwrap();
//! assert_eq!(config.referenced_node_sids(), ["node_hk"]);
//! ```

pub mod config;
pub mod custom;
pub mod error;
pub mod outbound;
pub mod rule;
pub mod rule_set;

pub use config::{RouteConfig, RouteConfigBuilder};
pub use custom::{CUSTOM_PROTOCOLS, CustomOutbound};
pub use error::RouteError;
pub use outbound::{CUSTOM_PREFIX, NODE_PREFIX, OutboundType};
pub use rule::{Network, RouteRule, RouteRuleBuilder, SniffProtocol};
pub use rule_set::{RuleSetEntry, RuleSetFormat, RuleSetParams, is_valid_interval};
