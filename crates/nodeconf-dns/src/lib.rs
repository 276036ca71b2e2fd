//! DNS model for nodeconf.
//!
//! A [`DnsConfig`] lists upstream [`DnsServer`]s, [`DnsRule`]s that pick a
//! server per query, and a final server. Servers may be reached through a
//! detour outbound, including another node, which is why the compiler asks
//! this crate for [`DnsConfig::referenced_node_sids`].

pub mod config;
pub mod error;
pub mod rule;
pub mod server;

pub use config::{DnsConfig, DnsConfigBuilder};
pub use error::DnsError;
pub use rule::{DnsRule, DnsRuleBuilder};
pub use server::{DnsServer, DnsStrategy, validate_address};
