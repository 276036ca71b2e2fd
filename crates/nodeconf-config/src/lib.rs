//! Node manifest loading and CLI definitions.
//!
//! A manifest bundles the node to compile, the nodes it references, and
//! logging and sync settings. It can be written as JSON (comments allowed),
//! YAML or TOML:
//!
//! ```toml
//! [node]
//! sid = "node_tokyo"
//! server_address = "203.0.113.7"
//! agent_port = 443
//! token_hash = "..."
//!
//! [node.protocol_config]
//! protocol = "trojan"
//!
//! [logging]
//! level = "debug"
//! ```

mod cli;
mod defaults;
mod loader;
mod types;
mod validate;
mod writer;

pub use cli::{CliOverrides, apply_overrides};
pub use loader::{ConfigError, load_manifest};
pub use types::{LoggingConfig, NodeManifest, SyncConfig};
pub use validate::validate_manifest;
pub use writer::write_document;
