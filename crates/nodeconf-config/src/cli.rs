//! CLI override definitions and application logic.

use clap::Parser;

use crate::NodeManifest;

#[derive(Debug, Clone, Parser, Default)]
pub struct CliOverrides {
    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
    /// Override log format (pretty/compact/json)
    #[arg(long)]
    pub log_format: Option<String>,
    /// Override the node's server address
    #[arg(long)]
    pub server_address: Option<String>,
    /// Override the node's public address advertised to clients
    #[arg(long)]
    pub public_address: Option<String>,
    /// Override the node's agent port
    #[arg(long)]
    pub agent_port: Option<u16>,
    /// Override the config sync version
    #[arg(long)]
    pub sync_version: Option<u64>,
    /// Send an incremental rather than full sync
    #[arg(long)]
    pub incremental: bool,
}

pub fn apply_overrides(manifest: &mut NodeManifest, overrides: &CliOverrides) {
    if let Some(v) = &overrides.log_level {
        manifest.logging.level = v.clone();
    }
    if let Some(v) = &overrides.log_format {
        manifest.logging.format = v.clone();
    }
    if let Some(v) = &overrides.server_address {
        manifest.node.server_address = v.clone();
    }
    if let Some(v) = &overrides.public_address {
        manifest.node.public_address = Some(v.clone());
    }
    if let Some(v) = overrides.agent_port {
        manifest.node.agent_port = v;
    }
    if let Some(v) = overrides.sync_version {
        manifest.sync.version = v;
    }
    if overrides.incremental {
        manifest.sync.full_sync = false;
    }
}
