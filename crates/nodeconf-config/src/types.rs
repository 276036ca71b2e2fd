//! Manifest types.

use std::collections::HashMap;

use nodeconf_compiler::Node;
use serde::{Deserialize, Serialize};

use crate::defaults::*;

/// Everything needed to compile one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeManifest {
    pub node: Node,
    /// Nodes the route or DNS config points at.
    #[serde(default)]
    pub referenced_nodes: Vec<Node>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format: json, pretty, or compact.
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Output target: stdout or stderr.
    #[serde(default = "default_log_output")]
    pub output: String,
    /// Per-module log level filters (e.g., {"nodeconf_compiler": "debug"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            output: default_log_output(),
            filters: HashMap::new(),
        }
    }
}

/// Hub push settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_sync_version")]
    pub version: u64,
    #[serde(default = "default_full_sync")]
    pub full_sync: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            version: default_sync_version(),
            full_sync: default_full_sync(),
        }
    }
}
