//! Manifest validation logic.

use std::collections::HashSet;

use nodeconf_compiler::Node;
use nodeconf_core::host::is_valid_host;
use nodeconf_rules::NODE_PREFIX;

use crate::NodeManifest;
use crate::loader::ConfigError;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json"];
const LOG_OUTPUTS: &[&str] = &["stdout", "stderr"];

/// Check manifest-level invariants. Protocol, route and DNS configs are
/// checked by the compiler.
pub fn validate_manifest(manifest: &NodeManifest) -> Result<(), ConfigError> {
    validate_node("node", &manifest.node)?;

    let mut seen = HashSet::new();
    for (i, node) in manifest.referenced_nodes.iter().enumerate() {
        validate_node(&format!("referenced_nodes[{i}]"), node)?;
        if node.sid == manifest.node.sid {
            return Err(ConfigError::Validation(format!(
                "referenced_nodes[{i}].sid is the compiled node itself: {}",
                node.sid
            )));
        }
        if !seen.insert(node.sid.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate referenced node sid: {}",
                node.sid
            )));
        }
    }

    let logging = &manifest.logging;
    if !LOG_LEVELS.contains(&logging.level.as_str()) {
        return Err(ConfigError::Validation(format!(
            "logging.level must be one of: {:?}",
            LOG_LEVELS
        )));
    }
    if !LOG_FORMATS.contains(&logging.format.as_str()) {
        return Err(ConfigError::Validation(format!(
            "logging.format must be one of: {:?}",
            LOG_FORMATS
        )));
    }
    if !LOG_OUTPUTS.contains(&logging.output.as_str()) {
        return Err(ConfigError::Validation(format!(
            "logging.output must be one of: {:?}",
            LOG_OUTPUTS
        )));
    }
    if manifest.sync.version == 0 {
        return Err(ConfigError::Validation("sync.version must be > 0".into()));
    }
    Ok(())
}

fn validate_node(location: &str, node: &Node) -> Result<(), ConfigError> {
    if node.sid.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{location}.sid is empty")));
    }
    if !node.sid.starts_with(NODE_PREFIX) || node.sid.len() == NODE_PREFIX.len() {
        return Err(ConfigError::Validation(format!(
            "{location}.sid must look like {NODE_PREFIX}<id>: {}",
            node.sid
        )));
    }
    if !is_valid_host(&node.server_address) {
        return Err(ConfigError::Validation(format!(
            "{location}.server_address is not a host: {}",
            node.server_address
        )));
    }
    if let Some(addr) = &node.public_address
        && !addr.is_empty()
        && !is_valid_host(addr)
    {
        return Err(ConfigError::Validation(format!(
            "{location}.public_address is not a host: {addr}"
        )));
    }
    if node.agent_port == 0 {
        return Err(ConfigError::Validation(format!(
            "{location}.agent_port must be > 0"
        )));
    }
    if node.subscription_port == Some(0) {
        return Err(ConfigError::Validation(format!(
            "{location}.subscription_port must be > 0"
        )));
    }
    Ok(())
}
