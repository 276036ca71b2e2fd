//! Manifest file loading and error types.

use std::{fs, path::Path};

use tracing::debug;

use crate::NodeManifest;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config format")]
    UnsupportedFormat,
    #[error("validation: {0}")]
    Validation(String),
}

/// Load a manifest, picking the parser from the file extension.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<NodeManifest, ConfigError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)?;
    let manifest: NodeManifest = match path.extension().and_then(|s| s.to_str()).unwrap_or("") {
        "json" | "jsonc" => {
            let stripped = json_comments::StripComments::new(data.as_bytes());
            serde_json::from_reader(stripped)?
        }
        "yaml" | "yml" => serde_yaml::from_str(&data)?,
        "toml" => toml::from_str(&data)?,
        _ => return Err(ConfigError::UnsupportedFormat),
    };
    debug!(
        path = %path.display(),
        node_id = %manifest.node.sid,
        referenced = manifest.referenced_nodes.len(),
        "loaded manifest"
    );
    Ok(manifest)
}
