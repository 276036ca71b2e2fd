//! CLI module for the `compile` and `uri` subcommands.
//!
//! Both load a node manifest, apply CLI overrides, validate, and set up
//! tracing from the manifest's `[logging]` section before doing any work.

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use nodeconf_compiler::{
    CompileError, Node, compile_config_sync, compile_node_config, derive_credential,
    subscription_uri, vmess_json_uri,
};
use nodeconf_config::{
    CliOverrides, LoggingConfig, NodeManifest, apply_overrides, load_manifest, validate_manifest,
    write_document,
};
use nodeconf_core::errors::ERROR_DERIVATION;
use nodeconf_hub::{SyncOptions, unix_now};
use nodeconf_proto::Credential;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Which document `compile` emits.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// REST config response.
    Rest,
    /// Hub `config_sync` push message.
    Hub,
}

/// Compile CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "compile", about = "Compile a node manifest into an agent config document")]
pub struct CompileArgs {
    /// Manifest path (json/jsonc/yaml/toml)
    #[arg(short, long, default_value = "node.toml")]
    pub config: PathBuf,

    /// Output document
    #[arg(short, long, value_enum, default_value_t = DocumentFormat::Rest)]
    pub format: DocumentFormat,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

/// Subscription link CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "uri", about = "Print a subscription link for a node")]
pub struct UriArgs {
    /// Manifest path (json/jsonc/yaml/toml)
    #[arg(short, long, default_value = "node.toml")]
    pub config: PathBuf,

    /// Client UUID (VLESS, VMess, TUIC)
    #[arg(long, conflicts_with = "subscription_token")]
    pub uuid: Option<String>,

    /// Client password (Shadowsocks, Trojan, Hysteria2, TUIC, AnyTLS)
    #[arg(long, conflicts_with = "subscription_token")]
    pub password: Option<String>,

    /// Derive the credential from a subscription token instead
    #[arg(long, env = "NODECONF_SUBSCRIPTION_TOKEN")]
    pub subscription_token: Option<String>,

    /// Link remarks; defaults to the node name
    #[arg(short, long)]
    pub remarks: Option<String>,

    /// Emit the base64 JSON form for VMess nodes
    #[arg(long)]
    pub vmess_json: bool,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

fn prepare(
    config: &Path,
    overrides: &CliOverrides,
) -> Result<NodeManifest, Box<dyn std::error::Error>> {
    let mut manifest = load_manifest(config)?;
    apply_overrides(&mut manifest, overrides);
    validate_manifest(&manifest)?;
    init_tracing(&manifest.logging);
    Ok(manifest)
}

/// Run the compile CLI with the given arguments.
pub fn run_compile(args: CompileArgs) -> Result<(), Box<dyn std::error::Error>> {
    let manifest = prepare(&args.config, &args.overrides)?;
    let node = &manifest.node;

    let document = match args.format {
        DocumentFormat::Rest => compile_node_config(Some(node), &manifest.referenced_nodes)
            .map_err(|e| log_compile_error(node, e))?
            .map(|doc| serde_json::to_string_pretty(&doc))
            .transpose()?,
        DocumentFormat::Hub => {
            let sync = SyncOptions {
                version: manifest.sync.version,
                full_sync: manifest.sync.full_sync,
                timestamp: unix_now(),
            };
            compile_config_sync(Some(node), &manifest.referenced_nodes, sync)
                .map_err(|e| log_compile_error(node, e))?
                .map(|msg| msg.to_json_pretty())
                .transpose()?
        }
    };
    let document = document.ok_or("compiler returned no document")?;

    match &args.out {
        Some(path) => {
            write_document(path, &document)?;
            info!(node_id = %node.sid, format = ?args.format, path = %path.display(), "document written");
        }
        None => println!("{document}"),
    }
    Ok(())
}

fn log_compile_error(node: &Node, e: CompileError) -> CompileError {
    error!(node_id = %node.sid, category = e.category(), error = %e, "compile failed");
    e
}

/// Run the uri CLI with the given arguments.
pub fn run_uri(args: UriArgs) -> Result<(), Box<dyn std::error::Error>> {
    let manifest = prepare(&args.config, &args.overrides)?;
    let node = &manifest.node;
    node.protocol_config.validate()?;

    let credential = match &args.subscription_token {
        Some(token) => derive_credential(token, node),
        None => Credential::new(
            args.uuid.clone().unwrap_or_default(),
            args.password.clone().unwrap_or_default(),
        ),
    };
    let protocol = node.protocol_config.protocol();
    let missing = if protocol.uses_uuid() {
        credential.uuid.is_empty()
    } else {
        credential.password.is_empty()
    };
    if missing {
        error!(node_id = %node.sid, protocol = %protocol, category = ERROR_DERIVATION, "no credential");
        return Err(format!(
            "no credential for {protocol}: pass --{} or --subscription-token",
            if protocol.uses_uuid() { "uuid" } else { "password" }
        )
        .into());
    }

    let remarks = args.remarks.as_deref().unwrap_or(node.display_name());
    let uri = if args.vmess_json {
        vmess_json_uri(node, &credential, remarks).ok_or("--vmess-json requires a vmess node")?
    } else {
        subscription_uri(node, &credential, remarks)
    };
    info!(node_id = %node.sid, protocol = %protocol, "subscription link generated");
    println!("{uri}");
    Ok(())
}

fn init_tracing(config: &LoggingConfig) {
    // Build the env filter from base level and per-module filters
    let mut filter_str = config.level.clone();
    for (module, level) in &config.filters {
        filter_str.push(',');
        filter_str.push_str(module);
        filter_str.push('=');
        filter_str.push_str(level);
    }

    let filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new("info"));

    match (config.format.as_str(), config.output.as_str()) {
        ("json", "stdout") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stdout))
                .init();
        }
        ("json", _) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stderr))
                .init();
        }
        ("compact", "stdout") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(io::stdout))
                .init();
        }
        ("compact", _) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
        (_, "stdout") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stdout))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_args_defaults() {
        let args = CompileArgs::try_parse_from(["compile"]).unwrap();
        assert_eq!(args.config, PathBuf::from("node.toml"));
        assert_eq!(args.format, DocumentFormat::Rest);
        assert!(args.out.is_none());
        assert!(!args.overrides.incremental);
    }

    #[test]
    fn compile_args_with_overrides() {
        let args = CompileArgs::try_parse_from([
            "compile",
            "-c",
            "edge.yaml",
            "--format",
            "hub",
            "-o",
            "out/edge.json",
            "--sync-version",
            "7",
            "--incremental",
        ])
        .unwrap();
        assert_eq!(args.format, DocumentFormat::Hub);
        assert_eq!(args.out, Some(PathBuf::from("out/edge.json")));
        assert_eq!(args.overrides.sync_version, Some(7));
        assert!(args.overrides.incremental);
    }

    #[test]
    fn uri_token_conflicts_with_explicit_credential() {
        let err = UriArgs::try_parse_from([
            "uri",
            "--uuid",
            "2dd2a7a6-5c39-4a8a-9f1e-5b2e4a3e2f10",
            "--subscription-token",
            "tok",
        ]);
        assert!(err.is_err());

        let args = UriArgs::try_parse_from(["uri", "--password", "pw", "--vmess-json"]).unwrap();
        assert_eq!(args.password.as_deref(), Some("pw"));
        assert!(args.vmess_json);
    }
}
