//! Unified nodeconf CLI.
//!
//! - `nodeconf compile` - Compile a node manifest into a REST or hub document
//! - `nodeconf uri` - Print a subscription link for a node
//! - `nodeconf keys` - Derive secrets and generate Reality key material

use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Nodeconf unified CLI.
#[derive(Parser)]
#[command(
    name = "nodeconf",
    version,
    about = "Compile proxy node configs for node agents",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a node manifest.
    #[command(name = "compile", alias = "build")]
    Compile(nodeconf::cli::CompileArgs),

    /// Print a subscription link.
    #[command(name = "uri", alias = "link")]
    Uri(nodeconf::cli::UriArgs),

    /// Derive secrets and generate keys.
    #[command(name = "keys")]
    Keys(nodeconf_auth::KeysArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compile(args) => nodeconf::cli::run_compile(args),
        Commands::Uri(args) => nodeconf::cli::run_uri(args),
        Commands::Keys(args) => nodeconf_auth::cli::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
