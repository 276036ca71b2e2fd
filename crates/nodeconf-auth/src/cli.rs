//! CLI module for key and credential tooling.
//!
//! Used as the `keys` subcommand of the unified nodeconf CLI.
//!
//! # Usage
//!
//! ```bash
//! # Generate a Reality keypair (persist the output!)
//! nodeconf keys reality
//!
//! # Recompute the public key of an existing private key
//! nodeconf keys public -k <private-key>
//!
//! # Generate a Reality short ID
//! nodeconf keys short-id
//!
//! # Derive a node's server secret
//! nodeconf keys derive -t <token-hash> -m 2022-blake3-aes-128-gcm
//! ```

use clap::{Parser, Subcommand, ValueEnum};

use crate::{
    RealityKeyPair, derive_password, derive_ss2022_user_key, derive_ss_password, derive_uuid,
    generate_short_id,
};

/// Key tooling CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "keys", about = "Generate key material and derive credentials")]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysCommands,
}

/// Key CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum KeysCommands {
    /// Generate a new Reality X25519 keypair.
    Reality {
        /// Print as JSON instead of plain lines.
        #[arg(long)]
        json: bool,
    },

    /// Print the public key for a Reality private key.
    Public {
        /// Private key (base64 or base64url).
        #[arg(short = 'k', long)]
        private_key: String,
    },

    /// Generate a Reality short ID.
    ShortId {
        /// Number of short IDs to generate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },

    /// Derive a secret from a token.
    Derive {
        /// Token (node token hash or subscription token).
        #[arg(short, long, env = "NODECONF_TOKEN")]
        token: String,

        /// What to derive.
        #[arg(short, long, value_enum, default_value_t = SecretKind::Shadowsocks)]
        kind: SecretKind,

        /// Shadowsocks method (required for shadowsocks / ss2022-user).
        #[arg(short, long, default_value = "2022-blake3-aes-128-gcm")]
        method: String,
    },
}

/// Kind of derived secret.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    /// Shadowsocks server key (SS2022 PSK or legacy hex password).
    Shadowsocks,
    /// SS2022 per-user key.
    Ss2022User,
    /// Hex password (Trojan, Hysteria2, TUIC, AnyTLS).
    Password,
    /// UUID identity (VLESS, VMess, TUIC).
    Uuid,
}

/// Run the keys CLI with the given arguments.
pub fn run(args: KeysArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        KeysCommands::Reality { json } => {
            let pair = RealityKeyPair::generate();
            if json {
                let out = serde_json::json!({
                    "private_key": pair.private_key(),
                    "public_key": pair.public_key(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("PrivateKey: {}", pair.private_key());
                println!("PublicKey: {}", pair.public_key());
            }
            Ok(())
        }
        KeysCommands::Public { private_key } => {
            let pair = RealityKeyPair::from_private_key(&private_key)?;
            println!("{}", pair.public_key());
            Ok(())
        }
        KeysCommands::ShortId { count } => {
            for _ in 0..count.max(1) {
                println!("{}", generate_short_id());
            }
            Ok(())
        }
        KeysCommands::Derive {
            token,
            kind,
            method,
        } => {
            let secret = derive_secret(&token, kind, &method);
            if secret.is_empty() {
                return Err(format!("nothing to derive for {kind:?} with method {method}").into());
            }
            println!("{secret}");
            Ok(())
        }
    }
}

fn derive_secret(token: &str, kind: SecretKind, method: &str) -> String {
    match kind {
        SecretKind::Shadowsocks => derive_ss_password(token, method),
        SecretKind::Ss2022User => derive_ss2022_user_key(token, method),
        SecretKind::Password => derive_password(token),
        SecretKind::Uuid => derive_uuid(token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_secret_dispatch() {
        assert_eq!(
            derive_secret("tok", SecretKind::Password, "ignored"),
            derive_password("tok")
        );
        assert_eq!(derive_secret("tok", SecretKind::Uuid, "").len(), 36);
        assert!(derive_secret("tok", SecretKind::Ss2022User, "aes-256-gcm").is_empty());
    }

    #[test]
    fn parse_derive_command() {
        let args = KeysArgs::try_parse_from([
            "keys", "derive", "-t", "abc", "-k", "ss2022-user", "-m", "2022-blake3-aes-256-gcm",
        ])
        .unwrap();
        match args.command {
            KeysCommands::Derive { token, kind, method } => {
                assert_eq!(token, "abc");
                assert_eq!(kind, SecretKind::Ss2022User);
                assert_eq!(method, "2022-blake3-aes-256-gcm");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
