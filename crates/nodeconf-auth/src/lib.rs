//! Credential derivation for nodeconf.
//!
//! Node and subscriber secrets are derived with HMAC-SHA256 from a stable
//! token, so they never need to be stored. Reality key material is the one
//! exception: it is random and must be persisted by the caller.
//!
//! # Example
//!
//! ```
//! use nodeconf_auth::{derive_ss_password, RealityKeyPair};
//!
//! let key = derive_ss_password("node-token-hash", "2022-blake3-aes-128-gcm");
//! assert_eq!(key.len(), 24);
//!
//! let pair = RealityKeyPair::generate();
//! assert_eq!(pair.public_key().len(), 43);
//! ```

pub mod cli;
mod derive;
mod error;
mod reality;

pub use cli::KeysArgs;
pub use derive::{
    derive_password, derive_server_secret, derive_ss2022_user_key, derive_ss_password,
    derive_trojan_password, derive_uuid,
};
pub use error::KeyError;
pub use reality::{RealityKeyPair, clamp_scalar, decode_key, generate_short_id};
