//! Core types and constants shared across nodeconf crates.
//!
//! This crate provides:
//! - Default values and hard limits
//! - Shadowsocks cipher lookup tables
//! - Error category constants for logging
//! - Host name shape checks
//! - The pagination helper used by listing endpoints

pub mod ciphers;
pub mod defaults;
pub mod errors;
pub mod host;
pub mod pagination;

// Re-export commonly used items at crate root
pub use defaults::*;
pub use errors::*;
pub use pagination::apply_pagination;
