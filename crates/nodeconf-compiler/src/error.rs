//! Compiler error types.

use nodeconf_core::errors::{ERROR_DERIVATION, ERROR_REFERENCE, ERROR_VALIDATION};
use nodeconf_dns::DnsError;
use nodeconf_proto::ProtocolError;
use nodeconf_rules::RouteError;

/// Why a node could not be compiled. No partial document is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("protocol config: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("route config: {0}")]
    Route(#[from] RouteError),

    #[error("dns config: {0}")]
    Dns(#[from] DnsError),

    #[error("referenced node not supplied: {0}")]
    MissingReferencedNode(String),

    #[error("dns detour references undefined custom outbound: {0}")]
    UndefinedDnsDetour(String),

    #[error("cannot derive credential for referenced node {0}: empty token")]
    EmptyToken(String),
}

impl CompileError {
    /// Log category for this error.
    pub fn category(&self) -> &'static str {
        match self {
            CompileError::Protocol(_) | CompileError::Route(_) | CompileError::Dns(_) => {
                ERROR_VALIDATION
            }
            CompileError::MissingReferencedNode(_) | CompileError::UndefinedDnsDetour(_) => {
                ERROR_REFERENCE
            }
            CompileError::EmptyToken(_) => ERROR_DERIVATION,
        }
    }
}
