//! DNS config errors.

/// Validation failure of a DNS server, rule or config.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DnsError {
    /// Server fields are malformed.
    #[error("dns server {tag}: {reason}")]
    InvalidServer { tag: String, reason: String },

    /// Rule fields are malformed.
    #[error("dns rule[{index}]: {reason}")]
    InvalidRule { index: usize, reason: String },

    /// Two servers share a tag.
    #[error("duplicate dns server tag: {0}")]
    DuplicateTag(String),

    /// A server tag is referenced but not defined.
    #[error("{location} references undefined server tag: {tag}")]
    UndefinedServer { location: String, tag: String },

    /// Too many servers.
    #[error("too many dns servers: {count} (max {max})")]
    TooManyServers { count: usize, max: usize },

    /// Too many rules.
    #[error("too many dns rules: {count} (max {max})")]
    TooManyRules { count: usize, max: usize },
}

impl DnsError {
    pub(crate) fn server(tag: &str, reason: impl Into<String>) -> Self {
        Self::InvalidServer {
            tag: tag.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn rule(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            index,
            reason: reason.into(),
        }
    }
}
