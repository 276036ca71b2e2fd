//! Error types for the routing model.

use thiserror::Error;

/// Validation failure of a route rule, route config or one of its parts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("invalid outbound: {0}")]
    InvalidOutbound(String),

    #[error("rule[{index}]: {source}")]
    Rule {
        index: usize,
        #[source]
        source: Box<RouteError>,
    },

    #[error("final action: {0}")]
    Final(Box<RouteError>),

    #[error("invalid domain_regex {pattern}: {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("custom outbound {tag}: {reason}")]
    InvalidCustomOutbound { tag: String, reason: String },

    #[error("rule-set {tag}: {reason}")]
    InvalidRuleSet { tag: String, reason: String },

    #[error("duplicate {kind} tag: {tag}")]
    DuplicateTag { kind: &'static str, tag: String },

    #[error("{location} references undefined custom outbound: {tag}")]
    UndefinedCustomOutbound { location: String, tag: String },
}

impl RouteError {
    pub(crate) fn custom(tag: &str, reason: impl Into<String>) -> Self {
        Self::InvalidCustomOutbound {
            tag: tag.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn rule_set(tag: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRuleSet {
            tag: tag.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn at_rule(self, index: usize) -> Self {
        Self::Rule {
            index,
            source: Box::new(self),
        }
    }
}
