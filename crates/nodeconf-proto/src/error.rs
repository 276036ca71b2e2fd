//! Protocol configuration error types.

/// Construction-time validation failure of a protocol config.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A value outside the protocol's whitelist.
    #[error("{protocol}: unsupported {field}: {value}")]
    Unsupported {
        protocol: &'static str,
        field: &'static str,
        value: String,
    },

    /// A field required by the selected mode is empty.
    #[error("{protocol}: {field} is required")]
    Missing {
        protocol: &'static str,
        field: &'static str,
    },

    /// A field is present but malformed.
    #[error("{protocol}: invalid {field}: {reason}")]
    Invalid {
        protocol: &'static str,
        field: &'static str,
        reason: String,
    },
}

impl ProtocolError {
    pub(crate) fn unsupported(
        protocol: &'static str,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::Unsupported {
            protocol,
            field,
            value: value.into(),
        }
    }

    pub(crate) fn missing(protocol: &'static str, field: &'static str) -> Self {
        Self::Missing { protocol, field }
    }

    pub(crate) fn invalid(
        protocol: &'static str,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::Invalid {
            protocol,
            field,
            reason: reason.into(),
        }
    }

    /// The field this error is about.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Unsupported { field, .. }
            | Self::Missing { field, .. }
            | Self::Invalid { field, .. } => field,
        }
    }
}
