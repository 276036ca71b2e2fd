//! Trojan.

use serde::{Deserialize, Serialize};

use crate::Credential;
use crate::error::ProtocolError;
use crate::tls::TlsSettings;
use crate::transport::{Transport, TransportSettings};
use crate::uri::{Query, UriTarget, encode};

const PROTOCOL: &str = "trojan";

/// Transports a Trojan node may listen on.
pub const TRANSPORTS: &[Transport] = &[Transport::Tcp, Transport::Ws, Transport::Grpc];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrojanParams {
    #[serde(default)]
    pub transport: TransportSettings,
    #[serde(default)]
    pub tls: TlsSettings,
}

/// Validated Trojan settings. TLS is always on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TrojanParams", into = "TrojanParams")]
pub struct TrojanConfig {
    transport: TransportSettings,
    tls: TlsSettings,
}

impl TrojanConfig {
    pub fn new(params: TrojanParams) -> Result<Self, ProtocolError> {
        let config = Self {
            transport: params.transport,
            tls: params.tls,
        };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ProtocolError> {
        self.transport.validate(PROTOCOL, TRANSPORTS)?;
        self.tls.validate(PROTOCOL)
    }

    pub fn transport(&self) -> &TransportSettings {
        &self.transport
    }

    pub fn tls(&self) -> &TlsSettings {
        &self.tls
    }

    pub fn to_uri(&self, target: &UriTarget<'_>, credential: &Credential) -> String {
        let mut query = Query::new();
        query
            .push("security", "tls")
            .push_transport(&self.transport)
            .push_tls(&self.tls, "allowInsecure");
        format!(
            "trojan://{}@{}{}{}",
            encode(&credential.password),
            target.authority(),
            query.finish(),
            target.fragment()
        )
    }
}

impl TryFrom<TrojanParams> for TrojanConfig {
    type Error = ProtocolError;

    fn try_from(params: TrojanParams) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}

impl From<TrojanConfig> for TrojanParams {
    fn from(config: TrojanConfig) -> Self {
        Self {
            transport: config.transport,
            tls: config.tls,
        }
    }
}
