//! TUIC v5.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Credential;
use crate::congestion::CongestionControl;
use crate::error::ProtocolError;
use crate::tls::TlsSettings;
use crate::uri::{Query, UriTarget, encode};

const PROTOCOL: &str = "tuic";

/// ALPN used when none is configured.
pub const DEFAULT_ALPN: &str = "h3";

/// How UDP packets are relayed over QUIC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UdpRelayMode {
    #[default]
    Native,
    Quic,
}

impl UdpRelayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UdpRelayMode::Native => "native",
            UdpRelayMode::Quic => "quic",
        }
    }
}

impl fmt::Display for UdpRelayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TuicParams {
    pub uuid: String,
    #[serde(default)]
    pub congestion_control: CongestionControl,
    #[serde(default)]
    pub udp_relay_mode: UdpRelayMode,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_sni: bool,
    #[serde(default)]
    pub tls: TlsSettings,
}

/// Validated TUIC settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TuicParams", into = "TuicParams")]
pub struct TuicConfig {
    uuid: String,
    congestion_control: CongestionControl,
    udp_relay_mode: UdpRelayMode,
    disable_sni: bool,
    tls: TlsSettings,
}

impl TuicConfig {
    pub fn new(params: TuicParams) -> Result<Self, ProtocolError> {
        let config = Self {
            uuid: params.uuid,
            congestion_control: params.congestion_control,
            udp_relay_mode: params.udp_relay_mode,
            disable_sni: params.disable_sni,
            tls: params.tls,
        };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ProtocolError> {
        if self.uuid.is_empty() {
            return Err(ProtocolError::missing(PROTOCOL, "uuid"));
        }
        uuid::Uuid::parse_str(&self.uuid)
            .map_err(|e| ProtocolError::invalid(PROTOCOL, "uuid", e.to_string()))?;
        if self.congestion_control == CongestionControl::Brutal {
            return Err(ProtocolError::unsupported(
                PROTOCOL,
                "congestion_control",
                CongestionControl::Brutal.as_str(),
            ));
        }
        self.tls.validate(PROTOCOL)
    }

    /// Node-level UUID.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn congestion_control(&self) -> CongestionControl {
        self.congestion_control
    }

    pub fn udp_relay_mode(&self) -> UdpRelayMode {
        self.udp_relay_mode
    }

    pub fn disable_sni(&self) -> bool {
        self.disable_sni
    }

    pub fn tls(&self) -> &TlsSettings {
        &self.tls
    }

    /// Configured ALPN, or `h3` when none is set.
    pub fn effective_alpn(&self) -> Vec<String> {
        if self.tls.alpn.is_empty() {
            vec![DEFAULT_ALPN.to_string()]
        } else {
            self.tls.alpn.clone()
        }
    }

    /// Share link. A non-empty credential UUID replaces the node UUID.
    pub fn to_uri(&self, target: &UriTarget<'_>, credential: &Credential) -> String {
        let uuid = if credential.uuid.is_empty() {
            &self.uuid
        } else {
            &credential.uuid
        };
        let mut query = Query::new();
        query
            .push("congestion_control", self.congestion_control.as_str())
            .push("udp_relay_mode", self.udp_relay_mode.as_str())
            .push("alpn", self.effective_alpn().join(","))
            .push_nonempty("sni", &self.tls.sni)
            .push_flag("allow_insecure", self.tls.allow_insecure)
            .push_flag("disable_sni", self.disable_sni);
        format!(
            "tuic://{}:{}@{}{}{}",
            uuid,
            encode(&credential.password),
            target.authority(),
            query.finish(),
            target.fragment()
        )
    }
}

impl TryFrom<TuicParams> for TuicConfig {
    type Error = ProtocolError;

    fn try_from(params: TuicParams) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}

impl From<TuicConfig> for TuicParams {
    fn from(config: TuicConfig) -> Self {
        Self {
            uuid: config.uuid,
            congestion_control: config.congestion_control,
            udp_relay_mode: config.udp_relay_mode,
            disable_sni: config.disable_sni,
            tls: config.tls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODE_UUID: &str = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";

    fn params() -> TuicParams {
        TuicParams {
            uuid: NODE_UUID.into(),
            ..TuicParams::default()
        }
    }

    #[test]
    fn uuid_required_and_parsed() {
        assert_eq!(
            TuicConfig::new(TuicParams::default()).unwrap_err(),
            ProtocolError::missing(PROTOCOL, "uuid")
        );
        let err = TuicConfig::new(TuicParams {
            uuid: "not-a-uuid".into(),
            ..TuicParams::default()
        })
        .unwrap_err();
        assert!(matches!(err, ProtocolError::Invalid { field: "uuid", .. }));
    }

    #[test]
    fn brutal_rejected() {
        let mut p = params();
        p.congestion_control = CongestionControl::Brutal;
        assert_eq!(TuicConfig::new(p).unwrap_err().field(), "congestion_control");
    }

    #[test]
    fn alpn_default() {
        let config = TuicConfig::new(params()).unwrap();
        assert!(config.tls().alpn.is_empty());
        assert_eq!(config.effective_alpn(), vec!["h3".to_string()]);
    }

    #[test]
    fn uri_uses_node_uuid_without_credential_uuid() {
        let mut p = params();
        p.congestion_control = CongestionControl::Cubic;
        p.udp_relay_mode = UdpRelayMode::Quic;
        p.disable_sni = true;
        p.tls.sni = "t.example.com".into();
        let config = TuicConfig::new(p).unwrap();
        let uri = config.to_uri(
            &UriTarget::new("t.example.com", 443, ""),
            &Credential::password("pw"),
        );
        assert_eq!(
            uri,
            format!(
                "tuic://{NODE_UUID}:pw@t.example.com:443?congestion_control=cubic\
                 &udp_relay_mode=quic&alpn=h3&sni=t.example.com&disable_sni=1"
            )
        );
    }

    #[test]
    fn uri_prefers_credential_uuid() {
        let config = TuicConfig::new(params()).unwrap();
        let credential = Credential::new("11111111-1111-4111-8111-111111111111", "pw");
        let uri = config.to_uri(&UriTarget::new("h.com", 1, ""), &credential);
        assert!(uri.starts_with("tuic://11111111-1111-4111-8111-111111111111:pw@"));
    }
}
