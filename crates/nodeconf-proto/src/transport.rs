//! Stream transport selection shared by Trojan, VLESS and VMess.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Transport carrying the proxy stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Raw TCP (default).
    #[default]
    Tcp,
    /// WebSocket.
    Ws,
    /// gRPC (gun).
    Grpc,
    /// HTTP/2.
    H2,
    /// HTTP upgrade.
    #[serde(rename = "httpupgrade")]
    HttpUpgrade,
}

impl Transport {
    /// Wire name of the transport.
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Tcp => "tcp",
            Transport::Ws => "ws",
            Transport::Grpc => "grpc",
            Transport::H2 => "h2",
            Transport::HttpUpgrade => "httpupgrade",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "tcp" => Ok(Transport::Tcp),
            "ws" | "websocket" => Ok(Transport::Ws),
            "grpc" => Ok(Transport::Grpc),
            "h2" | "http" => Ok(Transport::H2),
            "httpupgrade" => Ok(Transport::HttpUpgrade),
            other => Err(format!("unknown transport: {other}")),
        }
    }
}

/// Transport plus its mode-specific fields.
///
/// Only the fields relevant to `kind` are meaningful: `host`/`path` for
/// ws, h2 and httpupgrade, `service_name` for gRPC.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransportSettings {
    #[serde(rename = "type", default)]
    pub kind: Transport,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_name: String,
}

impl TransportSettings {
    /// Plain TCP.
    pub fn tcp() -> Self {
        Self::default()
    }

    /// WebSocket with host header and path.
    pub fn ws(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: Transport::Ws,
            host: host.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// HTTP/2 with host and path.
    pub fn h2(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: Transport::H2,
            host: host.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// HTTP upgrade with optional host and path.
    pub fn http_upgrade(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: Transport::HttpUpgrade,
            host: host.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// gRPC with service name.
    pub fn grpc(service_name: impl Into<String>) -> Self {
        Self {
            kind: Transport::Grpc,
            service_name: service_name.into(),
            ..Self::default()
        }
    }

    /// Check that `kind` is allowed for `protocol` and its required fields
    /// are present.
    pub(crate) fn validate(
        &self,
        protocol: &'static str,
        allowed: &[Transport],
    ) -> Result<(), ProtocolError> {
        if !allowed.contains(&self.kind) {
            return Err(ProtocolError::unsupported(
                protocol,
                "transport",
                self.kind.as_str(),
            ));
        }
        match self.kind {
            Transport::Tcp => {}
            Transport::Ws | Transport::H2 => {
                if self.host.trim().is_empty() {
                    return Err(ProtocolError::missing(protocol, "transport.host"));
                }
                validate_path(protocol, &self.path)?;
            }
            Transport::HttpUpgrade => validate_path(protocol, &self.path)?,
            Transport::Grpc => {
                if self.service_name.trim().is_empty() {
                    return Err(ProtocolError::missing(protocol, "transport.service_name"));
                }
            }
        }
        Ok(())
    }
}

fn validate_path(protocol: &'static str, path: &str) -> Result<(), ProtocolError> {
    if path.trim().is_empty() {
        return Err(ProtocolError::missing(protocol, "transport.path"));
    }
    if !path.starts_with('/') {
        return Err(ProtocolError::invalid(
            protocol,
            "transport.path",
            "must start with '/'",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[Transport] = &[
        Transport::Tcp,
        Transport::Ws,
        Transport::Grpc,
        Transport::H2,
        Transport::HttpUpgrade,
    ];

    #[test]
    fn ws_requires_host_and_path() {
        assert!(TransportSettings::ws("cdn.example.com", "/ray").validate("vless", ALL).is_ok());
        assert_eq!(
            TransportSettings::ws("", "/ray").validate("vless", ALL),
            Err(ProtocolError::missing("vless", "transport.host"))
        );
        assert_eq!(
            TransportSettings::ws("cdn.example.com", "").validate("vless", ALL),
            Err(ProtocolError::missing("vless", "transport.path"))
        );
    }

    #[test]
    fn path_must_be_absolute() {
        let err = TransportSettings::h2("h.example.com", "ray").validate("vmess", ALL).unwrap_err();
        assert_eq!(err.field(), "transport.path");
    }

    #[test]
    fn grpc_requires_service_name() {
        assert!(TransportSettings::grpc("TunService").validate("trojan", ALL).is_ok());
        assert_eq!(
            TransportSettings::grpc(" ").validate("trojan", ALL),
            Err(ProtocolError::missing("trojan", "transport.service_name"))
        );
    }

    #[test]
    fn disallowed_transport() {
        let err = TransportSettings::h2("h", "/p")
            .validate("trojan", &[Transport::Tcp, Transport::Ws])
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Unsupported { field: "transport", .. }));
    }

    #[test]
    fn parse_aliases() {
        assert_eq!("".parse::<Transport>(), Ok(Transport::Tcp));
        assert_eq!("websocket".parse::<Transport>(), Ok(Transport::Ws));
        assert_eq!("http".parse::<Transport>(), Ok(Transport::H2));
        assert!("kcp".parse::<Transport>().is_err());
    }

    #[test]
    fn serde_shape() {
        let json = serde_json::to_value(TransportSettings::grpc("svc")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "grpc", "service_name": "svc"}));
        let back: TransportSettings =
            serde_json::from_value(serde_json::json!({"type": "httpupgrade", "path": "/up"})).unwrap();
        assert_eq!(back.kind, Transport::HttpUpgrade);
    }
}
