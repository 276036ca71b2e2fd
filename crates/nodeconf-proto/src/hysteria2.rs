//! Hysteria2.

use nodeconf_core::defaults::MIN_PASSWORD_LEN;
use serde::{Deserialize, Serialize};

use crate::Credential;
use crate::congestion::CongestionControl;
use crate::error::ProtocolError;
use crate::tls::TlsSettings;
use crate::uri::{Query, UriTarget, encode};

const PROTOCOL: &str = "hysteria2";

/// Only obfuscation type Hysteria2 defines.
pub const OBFS_SALAMANDER: &str = "salamander";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hysteria2Params {
    #[serde(default)]
    pub congestion_control: CongestionControl,
    /// Salamander password; `None` disables obfuscation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_mbps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_mbps: Option<u32>,
    #[serde(default)]
    pub tls: TlsSettings,
}

/// Validated Hysteria2 settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Hysteria2Params", into = "Hysteria2Params")]
pub struct Hysteria2Config {
    congestion_control: CongestionControl,
    obfs_password: Option<String>,
    up_mbps: Option<u32>,
    down_mbps: Option<u32>,
    tls: TlsSettings,
}

impl Hysteria2Config {
    pub fn new(params: Hysteria2Params) -> Result<Self, ProtocolError> {
        let config = Self {
            congestion_control: params.congestion_control,
            obfs_password: params.obfs_password,
            up_mbps: params.up_mbps,
            down_mbps: params.down_mbps,
            tls: params.tls,
        };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ProtocolError> {
        match self.congestion_control {
            CongestionControl::Bbr => {}
            CongestionControl::Brutal => {
                if self.up_mbps.is_none() {
                    return Err(ProtocolError::missing(PROTOCOL, "up_mbps"));
                }
                if self.down_mbps.is_none() {
                    return Err(ProtocolError::missing(PROTOCOL, "down_mbps"));
                }
            }
            other => {
                return Err(ProtocolError::unsupported(
                    PROTOCOL,
                    "congestion_control",
                    other.as_str(),
                ));
            }
        }
        if self.up_mbps == Some(0) {
            return Err(ProtocolError::invalid(PROTOCOL, "up_mbps", "must be > 0"));
        }
        if self.down_mbps == Some(0) {
            return Err(ProtocolError::invalid(PROTOCOL, "down_mbps", "must be > 0"));
        }
        if let Some(password) = &self.obfs_password
            && password.len() < MIN_PASSWORD_LEN
        {
            return Err(ProtocolError::invalid(
                PROTOCOL,
                "obfs_password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        self.tls.validate(PROTOCOL)
    }

    pub fn congestion_control(&self) -> CongestionControl {
        self.congestion_control
    }

    /// Obfuscation type, `None` when disabled.
    pub fn obfs(&self) -> Option<&'static str> {
        self.obfs_password.as_ref().map(|_| OBFS_SALAMANDER)
    }

    pub fn obfs_password(&self) -> Option<&str> {
        self.obfs_password.as_deref()
    }

    pub fn up_mbps(&self) -> Option<u32> {
        self.up_mbps
    }

    pub fn down_mbps(&self) -> Option<u32> {
        self.down_mbps
    }

    pub fn tls(&self) -> &TlsSettings {
        &self.tls
    }

    pub fn to_uri(&self, target: &UriTarget<'_>, credential: &Credential) -> String {
        let mut query = Query::new();
        query
            .push_nonempty("sni", &self.tls.sni)
            .push_flag("insecure", self.tls.allow_insecure);
        if let Some(password) = &self.obfs_password {
            query
                .push("obfs", OBFS_SALAMANDER)
                .push("obfs-password", password);
        }
        format!(
            "hysteria2://{}@{}{}{}",
            encode(&credential.password),
            target.authority(),
            query.finish(),
            target.fragment()
        )
    }
}

impl TryFrom<Hysteria2Params> for Hysteria2Config {
    type Error = ProtocolError;

    fn try_from(params: Hysteria2Params) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}

impl From<Hysteria2Config> for Hysteria2Params {
    fn from(config: Hysteria2Config) -> Self {
        Self {
            congestion_control: config.congestion_control,
            obfs_password: config.obfs_password,
            up_mbps: config.up_mbps,
            down_mbps: config.down_mbps,
            tls: config.tls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brutal_needs_bandwidth() {
        let err = Hysteria2Config::new(Hysteria2Params {
            congestion_control: CongestionControl::Brutal,
            up_mbps: Some(100),
            ..Hysteria2Params::default()
        })
        .unwrap_err();
        assert_eq!(err, ProtocolError::missing(PROTOCOL, "down_mbps"));

        assert!(
            Hysteria2Config::new(Hysteria2Params {
                congestion_control: CongestionControl::Brutal,
                up_mbps: Some(100),
                down_mbps: Some(500),
                ..Hysteria2Params::default()
            })
            .is_ok()
        );
    }

    #[test]
    fn cubic_rejected() {
        let err = Hysteria2Config::new(Hysteria2Params {
            congestion_control: CongestionControl::Cubic,
            ..Hysteria2Params::default()
        })
        .unwrap_err();
        assert_eq!(err.field(), "congestion_control");
    }

    #[test]
    fn zero_bandwidth_rejected() {
        let err = Hysteria2Config::new(Hysteria2Params {
            up_mbps: Some(0),
            ..Hysteria2Params::default()
        })
        .unwrap_err();
        assert_eq!(err.field(), "up_mbps");
    }

    #[test]
    fn short_obfs_password_rejected() {
        let err = Hysteria2Config::new(Hysteria2Params {
            obfs_password: Some("1234567".into()),
            ..Hysteria2Params::default()
        })
        .unwrap_err();
        assert_eq!(err.field(), "obfs_password");
    }

    #[test]
    fn uri_with_obfs() {
        let config = Hysteria2Config::new(Hysteria2Params {
            obfs_password: Some("obfs pass".into()),
            tls: TlsSettings {
                sni: "hy.example.com".into(),
                allow_insecure: true,
                ..TlsSettings::default()
            },
            ..Hysteria2Params::default()
        })
        .unwrap();
        assert_eq!(config.obfs(), Some("salamander"));
        let uri = config.to_uri(
            &UriTarget::new("hy.example.com", 8443, "hy"),
            &Credential::password("pw"),
        );
        assert_eq!(
            uri,
            "hysteria2://pw@hy.example.com:8443?sni=hy.example.com&insecure=1\
             &obfs=salamander&obfs-password=obfs%20pass#hy"
        );
    }

    #[test]
    fn bare_uri_has_no_query() {
        let config = Hysteria2Config::new(Hysteria2Params::default()).unwrap();
        assert_eq!(config.obfs(), None);
        let uri = config.to_uri(&UriTarget::new("h.com", 443, ""), &Credential::password("pw"));
        assert_eq!(uri, "hysteria2://pw@h.com:443");
    }
}
