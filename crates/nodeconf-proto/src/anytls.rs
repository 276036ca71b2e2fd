//! AnyTLS.

use nodeconf_core::defaults::MIN_PASSWORD_LEN;
use serde::{Deserialize, Serialize};

use crate::Credential;
use crate::error::ProtocolError;
use crate::tls::TlsSettings;
use crate::uri::{Query, UriTarget, encode};

const PROTOCOL: &str = "anytls";

fn default_idle_check_interval() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnyTlsParams {
    pub password: String,
    #[serde(default = "default_idle_check_interval")]
    pub idle_session_check_interval_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_session_timeout_secs: u64,
    #[serde(default)]
    pub min_idle_session: u32,
    #[serde(default)]
    pub tls: TlsSettings,
}

impl Default for AnyTlsParams {
    fn default() -> Self {
        Self {
            password: String::new(),
            idle_session_check_interval_secs: default_idle_check_interval(),
            idle_session_timeout_secs: default_idle_timeout(),
            min_idle_session: 0,
            tls: TlsSettings::default(),
        }
    }
}

/// Validated AnyTLS settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AnyTlsParams", into = "AnyTlsParams")]
pub struct AnyTlsConfig {
    password: String,
    idle_session_check_interval_secs: u64,
    idle_session_timeout_secs: u64,
    min_idle_session: u32,
    tls: TlsSettings,
}

impl AnyTlsConfig {
    pub fn new(params: AnyTlsParams) -> Result<Self, ProtocolError> {
        let config = Self {
            password: params.password,
            idle_session_check_interval_secs: params.idle_session_check_interval_secs,
            idle_session_timeout_secs: params.idle_session_timeout_secs,
            min_idle_session: params.min_idle_session,
            tls: params.tls,
        };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ProtocolError> {
        if self.password.is_empty() {
            return Err(ProtocolError::missing(PROTOCOL, "password"));
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(ProtocolError::invalid(
                PROTOCOL,
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        if self.idle_session_check_interval_secs == 0 {
            return Err(ProtocolError::invalid(
                PROTOCOL,
                "idle_session_check_interval_secs",
                "must be > 0",
            ));
        }
        if self.idle_session_timeout_secs == 0 {
            return Err(ProtocolError::invalid(
                PROTOCOL,
                "idle_session_timeout_secs",
                "must be > 0",
            ));
        }
        self.tls.validate(PROTOCOL)
    }

    /// Node-level password.
    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn idle_session_check_interval_secs(&self) -> u64 {
        self.idle_session_check_interval_secs
    }

    pub fn idle_session_timeout_secs(&self) -> u64 {
        self.idle_session_timeout_secs
    }

    pub fn min_idle_session(&self) -> u32 {
        self.min_idle_session
    }

    pub fn tls(&self) -> &TlsSettings {
        &self.tls
    }

    /// Share link. A non-empty credential password replaces the node password.
    pub fn to_uri(&self, target: &UriTarget<'_>, credential: &Credential) -> String {
        let password = if credential.password.is_empty() {
            &self.password
        } else {
            &credential.password
        };
        let mut query = Query::new();
        query
            .push_nonempty("sni", &self.tls.sni)
            .push_nonempty("fp", &self.tls.fingerprint)
            .push_flag("insecure", self.tls.allow_insecure);
        format!(
            "anytls://{}@{}{}{}",
            encode(password),
            target.authority(),
            query.finish(),
            target.fragment()
        )
    }
}

impl TryFrom<AnyTlsParams> for AnyTlsConfig {
    type Error = ProtocolError;

    fn try_from(params: AnyTlsParams) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}

impl From<AnyTlsConfig> for AnyTlsParams {
    fn from(config: AnyTlsConfig) -> Self {
        Self {
            password: config.password,
            idle_session_check_interval_secs: config.idle_session_check_interval_secs,
            idle_session_timeout_secs: config.idle_session_timeout_secs,
            min_idle_session: config.min_idle_session,
            tls: config.tls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(password: &str) -> AnyTlsParams {
        AnyTlsParams {
            password: password.into(),
            ..AnyTlsParams::default()
        }
    }

    #[test]
    fn password_length() {
        assert_eq!(
            AnyTlsConfig::new(params("")).unwrap_err(),
            ProtocolError::missing(PROTOCOL, "password")
        );
        assert_eq!(AnyTlsConfig::new(params("1234567")).unwrap_err().field(), "password");
        assert!(AnyTlsConfig::new(params("12345678")).is_ok());
    }

    #[test]
    fn idle_defaults() {
        let config: AnyTlsConfig =
            serde_json::from_value(serde_json::json!({"password": "long-enough"})).unwrap();
        assert_eq!(config.idle_session_check_interval_secs(), 30);
        assert_eq!(config.idle_session_timeout_secs(), 30);
        assert_eq!(config.min_idle_session(), 0);
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut p = params("long-enough");
        p.idle_session_timeout_secs = 0;
        assert_eq!(
            AnyTlsConfig::new(p).unwrap_err().field(),
            "idle_session_timeout_secs"
        );
    }

    #[test]
    fn deserialize_validates() {
        let res: Result<AnyTlsConfig, _> =
            serde_json::from_value(serde_json::json!({"password": "short"}));
        assert!(res.is_err());
    }

    #[test]
    fn uri() {
        let mut p = params("node-password");
        p.tls = TlsSettings {
            sni: "a.example.com".into(),
            fingerprint: "firefox".into(),
            allow_insecure: true,
            alpn: Vec::new(),
        };
        let config = AnyTlsConfig::new(p).unwrap();
        let target = UriTarget::new("a.example.com", 443, "");
        assert_eq!(
            config.to_uri(&target, &Credential::default()),
            "anytls://node-password@a.example.com:443?sni=a.example.com&fp=firefox&insecure=1"
        );
        assert!(
            config
                .to_uri(&target, &Credential::password("user pw"))
                .starts_with("anytls://user%20pw@")
        );
    }
}
