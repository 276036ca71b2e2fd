//! VMess.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::Credential;
use crate::error::ProtocolError;
use crate::tls::TlsSettings;
use crate::transport::{Transport, TransportSettings};
use crate::uri::{Query, UriTarget};

const PROTOCOL: &str = "vmess";

pub const TRANSPORTS: &[Transport] = &[
    Transport::Tcp,
    Transport::Ws,
    Transport::Grpc,
    Transport::H2,
    Transport::HttpUpgrade,
];

/// VMess body cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VmessSecurity {
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "aes-128-gcm")]
    Aes128Gcm,
    #[serde(rename = "chacha20-poly1305")]
    Chacha20Poly1305,
    #[serde(rename = "none")]
    None,
    #[serde(rename = "zero")]
    Zero,
}

impl VmessSecurity {
    pub fn as_str(&self) -> &'static str {
        match self {
            VmessSecurity::Auto => "auto",
            VmessSecurity::Aes128Gcm => "aes-128-gcm",
            VmessSecurity::Chacha20Poly1305 => "chacha20-poly1305",
            VmessSecurity::None => "none",
            VmessSecurity::Zero => "zero",
        }
    }
}

impl fmt::Display for VmessSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VmessParams {
    #[serde(default)]
    pub alter_id: u16,
    #[serde(default)]
    pub security: VmessSecurity,
    #[serde(default)]
    pub transport: TransportSettings,
    /// `Some` enables TLS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsSettings>,
}

/// Validated VMess settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "VmessParams", into = "VmessParams")]
pub struct VmessConfig {
    alter_id: u16,
    security: VmessSecurity,
    transport: TransportSettings,
    tls: Option<TlsSettings>,
}

/// Field layout of the v2rayN `vmess://` JSON link.
#[derive(Serialize)]
struct ShareJson<'a> {
    v: &'static str,
    ps: &'a str,
    add: &'a str,
    port: String,
    id: &'a str,
    aid: String,
    scy: &'static str,
    net: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    host: &'a str,
    path: &'a str,
    tls: &'static str,
    sni: &'a str,
    fp: &'a str,
    alpn: String,
}

impl VmessConfig {
    pub fn new(params: VmessParams) -> Result<Self, ProtocolError> {
        let config = Self {
            alter_id: params.alter_id,
            security: params.security,
            transport: params.transport,
            tls: params.tls,
        };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ProtocolError> {
        self.transport.validate(PROTOCOL, TRANSPORTS)?;
        if let Some(tls) = &self.tls {
            tls.validate(PROTOCOL)?;
        }
        if self.security == VmessSecurity::Zero && self.tls.is_none() {
            return Err(ProtocolError::invalid(
                PROTOCOL,
                "security",
                "zero cipher requires tls",
            ));
        }
        Ok(())
    }

    pub fn alter_id(&self) -> u16 {
        self.alter_id
    }

    pub fn security(&self) -> VmessSecurity {
        self.security
    }

    pub fn transport(&self) -> &TransportSettings {
        &self.transport
    }

    /// TLS settings, `None` when TLS is off.
    pub fn tls(&self) -> Option<&TlsSettings> {
        self.tls.as_ref()
    }

    /// Query-string form of the share link.
    pub fn to_uri(&self, target: &UriTarget<'_>, credential: &Credential) -> String {
        let mut query = Query::new();
        query
            .push("encryption", self.security.as_str())
            .push("security", if self.tls.is_some() { "tls" } else { "none" })
            .push_transport(&self.transport);
        if let Some(tls) = &self.tls {
            query.push_tls(tls, "allowInsecure");
        }
        format!(
            "vmess://{}@{}{}{}",
            credential.uuid,
            target.authority(),
            query.finish(),
            target.fragment()
        )
    }

    /// Base64 JSON (`v=2`) share link understood by v2rayN-style clients.
    pub fn to_json_uri(&self, target: &UriTarget<'_>, credential: &Credential) -> String {
        let tls = self.tls.as_ref();
        let path = match self.transport.kind {
            Transport::Grpc => self.transport.service_name.as_str(),
            _ => self.transport.path.as_str(),
        };
        let share = ShareJson {
            v: "2",
            ps: target.remarks,
            add: target.host,
            port: target.port.to_string(),
            id: &credential.uuid,
            aid: self.alter_id.to_string(),
            scy: self.security.as_str(),
            net: self.transport.kind.as_str(),
            kind: "none",
            host: &self.transport.host,
            path,
            tls: if tls.is_some() { "tls" } else { "" },
            sni: tls.map(|t| t.sni.as_str()).unwrap_or_default(),
            fp: tls.map(|t| t.fingerprint.as_str()).unwrap_or_default(),
            alpn: tls.map(|t| t.alpn.join(",")).unwrap_or_default(),
        };
        // A struct of strings cannot fail to serialize.
        let json = serde_json::to_string(&share).unwrap_or_default();
        format!("vmess://{}", STANDARD.encode(json))
    }
}

impl TryFrom<VmessParams> for VmessConfig {
    type Error = ProtocolError;

    fn try_from(params: VmessParams) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}

impl From<VmessConfig> for VmessParams {
    fn from(config: VmessConfig) -> Self {
        Self {
            alter_id: config.alter_id,
            security: config.security,
            transport: config.transport,
            tls: config.tls,
        }
    }
}
