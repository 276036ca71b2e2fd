//! VLESS with optional TLS or Reality.

use std::fmt;

use nodeconf_auth::decode_key;
use nodeconf_core::defaults::{DEFAULT_REALITY_FINGERPRINT, MAX_SHORT_ID_HEX_LEN};
use serde::{Deserialize, Serialize};

use crate::Credential;
use crate::error::ProtocolError;
use crate::tls::TlsSettings;
use crate::transport::{Transport, TransportSettings};
use crate::uri::{Query, UriTarget};

const PROTOCOL: &str = "vless";

pub const TRANSPORTS: &[Transport] = &[
    Transport::Tcp,
    Transport::Ws,
    Transport::Grpc,
    Transport::H2,
    Transport::HttpUpgrade,
];

/// XTLS vision flow.
pub const FLOW_VISION: &str = "xtls-rprx-vision";
/// Vision flow with UDP/443 passthrough.
pub const FLOW_VISION_UDP443: &str = "xtls-rprx-vision-udp443";

/// Stream security layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VlessSecurity {
    #[default]
    None,
    Tls,
    Reality,
}

impl VlessSecurity {
    pub fn as_str(&self) -> &'static str {
        match self {
            VlessSecurity::None => "none",
            VlessSecurity::Tls => "tls",
            VlessSecurity::Reality => "reality",
        }
    }
}

impl fmt::Display for VlessSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reality material. SNI and fingerprint live in [`TlsSettings`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RealitySettings {
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub short_id: String,
    /// Server private key. Only present on the node side.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub spider_x: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VlessParams {
    #[serde(default)]
    pub transport: TransportSettings,
    #[serde(default)]
    pub security: VlessSecurity,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub flow: String,
    #[serde(default)]
    pub tls: TlsSettings,
    #[serde(default)]
    pub reality: RealitySettings,
}

/// Validated VLESS settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "VlessParams", into = "VlessParams")]
pub struct VlessConfig {
    transport: TransportSettings,
    security: VlessSecurity,
    flow: String,
    tls: TlsSettings,
    reality: RealitySettings,
}

impl VlessConfig {
    pub fn new(params: VlessParams) -> Result<Self, ProtocolError> {
        let config = Self {
            transport: params.transport,
            security: params.security,
            flow: params.flow,
            tls: params.tls,
            reality: params.reality,
        };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ProtocolError> {
        self.transport.validate(PROTOCOL, TRANSPORTS)?;

        match self.flow.as_str() {
            "" => {}
            FLOW_VISION | FLOW_VISION_UDP443 => {
                if self.transport.kind != Transport::Tcp {
                    return Err(ProtocolError::invalid(
                        PROTOCOL,
                        "flow",
                        format!("{} requires tcp transport", self.flow),
                    ));
                }
                if self.security == VlessSecurity::None {
                    return Err(ProtocolError::invalid(
                        PROTOCOL,
                        "flow",
                        format!("{} requires tls or reality security", self.flow),
                    ));
                }
            }
            other => return Err(ProtocolError::unsupported(PROTOCOL, "flow", other)),
        }

        match self.security {
            VlessSecurity::None => {}
            VlessSecurity::Tls => self.tls.validate(PROTOCOL)?,
            VlessSecurity::Reality => {
                self.tls.validate(PROTOCOL)?;
                if self.tls.sni.is_empty() {
                    return Err(ProtocolError::missing(PROTOCOL, "tls.sni"));
                }
                self.validate_reality()?;
            }
        }
        Ok(())
    }

    fn validate_reality(&self) -> Result<(), ProtocolError> {
        let reality = &self.reality;
        if reality.public_key.is_empty() {
            return Err(ProtocolError::missing(PROTOCOL, "reality.public_key"));
        }
        decode_key(&reality.public_key)
            .map_err(|e| ProtocolError::invalid(PROTOCOL, "reality.public_key", e.to_string()))?;
        if !reality.private_key.is_empty() {
            decode_key(&reality.private_key).map_err(|e| {
                ProtocolError::invalid(PROTOCOL, "reality.private_key", e.to_string())
            })?;
        }
        if reality.short_id.is_empty() {
            return Err(ProtocolError::missing(PROTOCOL, "reality.short_id"));
        }
        if reality.short_id.len() > MAX_SHORT_ID_HEX_LEN
            || reality.short_id.len() % 2 != 0
            || !reality.short_id.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(ProtocolError::invalid(
                PROTOCOL,
                "reality.short_id",
                format!("expected even-length hex up to {MAX_SHORT_ID_HEX_LEN} chars"),
            ));
        }
        if !reality.spider_x.is_empty() && !reality.spider_x.starts_with('/') {
            return Err(ProtocolError::invalid(
                PROTOCOL,
                "reality.spider_x",
                "must start with '/'",
            ));
        }
        Ok(())
    }

    pub fn transport(&self) -> &TransportSettings {
        &self.transport
    }

    pub fn security(&self) -> VlessSecurity {
        self.security
    }

    pub fn flow(&self) -> &str {
        &self.flow
    }

    pub fn tls(&self) -> &TlsSettings {
        &self.tls
    }

    pub fn reality(&self) -> &RealitySettings {
        &self.reality
    }

    /// Fingerprint clients should present.
    ///
    /// Reality needs a browser fingerprint, so an empty one falls back to
    /// chrome there.
    pub fn effective_fingerprint(&self) -> &str {
        if self.tls.fingerprint.is_empty() && self.security == VlessSecurity::Reality {
            DEFAULT_REALITY_FINGERPRINT
        } else {
            &self.tls.fingerprint
        }
    }

    pub fn to_uri(&self, target: &UriTarget<'_>, credential: &Credential) -> String {
        let mut query = Query::new();
        query
            .push("encryption", "none")
            .push("security", self.security.as_str())
            .push_transport(&self.transport);
        if self.security != VlessSecurity::None {
            query
                .push_nonempty("sni", &self.tls.sni)
                .push_nonempty("fp", self.effective_fingerprint());
        }
        if self.security == VlessSecurity::Reality {
            query
                .push("pbk", &self.reality.public_key)
                .push("sid", &self.reality.short_id)
                .push_nonempty("spx", &self.reality.spider_x);
        }
        if self.security == VlessSecurity::Tls {
            if !self.tls.alpn.is_empty() {
                query.push("alpn", self.tls.alpn.join(","));
            }
            query.push_flag("allowInsecure", self.tls.allow_insecure);
        }
        query.push_nonempty("flow", &self.flow);
        format!(
            "vless://{}@{}{}{}",
            credential.uuid,
            target.authority(),
            query.finish(),
            target.fragment()
        )
    }
}

impl TryFrom<VlessParams> for VlessConfig {
    type Error = ProtocolError;

    fn try_from(params: VlessParams) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}

impl From<VlessConfig> for VlessParams {
    fn from(config: VlessConfig) -> Self {
        Self {
            transport: config.transport,
            security: config.security,
            flow: config.flow,
            tls: config.tls,
            reality: config.reality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // x25519 public key of the RFC 7748 Alice vector, base64url.
    const PBK: &str = "hSDwCYkwp1R0i33ctD73Wg2_Og0mOBr066SpjqqbTmo";

    fn reality_params() -> VlessParams {
        VlessParams {
            security: VlessSecurity::Reality,
            flow: FLOW_VISION.into(),
            tls: TlsSettings::with_sni("www.microsoft.com"),
            reality: RealitySettings {
                public_key: PBK.into(),
                short_id: "0123abcd".into(),
                ..RealitySettings::default()
            },
            ..VlessParams::default()
        }
    }

    #[test]
    fn reality_valid() {
        let config = VlessConfig::new(reality_params()).unwrap();
        assert_eq!(config.security(), VlessSecurity::Reality);
        assert_eq!(config.effective_fingerprint(), "chrome");
        assert!(config.tls().fingerprint.is_empty());
    }

    #[test]
    fn reality_requires_material() {
        let mut p = reality_params();
        p.tls.sni.clear();
        assert_eq!(
            VlessConfig::new(p).unwrap_err(),
            ProtocolError::missing(PROTOCOL, "tls.sni")
        );

        let mut p = reality_params();
        p.reality.public_key.clear();
        assert_eq!(VlessConfig::new(p).unwrap_err().field(), "reality.public_key");

        let mut p = reality_params();
        p.reality.short_id.clear();
        assert_eq!(VlessConfig::new(p).unwrap_err().field(), "reality.short_id");
    }

    #[test]
    fn short_id_shape() {
        for bad in ["abc", "zz", "0123456789abcdef00"] {
            let mut p = reality_params();
            p.reality.short_id = bad.into();
            assert_eq!(VlessConfig::new(p).unwrap_err().field(), "reality.short_id", "{bad}");
        }
    }

    #[test]
    fn bad_public_key() {
        let mut p = reality_params();
        p.reality.public_key = "short".into();
        assert!(matches!(
            VlessConfig::new(p),
            Err(ProtocolError::Invalid { field: "reality.public_key", .. })
        ));
    }

    #[test]
    fn vision_needs_tcp_and_security() {
        let mut p = reality_params();
        p.transport = TransportSettings::grpc("svc");
        assert_eq!(VlessConfig::new(p).unwrap_err().field(), "flow");

        let p = VlessParams {
            flow: FLOW_VISION.into(),
            ..VlessParams::default()
        };
        assert_eq!(VlessConfig::new(p).unwrap_err().field(), "flow");
    }

    #[test]
    fn unknown_flow() {
        let p = VlessParams {
            flow: "xtls-rprx-direct".into(),
            security: VlessSecurity::Tls,
            ..VlessParams::default()
        };
        assert!(matches!(
            VlessConfig::new(p),
            Err(ProtocolError::Unsupported { field: "flow", .. })
        ));
    }

    #[test]
    fn tls_fields_ignored_without_security() {
        let p = VlessParams {
            tls: TlsSettings {
                fingerprint: "bogus".into(),
                ..TlsSettings::default()
            },
            ..VlessParams::default()
        };
        assert!(VlessConfig::new(p).is_ok());
    }

    #[test]
    fn reality_uri() {
        let config = VlessConfig::new(reality_params()).unwrap();
        let uri = config.to_uri(
            &UriTarget::new("2001:db8::1", 443, "JP"),
            &Credential::uuid("b831381d-6324-4d53-ad4f-8cda48b30811"),
        );
        assert_eq!(
            uri,
            format!(
                "vless://b831381d-6324-4d53-ad4f-8cda48b30811@[2001:db8::1]:443\
                 ?encryption=none&security=reality&type=tcp&sni=www.microsoft.com&fp=chrome\
                 &pbk={PBK}&sid=0123abcd&flow=xtls-rprx-vision#JP"
            )
        );
    }

    #[test]
    fn plain_ws_uri() {
        let config = VlessConfig::new(VlessParams {
            transport: TransportSettings::ws("a.com", "/v"),
            ..VlessParams::default()
        })
        .unwrap();
        let uri = config.to_uri(&UriTarget::new("a.com", 80, ""), &Credential::uuid("u"));
        assert_eq!(
            uri,
            "vless://u@a.com:80?encryption=none&security=none&type=ws&host=a.com&path=%2Fv"
        );
    }
}
