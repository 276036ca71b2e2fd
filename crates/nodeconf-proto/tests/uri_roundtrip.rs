//! Share links must re-parse with a standard URL parser and carry the same
//! fields they were built from.

use nodeconf_proto::{
    AnyTlsConfig, AnyTlsParams, Credential, Hysteria2Config, Hysteria2Params, ProtocolConfig,
    RealitySettings, ShadowsocksConfig, ShadowsocksParams, TlsSettings, TransportSettings,
    TrojanConfig, TrojanParams, TuicConfig, TuicParams, UriTarget, VlessConfig, VlessParams,
    VlessSecurity, VmessConfig, VmessParams, FLOW_VISION,
};
use url::Url;

const UUID: &str = "b831381d-6324-4d53-ad4f-8cda48b30811";

fn query(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn fragment(url: &Url) -> String {
    let raw = url.fragment().unwrap_or_default();
    percent_decode(raw)
}

fn percent_decode(raw: &str) -> String {
    url::form_urlencoded::parse(format!("x={raw}").as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

#[test]
fn trojan_grpc() {
    let config = ProtocolConfig::Trojan(
        TrojanConfig::new(TrojanParams {
            transport: TransportSettings::grpc("tun/svc"),
            tls: TlsSettings::with_sni("t.example.com"),
        })
        .unwrap(),
    );
    let uri = config.subscription_uri(
        &UriTarget::new("t.example.com", 443, "东京 01"),
        &Credential::password("p:w/d"),
    );
    let url = Url::parse(&uri).unwrap();
    assert_eq!(url.scheme(), "trojan");
    assert_eq!(url.host_str(), Some("t.example.com"));
    assert_eq!(url.port(), Some(443));
    assert_eq!(percent_decode(url.username()), "p:w/d");
    assert_eq!(
        query(&url),
        vec![
            ("security".into(), "tls".into()),
            ("type".into(), "grpc".into()),
            ("serviceName".into(), "tun/svc".into()),
            ("sni".into(), "t.example.com".into()),
        ]
    );
    assert_eq!(fragment(&url), "东京 01");
}

#[test]
fn vless_reality_ipv6() {
    let config = ProtocolConfig::Vless(
        VlessConfig::new(VlessParams {
            security: VlessSecurity::Reality,
            flow: FLOW_VISION.into(),
            tls: TlsSettings::with_sni("www.apple.com"),
            reality: RealitySettings {
                public_key: "hSDwCYkwp1R0i33ctD73Wg2_Og0mOBr066SpjqqbTmo".into(),
                short_id: "abcd".into(),
                spider_x: "/index".into(),
                ..RealitySettings::default()
            },
            ..VlessParams::default()
        })
        .unwrap(),
    );
    let uri = config.subscription_uri(
        &UriTarget::new("2001:db8::2", 8443, "v6"),
        &Credential::uuid(UUID),
    );
    let url = Url::parse(&uri).unwrap();
    assert_eq!(url.host_str(), Some("[2001:db8::2]"));
    assert_eq!(url.port(), Some(8443));
    assert_eq!(url.username(), UUID);
    let keys: Vec<String> = query(&url).into_iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        ["encryption", "security", "type", "sni", "fp", "pbk", "sid", "spx", "flow"]
    );
    assert_eq!(param(&url, "spx").as_deref(), Some("/index"));
    assert_eq!(param(&url, "fp").as_deref(), Some("chrome"));
}

#[test]
fn vmess_query_form() {
    let config = ProtocolConfig::Vmess(
        VmessConfig::new(VmessParams {
            transport: TransportSettings::http_upgrade("", "/up"),
            ..VmessParams::default()
        })
        .unwrap(),
    );
    let uri = config.subscription_uri(&UriTarget::new("1.2.3.4", 80, ""), &Credential::uuid(UUID));
    let url = Url::parse(&uri).unwrap();
    assert_eq!(param(&url, "encryption").as_deref(), Some("auto"));
    assert_eq!(param(&url, "security").as_deref(), Some("none"));
    assert_eq!(param(&url, "type").as_deref(), Some("httpupgrade"));
    assert_eq!(param(&url, "path").as_deref(), Some("/up"));
    assert_eq!(param(&url, "host"), None);
    assert_eq!(url.fragment(), None);
}

#[test]
fn shadowsocks_2022() {
    let config = ProtocolConfig::Shadowsocks(
        ShadowsocksConfig::new(ShadowsocksParams {
            method: "2022-blake3-aes-256-gcm".into(),
            ..ShadowsocksParams::default()
        })
        .unwrap(),
    );
    let credential = Credential::derive("subscriber", "node", &config);
    let uri = config.subscription_uri(&UriTarget::new("s.example.com", 8388, "s"), &credential);
    let url = Url::parse(&uri).unwrap();
    assert_eq!(url.username(), "2022-blake3-aes-256-gcm");
    assert_eq!(percent_decode(url.password().unwrap()), credential.password);
    assert_eq!(url.port(), Some(8388));
}

#[test]
fn hysteria2_and_tuic_and_anytls() {
    let hy2 = ProtocolConfig::Hysteria2(
        Hysteria2Config::new(Hysteria2Params {
            obfs_password: Some("salamander-pw".into()),
            tls: TlsSettings::with_sni("h.example.com"),
            ..Hysteria2Params::default()
        })
        .unwrap(),
    );
    let url = Url::parse(&hy2.subscription_uri(
        &UriTarget::new("h.example.com", 443, ""),
        &Credential::password("pw"),
    ))
    .unwrap();
    assert_eq!(param(&url, "obfs").as_deref(), Some("salamander"));
    assert_eq!(param(&url, "obfs-password").as_deref(), Some("salamander-pw"));

    let tuic = ProtocolConfig::Tuic(
        TuicConfig::new(TuicParams {
            uuid: UUID.into(),
            ..TuicParams::default()
        })
        .unwrap(),
    );
    let url = Url::parse(&tuic.subscription_uri(
        &UriTarget::new("10.0.0.1", 443, ""),
        &Credential::password("tuic-pw"),
    ))
    .unwrap();
    assert_eq!(url.username(), UUID);
    assert_eq!(url.password(), Some("tuic-pw"));
    assert_eq!(param(&url, "congestion_control").as_deref(), Some("bbr"));
    assert_eq!(param(&url, "udp_relay_mode").as_deref(), Some("native"));
    assert_eq!(param(&url, "alpn").as_deref(), Some("h3"));

    let anytls = ProtocolConfig::AnyTls(
        AnyTlsConfig::new(AnyTlsParams {
            password: "node-secret".into(),
            ..AnyTlsParams::default()
        })
        .unwrap(),
    );
    let url = Url::parse(&anytls.subscription_uri(
        &UriTarget::new("a.example.com", 443, "any"),
        &Credential::default(),
    ))
    .unwrap();
    assert_eq!(url.username(), "node-secret");
    assert_eq!(url.query(), None);
    assert_eq!(fragment(&url), "any");
}
