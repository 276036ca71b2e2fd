//! Upstream DNS server definitions.

use std::net::IpAddr;

use nodeconf_core::defaults::MAX_DNS_TAG_LEN;
use nodeconf_core::host::is_valid_host;
use nodeconf_rules::OutboundType;
use serde::{Deserialize, Serialize};

use crate::error::DnsError;

/// Address family preference for resolved names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DnsStrategy {
    PreferIpv4,
    PreferIpv6,
    Ipv4Only,
    Ipv6Only,
}

/// Response codes accepted by `rcode://` pseudo servers.
const RCODES: &[&str] = &[
    "success",
    "format_error",
    "server_failure",
    "name_error",
    "not_implemented",
    "refused",
];

/// One upstream DNS server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsServer {
    tag: String,
    address: String,
    /// Tag of the server used to resolve a hostname in `address`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address_resolver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    strategy: Option<DnsStrategy>,
    /// Outbound queries to this server are sent through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detour: Option<OutboundType>,
}

impl DnsServer {
    pub fn new(tag: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            address: address.into(),
            address_resolver: None,
            strategy: None,
            detour: None,
        }
    }

    pub fn with_address_resolver(mut self, tag: impl Into<String>) -> Self {
        self.address_resolver = Some(tag.into());
        self
    }

    pub fn with_strategy(mut self, strategy: DnsStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_detour(mut self, detour: OutboundType) -> Self {
        self.detour = Some(detour);
        self
    }

    /// Check the server on its own. Whether `address_resolver` names a
    /// defined server is checked by the config.
    pub fn validate(&self) -> Result<(), DnsError> {
        if self.tag.trim().is_empty() {
            return Err(DnsError::server(&self.tag, "tag is empty"));
        }
        if self.tag.len() > MAX_DNS_TAG_LEN {
            return Err(DnsError::server(
                &self.tag,
                format!("tag longer than {MAX_DNS_TAG_LEN} characters"),
            ));
        }
        validate_address(&self.address).map_err(|reason| DnsError::server(&self.tag, reason))?;
        if let Some(resolver) = &self.address_resolver {
            if resolver.trim().is_empty() {
                return Err(DnsError::server(&self.tag, "address_resolver is empty"));
            }
            if resolver == &self.tag {
                return Err(DnsError::server(&self.tag, "address_resolver points to itself"));
            }
        }
        if let Some(detour) = &self.detour {
            detour
                .validate()
                .map_err(|e| DnsError::server(&self.tag, format!("detour: {e}")))?;
        }
        Ok(())
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn address_resolver(&self) -> Option<&str> {
        self.address_resolver.as_deref()
    }

    pub fn strategy(&self) -> Option<DnsStrategy> {
        self.strategy
    }

    pub fn detour(&self) -> Option<&OutboundType> {
        self.detour.as_ref()
    }
}

/// Check a server address.
///
/// Accepted forms:
/// - `local`, `fakeip`
/// - a bare IP (`8.8.8.8`), plain UDP
/// - `udp://host[:port]`, `tcp://host[:port]`, `tls://host[:port]`,
///   `quic://host[:port]`
/// - `https://host[:port]/path`, `h3://host[:port]/path`
/// - `dhcp://auto` or `dhcp://<interface>`
/// - `rcode://<code>`
pub fn validate_address(address: &str) -> Result<(), String> {
    let address = address.trim();
    if address.is_empty() {
        return Err("address is empty".into());
    }
    if matches!(address, "local" | "fakeip") || address.parse::<IpAddr>().is_ok() {
        return Ok(());
    }
    let (scheme, rest) = address
        .split_once("://")
        .ok_or_else(|| format!("missing scheme: {address}"))?;

    match scheme {
        "udp" | "tcp" | "tls" | "quic" => {
            if rest.contains('/') {
                return Err(format!("unexpected path for {scheme} server: {address}"));
            }
            check_host_port(rest)
        }
        "https" | "h3" => {
            let authority = rest.split_once('/').map_or(rest, |(authority, _)| authority);
            check_host_port(authority)
        }
        "dhcp" => {
            if rest.is_empty() || rest.contains('/') {
                return Err(format!("invalid dhcp interface: {address}"));
            }
            Ok(())
        }
        "rcode" => {
            if RCODES.contains(&rest) {
                Ok(())
            } else {
                Err(format!("unknown rcode: {rest}"))
            }
        }
        other => Err(format!("unsupported scheme: {other}")),
    }
}

fn check_host_port(s: &str) -> Result<(), String> {
    let (host, port) = split_host_port(s)?;
    if let Some(port) = port {
        let port: u16 = port.parse().map_err(|_| format!("invalid port in: {s}"))?;
        if port == 0 {
            return Err(format!("invalid port in: {s}"));
        }
    }
    if !is_valid_host(host) {
        return Err(format!("invalid host: {host}"));
    }
    Ok(())
}

fn split_host_port(s: &str) -> Result<(&str, Option<&str>), String> {
    // Bracketed IPv6: [::1]:853 or [::1]
    if let Some(rest) = s.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| format!("invalid IPv6 host in: {s}"))?;
        if tail.is_empty() {
            return Ok((host, None));
        }
        let port = tail
            .strip_prefix(':')
            .ok_or_else(|| format!("invalid port separator in bracketed host: {s}"))?;
        return Ok((host, Some(port)));
    }
    match s.rsplit_once(':') {
        Some((host, _)) if host.contains(':') => {
            Err(format!("ipv6 host must be bracketed in server url: {s}"))
        }
        Some((host, port)) => Ok((host, Some(port))),
        None => Ok((s, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_addresses() {
        for ok in [
            "local",
            "fakeip",
            "8.8.8.8",
            "2001:4860:4860::8888",
            "udp://8.8.8.8",
            "tcp://8.8.8.8:53",
            "tls://dns.google",
            "tls://[2606:4700::1111]:853",
            "quic://dns.adguard.com",
            "https://1.1.1.1/dns-query",
            "https://dns.google:443/dns-query",
            "h3://dns.cloudflare.com/dns-query",
            "dhcp://auto",
            "rcode://refused",
        ] {
            assert!(validate_address(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn rejected_addresses() {
        for bad in [
            "",
            "dns.google",
            "ftp://1.1.1.1",
            "udp://8.8.8.8/path",
            "tcp://8.8.8.8:0",
            "tcp://8.8.8.8:99999",
            "tls://2606:4700::1111",
            "tls://[::1",
            "https://bad host/dns-query",
            "rcode://maybe",
            "dhcp://",
        ] {
            assert!(validate_address(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn resolver_cannot_be_self() {
        let server = DnsServer::new("remote", "https://dns.google/dns-query")
            .with_address_resolver("remote");
        let err = server.validate().unwrap_err();
        assert_eq!(err.to_string(), "dns server remote: address_resolver points to itself");
    }

    #[test]
    fn detour_must_be_valid() {
        let server = DnsServer::new("remote", "8.8.8.8").with_detour(OutboundType::node("node_"));
        assert!(server.validate().is_err());
        let server = DnsServer::new("remote", "8.8.8.8").with_detour(OutboundType::node("node_hk"));
        assert!(server.validate().is_ok());
    }

    #[test]
    fn tag_rules() {
        assert!(DnsServer::new("", "local").validate().is_err());
        assert!(DnsServer::new("x".repeat(MAX_DNS_TAG_LEN + 1), "local").validate().is_err());
    }

    #[test]
    fn strategy_serde() {
        let server: DnsServer = serde_json::from_value(serde_json::json!({
            "tag": "local",
            "address": "local",
            "strategy": "ipv4_only"
        }))
        .unwrap();
        assert_eq!(server.strategy(), Some(DnsStrategy::Ipv4Only));
    }
}
