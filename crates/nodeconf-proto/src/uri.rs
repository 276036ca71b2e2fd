//! Share-link building blocks.

use std::net::Ipv6Addr;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::tls::TlsSettings;
use crate::transport::{Transport, TransportSettings};

/// RFC 3986 unreserved characters stay literal, everything else is encoded.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Where a share link points and how it is labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UriTarget<'a> {
    /// Server address clients connect to.
    pub host: &'a str,
    /// Server port clients connect to.
    pub port: u16,
    /// Human label, becomes the URI fragment.
    pub remarks: &'a str,
}

impl<'a> UriTarget<'a> {
    pub fn new(host: &'a str, port: u16, remarks: &'a str) -> Self {
        Self {
            host,
            port,
            remarks,
        }
    }

    /// `host:port`, with IPv6 literals bracketed.
    pub(crate) fn authority(&self) -> String {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// `#remarks`, or nothing when there are no remarks.
    pub(crate) fn fragment(&self) -> String {
        if self.remarks.is_empty() {
            String::new()
        } else {
            format!("#{}", encode(self.remarks))
        }
    }
}

/// Percent-encode a URI component.
pub(crate) fn encode(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// Ordered query string builder.
///
/// Parameter order is preserved exactly as pushed; some clients are picky
/// about it.
#[derive(Debug, Default)]
pub(crate) struct Query {
    pairs: Vec<(&'static str, String)>,
}

impl Query {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, key: &'static str, value: impl AsRef<str>) -> &mut Self {
        self.pairs.push((key, encode(value.as_ref())));
        self
    }

    pub(crate) fn push_nonempty(&mut self, key: &'static str, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.push(key, value);
        }
        self
    }

    /// Push `key=1` when `flag` is set.
    pub(crate) fn push_flag(&mut self, key: &'static str, flag: bool) -> &mut Self {
        if flag {
            self.pairs.push((key, "1".to_string()));
        }
        self
    }

    /// Transport parameters in `type, host, path | serviceName` order.
    pub(crate) fn push_transport(&mut self, transport: &TransportSettings) -> &mut Self {
        self.push("type", transport.kind.as_str());
        match transport.kind {
            Transport::Tcp => {}
            Transport::Ws | Transport::H2 | Transport::HttpUpgrade => {
                self.push_nonempty("host", &transport.host);
                self.push_nonempty("path", &transport.path);
            }
            Transport::Grpc => {
                self.push_nonempty("serviceName", &transport.service_name);
            }
        }
        self
    }

    /// TLS parameters in `sni, fp, alpn, <insecure_key>` order.
    pub(crate) fn push_tls(&mut self, tls: &TlsSettings, insecure_key: &'static str) -> &mut Self {
        self.push_nonempty("sni", &tls.sni);
        self.push_nonempty("fp", &tls.fingerprint);
        if !tls.alpn.is_empty() {
            self.push("alpn", tls.alpn.join(","));
        }
        self.push_flag(insecure_key, tls.allow_insecure)
    }

    /// `?k=v&...`, or nothing for an empty query.
    pub(crate) fn finish(&self) -> String {
        if self.pairs.is_empty() {
            return String::new();
        }
        let body: Vec<String> = self
            .pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        format!("?{}", body.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_keeps_unreserved() {
        assert_eq!(encode("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(encode("a b/c"), "a%20b%2Fc");
        assert_eq!(encode("香港"), "%E9%A6%99%E6%B8%AF");
    }

    #[test]
    fn authority_brackets_ipv6() {
        assert_eq!(UriTarget::new("2001:db8::1", 443, "").authority(), "[2001:db8::1]:443");
        assert_eq!(UriTarget::new("1.2.3.4", 80, "").authority(), "1.2.3.4:80");
        assert_eq!(UriTarget::new("a.example", 8443, "").authority(), "a.example:8443");
    }

    #[test]
    fn fragment_encodes_remarks() {
        assert_eq!(UriTarget::new("h", 1, "").fragment(), "");
        assert_eq!(UriTarget::new("h", 1, "HK 01").fragment(), "#HK%2001");
    }

    #[test]
    fn query_preserves_order() {
        let mut q = Query::new();
        q.push("b", "2").push("a", "1").push_nonempty("skip", "").push_flag("on", true);
        assert_eq!(q.finish(), "?b=2&a=1&on=1");
        assert!(Query::new().finish().is_empty());
    }

    #[test]
    fn grpc_transport_params() {
        let mut q = Query::new();
        q.push_transport(&TransportSettings::grpc("svc name"));
        assert_eq!(q.finish(), "?type=grpc&serviceName=svc%20name");
    }
}
