//! Host name and address shape checks.

use std::net::IpAddr;

use crate::defaults::MAX_HOSTNAME_LEN;

/// Whether `host` is a syntactically valid RFC 1123 hostname.
///
/// Labels are 1..=63 ASCII alphanumerics or hyphens and may not start or end
/// with a hyphen. A single trailing dot (FQDN form) is accepted.
pub fn is_valid_hostname(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > MAX_HOSTNAME_LEN {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

/// Whether `host` is an IP literal or a valid hostname.
pub fn is_valid_host(host: &str) -> bool {
    host.parse::<IpAddr>().is_ok() || is_valid_hostname(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostnames() {
        assert!(is_valid_hostname("example.com"));
        assert!(is_valid_hostname("a-b.example.com."));
        assert!(is_valid_hostname("localhost"));
        assert!(is_valid_hostname("1password.com"));
        assert!(!is_valid_hostname(""));
        assert!(!is_valid_hostname("-bad.example.com"));
        assert!(!is_valid_hostname("bad-.example.com"));
        assert!(!is_valid_hostname("a..b"));
        assert!(!is_valid_hostname("under_score.com"));
        assert!(!is_valid_hostname(&"a".repeat(64)));
        assert!(!is_valid_hostname(&format!("{}com", "a.".repeat(130))));
    }

    #[test]
    fn hosts() {
        assert!(is_valid_host("10.0.0.1"));
        assert!(is_valid_host("2001:db8::1"));
        assert!(is_valid_host("proxy.example.net"));
        assert!(!is_valid_host("not a host"));
        assert!(!is_valid_host("[2001:db8::1]"));
    }
}
