//! DNS routing rules.

use serde::{Deserialize, Serialize};

use crate::error::DnsError;

/// Sends matching queries to `server`.
///
/// Conditions follow the route rule semantics: different kinds are ANDed,
/// values within a kind are ORed, no conditions matches every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRule {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    domain: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    domain_suffix: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    domain_keyword: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    geosite: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    geoip: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    rule_set: Vec<String>,
    /// Match queries issued on behalf of these outbound tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    outbound: Vec<String>,
    server: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    disable_cache: bool,
}

impl DnsRule {
    pub fn builder(server: impl Into<String>) -> DnsRuleBuilder {
        DnsRuleBuilder::new(server)
    }

    /// Rule structure on its own; whether `server` exists is checked by the
    /// config. `index` only labels the error.
    pub(crate) fn validate_at(&self, index: usize) -> Result<(), DnsError> {
        if self.server.trim().is_empty() {
            return Err(DnsError::rule(index, "server is empty"));
        }
        let lists = [
            ("domain", &self.domain),
            ("domain_suffix", &self.domain_suffix),
            ("domain_keyword", &self.domain_keyword),
            ("geosite", &self.geosite),
            ("geoip", &self.geoip),
            ("rule_set", &self.rule_set),
            ("outbound", &self.outbound),
        ];
        for (name, values) in lists {
            if values.iter().any(|v| v.trim().is_empty()) {
                return Err(DnsError::rule(index, format!("empty {name} entry")));
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DnsError> {
        self.validate_at(0)
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn domain_suffix(&self) -> &[String] {
        &self.domain_suffix
    }

    pub fn domain_keyword(&self) -> &[String] {
        &self.domain_keyword
    }

    pub fn geosite(&self) -> &[String] {
        &self.geosite
    }

    pub fn geoip(&self) -> &[String] {
        &self.geoip
    }

    pub fn rule_set(&self) -> &[String] {
        &self.rule_set
    }

    pub fn outbound(&self) -> &[String] {
        &self.outbound
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn disable_cache(&self) -> bool {
        self.disable_cache
    }
}

/// Builder for [`DnsRule`].
#[derive(Debug, Clone)]
pub struct DnsRuleBuilder {
    rule: DnsRule,
}

macro_rules! list_setters {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name<I, T>(&mut self, values: I) -> &mut Self
            where
                I: IntoIterator<Item = T>,
                T: Into<String>,
            {
                self.rule.$name.extend(values.into_iter().map(Into::into));
                self
            }
        )*
    };
}

impl DnsRuleBuilder {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            rule: DnsRule {
                domain: Vec::new(),
                domain_suffix: Vec::new(),
                domain_keyword: Vec::new(),
                geosite: Vec::new(),
                geoip: Vec::new(),
                rule_set: Vec::new(),
                outbound: Vec::new(),
                server: server.into(),
                disable_cache: false,
            },
        }
    }

    list_setters!(
        domain,
        domain_suffix,
        domain_keyword,
        geosite,
        geoip,
        rule_set,
        outbound,
    );

    pub fn disable_cache(&mut self, disable: bool) -> &mut Self {
        self.rule.disable_cache = disable;
        self
    }

    pub fn build(&self) -> Result<DnsRule, DnsError> {
        self.rule.validate()?;
        Ok(self.rule.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds() {
        let rule = DnsRule::builder("local")
            .geosite(["cn"])
            .domain_suffix([".lan"])
            .disable_cache(true)
            .build()
            .unwrap();
        assert_eq!(rule.server(), "local");
        assert_eq!(rule.geosite(), ["cn"]);
        assert!(rule.disable_cache());
    }

    #[test]
    fn empty_server_rejected() {
        assert!(DnsRule::builder(" ").build().is_err());
    }

    #[test]
    fn empty_entry_rejected() {
        let err = DnsRule::builder("local").geosite(["cn", ""]).build().unwrap_err();
        assert_eq!(err.to_string(), "dns rule[0]: empty geosite entry");
    }
}
