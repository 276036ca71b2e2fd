//! Remote rule-set references.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::RouteError;
use crate::outbound::OutboundType;

static INTERVAL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d+[dhm])+$").ok());

/// `update_interval` shape: one or more `<n>d`, `<n>h` or `<n>m` groups.
pub fn is_valid_interval(interval: &str) -> bool {
    INTERVAL_RE
        .as_ref()
        .is_some_and(|re| re.is_match(interval))
}

/// Rule-set file encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSetFormat {
    #[default]
    Binary,
    Source,
}

impl fmt::Display for RuleSetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuleSetFormat::Binary => "binary",
            RuleSetFormat::Source => "source",
        })
    }
}

/// Unvalidated rule-set fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetParams {
    pub tag: String,
    pub url: String,
    #[serde(default)]
    pub format: RuleSetFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_detour: Option<OutboundType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_interval: Option<String>,
}

/// A remote rule-set downloaded by the proxy server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleSetParams", into = "RuleSetParams")]
pub struct RuleSetEntry {
    tag: String,
    url: String,
    format: RuleSetFormat,
    download_detour: Option<OutboundType>,
    update_interval: Option<String>,
}

impl RuleSetEntry {
    pub fn new(params: RuleSetParams) -> Result<Self, RouteError> {
        let RuleSetParams {
            tag,
            url,
            format,
            download_detour,
            update_interval,
        } = params;

        if tag.trim().is_empty() {
            return Err(RouteError::rule_set(&tag, "tag is empty"));
        }
        let parsed = Url::parse(&url)
            .map_err(|e| RouteError::rule_set(&tag, format!("invalid url: {e}")))?;
        if parsed.scheme() != "https" || parsed.host_str().is_none() {
            return Err(RouteError::rule_set(&tag, format!("url must be https: {url}")));
        }
        if let Some(detour) = &download_detour {
            detour
                .validate()
                .map_err(|e| RouteError::rule_set(&tag, format!("download_detour: {e}")))?;
        }
        if let Some(interval) = &update_interval
            && !is_valid_interval(interval)
        {
            return Err(RouteError::rule_set(
                &tag,
                format!("invalid update_interval: {interval}"),
            ));
        }

        Ok(Self {
            tag,
            url,
            format,
            download_detour,
            update_interval,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn format(&self) -> RuleSetFormat {
        self.format
    }

    pub fn download_detour(&self) -> Option<&OutboundType> {
        self.download_detour.as_ref()
    }

    pub fn update_interval(&self) -> Option<&str> {
        self.update_interval.as_deref()
    }
}

impl TryFrom<RuleSetParams> for RuleSetEntry {
    type Error = RouteError;

    fn try_from(params: RuleSetParams) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}

impl From<RuleSetEntry> for RuleSetParams {
    fn from(entry: RuleSetEntry) -> Self {
        Self {
            tag: entry.tag,
            url: entry.url,
            format: entry.format,
            download_detour: entry.download_detour,
            update_interval: entry.update_interval,
        }
    }
}
