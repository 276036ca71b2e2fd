//! Route configuration: ordered rules, final action, custom outbounds and
//! rule-sets.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::custom::CustomOutbound;
use crate::error::RouteError;
use crate::outbound::OutboundType;
use crate::rule::RouteRule;
use crate::rule_set::RuleSetEntry;

/// A node's routing table.
///
/// Deserialization does not check cross references (stored configs are
/// rebuilt field by field); call [`RouteConfig::validate`] before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    #[serde(default)]
    rules: Vec<RouteRule>,
    #[serde(rename = "final")]
    final_action: OutboundType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    custom_outbounds: Vec<CustomOutbound>,
    #[serde(default, rename = "rule_set", skip_serializing_if = "Vec::is_empty")]
    rule_sets: Vec<RuleSetEntry>,
}

impl RouteConfig {
    /// Empty config sending everything to `final_action`.
    pub fn new(final_action: OutboundType) -> Self {
        Self {
            rules: Vec::new(),
            final_action,
            custom_outbounds: Vec::new(),
            rule_sets: Vec::new(),
        }
    }

    pub fn builder(final_action: OutboundType) -> RouteConfigBuilder {
        RouteConfigBuilder::new(final_action)
    }

    pub fn to_builder(&self) -> RouteConfigBuilder {
        RouteConfigBuilder {
            config: self.clone(),
        }
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn final_action(&self) -> &OutboundType {
        &self.final_action
    }

    pub fn custom_outbounds(&self) -> &[CustomOutbound] {
        &self.custom_outbounds
    }

    pub fn rule_sets(&self) -> &[RuleSetEntry] {
        &self.rule_sets
    }

    /// Custom outbound with `tag`.
    pub fn custom_outbound(&self, tag: &str) -> Option<&CustomOutbound> {
        self.custom_outbounds.iter().find(|c| c.tag() == tag)
    }

    /// Check the whole config.
    ///
    /// Fails when the final action, any rule or any custom outbound is
    /// malformed, when custom or rule-set tags repeat, or when a rule, the
    /// final action or a rule-set detour names an undefined custom outbound.
    pub fn validate(&self) -> Result<(), RouteError> {
        self.final_action
            .validate()
            .map_err(|e| RouteError::Final(Box::new(e)))?;
        for (index, rule) in self.rules.iter().enumerate() {
            rule.validate().map_err(|e| e.at_rule(index))?;
        }

        let mut tags = HashSet::new();
        for custom in &self.custom_outbounds {
            custom.validate()?;
            if !tags.insert(custom.tag()) {
                return Err(RouteError::DuplicateTag {
                    kind: "custom outbound",
                    tag: custom.tag().to_string(),
                });
            }
        }

        for (index, rule) in self.rules.iter().enumerate() {
            if let Some(tag) = rule.outbound().custom_tag()
                && !tags.contains(tag)
            {
                return Err(RouteError::UndefinedCustomOutbound {
                    location: format!("rule[{index}]"),
                    tag: tag.to_string(),
                });
            }
        }
        if let Some(tag) = self.final_action.custom_tag()
            && !tags.contains(tag)
        {
            return Err(RouteError::UndefinedCustomOutbound {
                location: "final action".to_string(),
                tag: tag.to_string(),
            });
        }

        let mut rule_set_tags = HashSet::new();
        for (index, entry) in self.rule_sets.iter().enumerate() {
            if !rule_set_tags.insert(entry.tag()) {
                return Err(RouteError::DuplicateTag {
                    kind: "rule-set",
                    tag: entry.tag().to_string(),
                });
            }
            if let Some(tag) = entry.download_detour().and_then(OutboundType::custom_tag)
                && !tags.contains(tag)
            {
                return Err(RouteError::UndefinedCustomOutbound {
                    location: format!("rule_set[{index}]"),
                    tag: tag.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Node SIDs referenced by rules, the final action, then rule-set
    /// download detours, deduplicated in first-seen order.
    pub fn referenced_node_sids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.outbound_refs()
            .filter_map(OutboundType::node_sid)
            .filter(|sid| seen.insert(*sid))
            .map(str::to_string)
            .collect()
    }

    pub fn has_node_references(&self) -> bool {
        self.outbound_refs().any(|o| o.node_sid().is_some())
    }

    fn outbound_refs(&self) -> impl Iterator<Item = &OutboundType> {
        self.rules
            .iter()
            .map(RouteRule::outbound)
            .chain(std::iter::once(&self.final_action))
            .chain(self.rule_sets.iter().filter_map(RuleSetEntry::download_detour))
    }
}

/// Builder for [`RouteConfig`].
///
/// Each `add_*` validates its input before appending, so a failed call
/// leaves the builder unchanged.
#[derive(Debug, Clone)]
pub struct RouteConfigBuilder {
    config: RouteConfig,
}

impl RouteConfigBuilder {
    pub fn new(final_action: OutboundType) -> Self {
        Self {
            config: RouteConfig::new(final_action),
        }
    }

    pub fn final_action(&mut self, final_action: OutboundType) -> &mut Self {
        self.config.final_action = final_action;
        self
    }

    pub fn add_rule(&mut self, rule: RouteRule) -> Result<&mut Self, RouteError> {
        rule.validate()
            .map_err(|e| e.at_rule(self.config.rules.len()))?;
        self.config.rules.push(rule);
        Ok(self)
    }

    pub fn add_custom_outbound(&mut self, custom: CustomOutbound) -> Result<&mut Self, RouteError> {
        custom.validate()?;
        if self.config.custom_outbound(custom.tag()).is_some() {
            return Err(RouteError::DuplicateTag {
                kind: "custom outbound",
                tag: custom.tag().to_string(),
            });
        }
        self.config.custom_outbounds.push(custom);
        Ok(self)
    }

    pub fn add_rule_set(&mut self, entry: RuleSetEntry) -> Result<&mut Self, RouteError> {
        if self.config.rule_sets.iter().any(|r| r.tag() == entry.tag()) {
            return Err(RouteError::DuplicateTag {
                kind: "rule-set",
                tag: entry.tag().to_string(),
            });
        }
        self.config.rule_sets.push(entry);
        Ok(self)
    }

    /// Remove every rule, keeping the rest.
    pub fn clear_rules(&mut self) -> &mut Self {
        self.config.rules.clear();
        self
    }

    pub fn build(&self) -> Result<RouteConfig, RouteError> {
        self.config.validate()?;
        if let Some(index) = self.config.rules.iter().position(RouteRule::is_catch_all)
            && index + 1 < self.config.rules.len()
        {
            warn!(
                catch_all = index,
                unreachable = self.config.rules.len() - index - 1,
                "rules after a catch-all rule never match"
            );
        }
        debug!(
            rules = self.config.rules.len(),
            custom_outbounds = self.config.custom_outbounds.len(),
            rule_sets = self.config.rule_sets.len(),
            final_action = %self.config.final_action,
            "built route config"
        );
        Ok(self.config.clone())
    }
}
