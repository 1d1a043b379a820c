//! Conjunctive filter over configuration objects.

use crate::errors::{Result, ScmError};
use crate::grammar::ParsedCommand;
use crate::objects::AddressType;
use crate::objects::ConfigObject;
use std::str::FromStr;

/// Every present clause must hold; the empty predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPredicate {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    /// Exact type.
    pub address_type: Option<AddressType>,
    /// Case-insensitive substring of the value.
    pub value: Option<String>,
    /// Exact, case-sensitive tag membership.
    pub tag: Option<String>,
}

impl FilterPredicate {
    pub fn from_parsed(parsed: &ParsedCommand) -> Result<Self> {
        let address_type = parsed
            .text("--type")
            .map(|raw| {
                AddressType::from_str(raw)
                    .map_err(|_| ScmError::validation(format!("unknown address type '{raw}'")))
            })
            .transpose()?;
        Ok(Self {
            name: parsed.text("--name").map(str::to_lowercase),
            address_type,
            value: parsed.text("--value").map(str::to_lowercase),
            tag: parsed.text("--tag").map(str::to_string),
        })
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn matches(&self, object: &ConfigObject) -> bool {
        match object {
            ConfigObject::Address(address) => {
                self.name
                    .as_ref()
                    .is_none_or(|n| address.name.to_lowercase().contains(&n.to_lowercase()))
                    && self
                        .address_type
                        .is_none_or(|t| address.address_type == t)
                    && self
                        .value
                        .as_ref()
                        .is_none_or(|v| address.value.to_lowercase().contains(&v.to_lowercase()))
                    && self.tag.as_ref().is_none_or(|t| address.tags.contains(t))
            }
        }
    }

    /// Human-readable summary of the active clauses, e.g. `type=fqdn, tag=prod`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(name) = &self.name {
            parts.push(format!("name~{name}"));
        }
        if let Some(address_type) = self.address_type {
            parts.push(format!("type={address_type}"));
        }
        if let Some(value) = &self.value {
            parts.push(format!("value~{value}"));
        }
        if let Some(tag) = &self.tag {
            parts.push(format!("tag={tag}"));
        }
        parts.join(", ")
    }
}
