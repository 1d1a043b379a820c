//! Address objects: the one configuration object kind the shell manages today.

use crate::errors::{Result, ScmError};
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::net::Ipv4Addr;

pub const MAX_NAME_LEN: usize = 63;
pub const MAX_DESCRIPTION_LEN: usize = 1023;
pub const MAX_TAG_LEN: usize = 127;
const MAX_FQDN_LEN: usize = 255;

/// DO NOT ALPHA-SORT! Declaration order is completion and help order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::EnumIter,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
    strum_macros::IntoStaticStr,
    strum_macros::Display,
    strum_macros::VariantNames,
)]
#[strum(serialize_all = "kebab-case")]
pub enum AddressType {
    IpNetmask,
    IpRange,
    IpWildcard,
    Fqdn,
}

impl AddressType {
    /// Field name used by the remote API (`ip_netmask`, `fqdn`, ...).
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::IpNetmask => "ip_netmask",
            Self::IpRange => "ip_range",
            Self::IpWildcard => "ip_wildcard",
            Self::Fqdn => "fqdn",
        }
    }

    /// Check that `value` is well-formed for this type.
    pub fn validate_value(self, value: &str) -> Result<()> {
        let ok = match self {
            Self::IpNetmask => is_ip_netmask(value),
            Self::IpRange => is_ip_range(value),
            Self::IpWildcard => is_ip_wildcard(value),
            Self::Fqdn => is_fqdn(value),
        };
        if ok {
            Ok(())
        } else {
            Err(ScmError::validation(format!(
                "'{value}' is not a valid {self} value"
            )))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressObject {
    pub name: String,
    pub address_type: AddressType,
    pub value: String,
    pub description: String,
    /// Sorted, duplicates collapsed.
    pub tags: BTreeSet<String>,
}

impl AddressObject {
    pub fn new(name: impl Into<String>, address_type: AddressType, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address_type,
            value: value.into(),
            description: String::new(),
            tags: BTreeSet::new(),
        }
    }

    /// Overwrite only the supplied fields. Absent never means reset.
    pub fn merge(&mut self, fields: &AddressFields) {
        if let Some(address_type) = fields.address_type {
            self.address_type = address_type;
        }
        if let Some(value) = &fields.value {
            self.value.clone_from(value);
        }
        if let Some(description) = &fields.description {
            self.description.clone_from(description);
        }
        if let Some(tags) = &fields.tags {
            self.tags.clone_from(tags);
        }
    }
}

/// Partial address object as supplied by `set`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFields {
    pub name: String,
    pub address_type: Option<AddressType>,
    pub value: Option<String>,
    pub description: Option<String>,
    pub tags: Option<BTreeSet<String>>,
}

impl AddressFields {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Validate every supplied field on its own.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if let (Some(address_type), Some(value)) = (self.address_type, &self.value) {
            address_type.validate_value(value)?;
        }
        if let Some(description) = &self.description
            && description.chars().count() > MAX_DESCRIPTION_LEN
        {
            return Err(ScmError::validation(format!(
                "description exceeds {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        if let Some(tags) = &self.tags {
            for tag in tags {
                if tag.chars().count() > MAX_TAG_LEN {
                    return Err(ScmError::validation(format!(
                        "tag '{tag}' exceeds {MAX_TAG_LEN} characters"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Build a brand-new object; type and value are mandatory here.
    pub fn into_new_object(self) -> Result<AddressObject> {
        let address_type = self
            .address_type
            .ok_or_else(|| ScmError::validation("missing required field: type"))?;
        let value = self
            .value
            .ok_or_else(|| ScmError::validation("missing required field: value"))?;
        address_type.validate_value(&value)?;
        Ok(AddressObject {
            name: self.name,
            address_type,
            value,
            description: self.description.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
        })
    }
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ScmError::validation("name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ScmError::validation(format!(
            "name '{name}' exceeds {MAX_NAME_LEN} characters"
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | '-' | '_')))
    {
        return Err(ScmError::validation(format!(
            "name '{name}' contains invalid character '{bad}'"
        )));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Value syntax
// ─────────────────────────────────────────────────────────────────────────────

fn is_ip_netmask(value: &str) -> bool {
    let (addr, prefix) = match value.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (value, None),
    };
    let Ok(ip) = addr.parse::<IpAddr>() else {
        return false;
    };
    let Some(prefix) = prefix else {
        return true;
    };
    let max = if ip.is_ipv4() { 32 } else { 128 };
    prefix.parse::<u8>().is_ok_and(|len| len <= max)
}

fn is_ip_range(value: &str) -> bool {
    let Some((start, end)) = value.split_once('-') else {
        return false;
    };
    match (start.parse::<IpAddr>(), end.parse::<IpAddr>()) {
        (Ok(IpAddr::V4(a)), Ok(IpAddr::V4(b))) => a <= b,
        (Ok(IpAddr::V6(a)), Ok(IpAddr::V6(b))) => a <= b,
        _ => false,
    }
}

fn is_ip_wildcard(value: &str) -> bool {
    let Some((addr, mask)) = value.split_once('/') else {
        return false;
    };
    addr.parse::<Ipv4Addr>().is_ok() && mask.parse::<Ipv4Addr>().is_ok()
}

fn is_fqdn(value: &str) -> bool {
    if value.is_empty() || value.len() > MAX_FQDN_LEN {
        return false;
    }
    let host = value.strip_suffix('.').unwrap_or(value);
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}
