//! Configuration objects managed by the shell and the mutation protocol over
//! them.

mod address;
mod service;
mod store;

pub use address::AddressFields;
pub use address::AddressObject;
pub use address::AddressType;
pub use address::MAX_DESCRIPTION_LEN;
pub use address::MAX_NAME_LEN;
pub use address::validate_name;
pub use service::DeleteOutcome;
pub use service::ObjectService;
pub use service::SetOutcome;
pub use store::InMemoryObjectStore;
pub use store::ObjectStore;
pub use store::StoreCall;
pub use store::StoreError;
pub use store::StoreResult;

/// Object kinds addressable from the command line.
///
/// DO NOT ALPHA-SORT! Enum order is presentation order in help and completion.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum_macros::EnumIter,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
    strum_macros::IntoStaticStr,
    strum_macros::Display,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ObjectKind {
    AddressObject,
}

impl ObjectKind {
    /// Word used by the `show <kind>-filter` command.
    pub fn filter_word(self) -> &'static str {
        match self {
            Self::AddressObject => "address-object-filter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigObject {
    Address(AddressObject),
}

impl ConfigObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Address(_) => ObjectKind::AddressObject,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Address(address) => &address.name,
        }
    }

    /// Field/value pairs in presentation order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Address(address) => vec![
                ("name", address.name.clone()),
                ("type", address.address_type.to_string()),
                ("value", address.value.clone()),
                ("description", address.description.clone()),
                ("tags", address.tags.iter().cloned().collect::<Vec<_>>().join(",")),
            ],
        }
    }
}

/// Partial update for one object, keyed by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectFields {
    Address(AddressFields),
}

impl ObjectFields {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Address(_) => ObjectKind::AddressObject,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Address(fields) => &fields.name,
        }
    }
}
