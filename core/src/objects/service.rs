//! Object mutation protocol: create-or-merge `set`, `show`, `list`, `delete`.
//!
//! Every supplied field is validated before the store sees a request.

use super::ConfigObject;
use super::ObjectFields;
use super::ObjectKind;
use super::ObjectStore;
use super::validate_name;
use crate::errors::{Result, ScmError};
use crate::filter::FilterPredicate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    Created(ConfigObject),
    Updated(ConfigObject),
}

impl SetOutcome {
    pub fn object(&self) -> &ConfigObject {
        match self {
            Self::Created(object) | Self::Updated(object) => object,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { kind: ObjectKind, name: String },
}

pub struct ObjectService {
    store: Box<dyn ObjectStore>,
}

impl ObjectService {
    pub fn new(store: Box<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Create the object when absent, otherwise overwrite only the supplied
    /// fields.
    pub fn set(&self, folder: &str, fields: ObjectFields) -> Result<SetOutcome> {
        match &fields {
            ObjectFields::Address(address) => address.validate()?,
        }
        let kind = fields.kind();
        let existing = self.store.get(kind, folder, fields.name())?;

        match (existing, fields) {
            (None, ObjectFields::Address(address)) => {
                let object = ConfigObject::Address(address.into_new_object()?);
                let created = self.store.create(folder, &object)?;
                tracing::info!(folder, name = created.name(), %kind, "object created");
                Ok(SetOutcome::Created(created))
            }
            (Some(ConfigObject::Address(mut current)), ObjectFields::Address(address)) => {
                current.merge(&address);
                current.address_type.validate_value(&current.value)?;
                let updated = self
                    .store
                    .update(folder, &ConfigObject::Address(current))?;
                tracing::info!(folder, name = updated.name(), %kind, "object updated");
                Ok(SetOutcome::Updated(updated))
            }
        }
    }

    pub fn show(&self, kind: ObjectKind, folder: &str, name: &str) -> Result<ConfigObject> {
        validate_name(name)?;
        self.store
            .get(kind, folder, name)?
            .ok_or_else(|| ScmError::not_found(format!("{kind} '{name}' not found in folder '{folder}'")))
    }

    /// Objects of `kind` in store order that satisfy `predicate`.
    pub fn list(
        &self,
        kind: ObjectKind,
        folder: &str,
        predicate: &FilterPredicate,
    ) -> Result<Vec<ConfigObject>> {
        let objects = self.store.list(kind, folder)?;
        Ok(objects
            .into_iter()
            .filter(|object| predicate.matches(object))
            .collect())
    }

    pub fn delete(&self, kind: ObjectKind, folder: &str, name: &str) -> Result<DeleteOutcome> {
        validate_name(name)?;
        if self.store.get(kind, folder, name)?.is_none() {
            return Err(ScmError::not_found(format!(
                "{kind} '{name}' not found in folder '{folder}'"
            )));
        }
        self.store.delete(kind, folder, name)?;
        tracing::info!(folder, name, %kind, "object deleted");
        Ok(DeleteOutcome::Deleted {
            kind,
            name: name.to_string(),
        })
    }
}
