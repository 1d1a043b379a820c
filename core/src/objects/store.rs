//! Object Store boundary.
//!
//! The shell core only ever talks to the remote management API through this
//! trait. `InMemoryObjectStore` backs offline sessions and tests.

use super::ConfigObject;
use super::ObjectKind;
use crate::errors::RemoteErrorKind;
use crate::errors::ScmError;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("{0}")]
    NotFound(String),

    #[error("rejected by server: {0}")]
    Validation(String),

    #[error("transport failure: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<StoreError> for ScmError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(message) => ScmError::not_found(message),
            StoreError::Authentication(message) => {
                ScmError::remote(RemoteErrorKind::Authentication, message)
            }
            StoreError::Validation(message) => {
                ScmError::remote(RemoteErrorKind::Validation, message)
            }
            StoreError::Transport { message, source } => ScmError::Remote {
                kind: RemoteErrorKind::Transport,
                message,
                source,
            },
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Remote object persistence. Calls are blocking and never retried.
pub trait ObjectStore {
    fn create(&self, folder: &str, object: &ConfigObject) -> StoreResult<ConfigObject>;

    /// Replace the object identified by (folder, name) with `object`.
    fn update(&self, folder: &str, object: &ConfigObject) -> StoreResult<ConfigObject>;

    fn get(&self, kind: ObjectKind, folder: &str, name: &str)
    -> StoreResult<Option<ConfigObject>>;

    fn list(&self, kind: ObjectKind, folder: &str) -> StoreResult<Vec<ConfigObject>>;

    fn delete(&self, kind: ObjectKind, folder: &str, name: &str) -> StoreResult<()>;
}

/// A call observed by [`InMemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create { folder: String, name: String },
    Update { folder: String, name: String },
    Get { folder: String, name: String },
    List { folder: String },
    Delete { folder: String, name: String },
}

impl StoreCall {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Create { .. } | Self::Update { .. } | Self::Delete { .. }
        )
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Per folder, in insertion order.
    folders: BTreeMap<String, Vec<ConfigObject>>,
    calls: Vec<StoreCall>,
}

/// Insertion-ordered store kept in process memory.
///
/// Clones share state, so a test can keep a handle after giving one to the
/// shell.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    state: Rc<RefCell<MemoryState>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.borrow().calls.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| call.is_mutation())
            .count()
    }

    fn position(objects: &[ConfigObject], kind: ObjectKind, name: &str) -> Option<usize> {
        objects
            .iter()
            .position(|o| o.kind() == kind && o.name() == name)
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn create(&self, folder: &str, object: &ConfigObject) -> StoreResult<ConfigObject> {
        let mut state = self.state.borrow_mut();
        state.calls.push(StoreCall::Create {
            folder: folder.to_string(),
            name: object.name().to_string(),
        });
        let objects = state.folders.entry(folder.to_string()).or_default();
        if Self::position(objects, object.kind(), object.name()).is_some() {
            return Err(StoreError::Validation(format!(
                "{} '{}' already exists in folder '{folder}'",
                object.kind(),
                object.name()
            )));
        }
        objects.push(object.clone());
        Ok(object.clone())
    }

    fn update(&self, folder: &str, object: &ConfigObject) -> StoreResult<ConfigObject> {
        let mut state = self.state.borrow_mut();
        state.calls.push(StoreCall::Update {
            folder: folder.to_string(),
            name: object.name().to_string(),
        });
        let objects = state.folders.get_mut(folder);
        let position = objects
            .as_deref()
            .and_then(|objects| Self::position(objects, object.kind(), object.name()));
        match (objects, position) {
            (Some(objects), Some(i)) => {
                objects[i] = object.clone();
                Ok(object.clone())
            }
            _ => Err(StoreError::NotFound(format!(
                "{} '{}' not found in folder '{folder}'",
                object.kind(),
                object.name()
            ))),
        }
    }

    fn get(
        &self,
        kind: ObjectKind,
        folder: &str,
        name: &str,
    ) -> StoreResult<Option<ConfigObject>> {
        let mut state = self.state.borrow_mut();
        state.calls.push(StoreCall::Get {
            folder: folder.to_string(),
            name: name.to_string(),
        });
        Ok(state.folders.get(folder).and_then(|objects| {
            Self::position(objects, kind, name).map(|i| objects[i].clone())
        }))
    }

    fn list(&self, kind: ObjectKind, folder: &str) -> StoreResult<Vec<ConfigObject>> {
        let mut state = self.state.borrow_mut();
        state.calls.push(StoreCall::List {
            folder: folder.to_string(),
        });
        Ok(state
            .folders
            .get(folder)
            .map(|objects| {
                objects
                    .iter()
                    .filter(|o| o.kind() == kind)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn delete(&self, kind: ObjectKind, folder: &str, name: &str) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(StoreCall::Delete {
            folder: folder.to_string(),
            name: name.to_string(),
        });
        let objects = state.folders.get_mut(folder);
        match objects.and_then(|objects| {
            Self::position(objects, kind, name).map(|i| objects.remove(i))
        }) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!(
                "{kind} '{name}' not found in folder '{folder}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::AddressObject;
    use crate::objects::AddressType;
    use pretty_assertions::assert_eq;

    fn address(name: &str) -> ConfigObject {
        ConfigObject::Address(AddressObject::new(name, AddressType::Fqdn, "example.com"))
    }

    #[test]
    fn test_folders_are_isolated() {
        let store = InMemoryObjectStore::new();
        store.create("Texas", &address("web")).expect("create");
        assert!(
            store
                .get(ObjectKind::AddressObject, "Austin", "web")
                .expect("get")
                .is_none()
        );
        assert_eq!(
            store
                .list(ObjectKind::AddressObject, "Texas")
                .expect("list")
                .len(),
            1
        );
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let store = InMemoryObjectStore::new();
        for name in ["zeta", "alpha", "mid"] {
            store.create("Texas", &address(name)).expect("create");
        }
        let names: Vec<String> = store
            .list(ObjectKind::AddressObject, "Texas")
            .expect("list")
            .iter()
            .map(|o| o.name().to_string())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_clones_share_state_and_record_calls() {
        let store = InMemoryObjectStore::new();
        let handle = store.clone();
        store.create("Texas", &address("web")).expect("create");
        store
            .delete(ObjectKind::AddressObject, "Texas", "web")
            .expect("delete");
        assert!(matches!(
            store.delete(ObjectKind::AddressObject, "Texas", "web"),
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(handle.mutation_count(), 3);
        assert_eq!(
            handle.calls()[0],
            StoreCall::Create {
                folder: "Texas".to_string(),
                name: "web".to_string()
            }
        );
    }

    #[test]
    fn test_store_error_maps_to_taxonomy() {
        let err: ScmError = StoreError::Authentication("expired".to_string()).into();
        assert_eq!(err.category(), crate::ErrorCategory::RemoteError);
        let err: ScmError = StoreError::NotFound("gone".to_string()).into();
        assert_eq!(err.category(), crate::ErrorCategory::NotFound);
    }
}
