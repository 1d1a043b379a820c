//! Session state machine
//!
//! Operational → Configuration → FolderEdit(folder). `exit` pops one level and
//! terminates the session when already at the top.

use crate::errors::{Result, ScmError};
use std::collections::BTreeMap;

/// Mode tag without the folder payload; used by the grammar table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ModeKind {
    Operational,
    Configuration,
    FolderEdit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Operational,
    Configuration,
    /// Always carries a non-empty folder name.
    FolderEdit { folder: String },
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Operational => ModeKind::Operational,
            Self::Configuration => ModeKind::Configuration,
            Self::FolderEdit { .. } => ModeKind::FolderEdit,
        }
    }

    pub fn folder(&self) -> Option<&str> {
        match self {
            Self::FolderEdit { folder } => Some(folder),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Configure,
    EditFolder(String),
    Exit,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transitioned {
    To(Mode),
    Terminate,
}

/// One interactive session: the current mode plus the name caches that feed
/// completion.
#[derive(Debug, Clone)]
pub struct Session {
    mode: Mode,
    user: String,
    known_folders: Vec<String>,
    known_objects: BTreeMap<String, Vec<String>>,
}

impl Session {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            mode: Mode::Operational,
            user: user.into(),
            known_folders: Vec::new(),
            known_objects: BTreeMap::new(),
        }
    }

    /// `alice@example.com` → `alice`; empty or missing ids fall back to `user`.
    pub fn username_from_client_id(client_id: Option<&str>) -> String {
        client_id
            .and_then(|id| id.split('@').next())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("user")
            .to_string()
    }

    pub fn current_mode(&self) -> &Mode {
        &self.mode
    }

    pub fn prompt(&self) -> String {
        match &self.mode {
            Mode::Operational => format!("{}@scm> ", self.user),
            Mode::Configuration => format!("{}@scm# ", self.user),
            Mode::FolderEdit { folder } => format!("{}({folder})# ", self.user),
        }
    }

    pub fn apply(&mut self, transition: Transition) -> Result<Transitioned> {
        let next = match (self.mode.kind(), transition) {
            (_, Transition::Quit) => return Ok(Transitioned::Terminate),
            (ModeKind::Operational, Transition::Configure) => Mode::Configuration,
            (_, Transition::Configure) => {
                return Err(ScmError::mode(
                    "'configure' is only valid in operational mode",
                ));
            }
            (ModeKind::Configuration, Transition::EditFolder(folder)) => {
                let folder = folder.trim().to_string();
                if folder.is_empty() {
                    return Err(ScmError::mode("folder name must not be empty"));
                }
                self.remember_folder(&folder);
                Mode::FolderEdit { folder }
            }
            (_, Transition::EditFolder(_)) => {
                return Err(ScmError::mode(
                    "'edit folder' is only valid in configuration mode",
                ));
            }
            (ModeKind::Operational, Transition::Exit) => return Ok(Transitioned::Terminate),
            (ModeKind::Configuration, Transition::Exit) => Mode::Operational,
            (ModeKind::FolderEdit, Transition::Exit) => Mode::Configuration,
        };
        tracing::info!(from = %self.mode.kind(), to = %next.kind(), "mode transition");
        self.mode = next.clone();
        Ok(Transitioned::To(next))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Completion caches
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn known_folders(&self) -> &[String] {
        &self.known_folders
    }

    pub fn remember_folder(&mut self, folder: &str) {
        if !self.known_folders.iter().any(|f| f == folder) {
            self.known_folders.push(folder.to_string());
        }
    }

    /// Object names seen in `folder`, in first-seen order.
    pub fn known_objects(&self, folder: &str) -> &[String] {
        self.known_objects
            .get(folder)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn remember_object(&mut self, folder: &str, name: &str) {
        let names = self.known_objects.entry(folder.to_string()).or_default();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    pub fn forget_object(&mut self, folder: &str, name: &str) {
        if let Some(names) = self.known_objects.get_mut(folder) {
            names.retain(|n| n != name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_walk_and_exit() {
        let mut session = Session::new("alice");
        assert_eq!(session.prompt(), "alice@scm> ");

        session.apply(Transition::Configure).expect("configure");
        assert_eq!(session.prompt(), "alice@scm# ");

        session
            .apply(Transition::EditFolder("Texas".to_string()))
            .expect("edit folder");
        assert_eq!(session.prompt(), "alice(Texas)# ");
        assert_eq!(session.current_mode().folder(), Some("Texas"));

        assert_eq!(
            session.apply(Transition::Exit).expect("exit"),
            Transitioned::To(Mode::Configuration)
        );
        assert_eq!(
            session.apply(Transition::Exit).expect("exit"),
            Transitioned::To(Mode::Operational)
        );
        assert_eq!(
            session.apply(Transition::Exit).expect("exit"),
            Transitioned::Terminate
        );
    }

    #[test]
    fn test_invalid_transitions_leave_mode_unchanged() {
        let mut session = Session::new("user");
        let err = session
            .apply(Transition::EditFolder("Texas".to_string()))
            .expect_err("edit from operational");
        assert_eq!(err.category(), crate::ErrorCategory::ModeError);
        assert_eq!(session.current_mode(), &Mode::Operational);

        session.apply(Transition::Configure).expect("configure");
        session
            .apply(Transition::Configure)
            .expect_err("configure twice");
        session
            .apply(Transition::EditFolder("  ".to_string()))
            .expect_err("blank folder");
        assert_eq!(session.current_mode(), &Mode::Configuration);
    }

    #[test]
    fn test_quit_terminates_from_any_mode() {
        let mut session = Session::new("user");
        session.apply(Transition::Configure).expect("configure");
        session
            .apply(Transition::EditFolder("Shared".to_string()))
            .expect("edit");
        assert_eq!(
            session.apply(Transition::Quit).expect("quit"),
            Transitioned::Terminate
        );
    }

    #[test]
    fn test_username_from_client_id() {
        assert_eq!(
            Session::username_from_client_id(Some("ops@1234.iam.panserviceaccount.com")),
            "ops"
        );
        assert_eq!(Session::username_from_client_id(Some("")), "user");
        assert_eq!(Session::username_from_client_id(None), "user");
    }

    #[test]
    fn test_object_cache_tracks_and_forgets() {
        let mut session = Session::new("user");
        session.remember_object("Texas", "web");
        session.remember_object("Texas", "db");
        session.remember_object("Texas", "web");
        assert_eq!(session.known_objects("Texas"), ["web", "db"]);
        session.forget_object("Texas", "web");
        assert_eq!(session.known_objects("Texas"), ["db"]);
        assert!(session.known_objects("Austin").is_empty());
    }
}
