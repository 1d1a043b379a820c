//! Error taxonomy for the SCM shell
//!
//! Grammar and session fail fast with these typed errors; the dispatcher turns
//! every one of them into a failed `CommandResult` so the loop never sees a raw
//! error.

use crate::session::ModeKind;
use thiserror::Error;

/// Error category for structured logging and presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Unknown command, malformed clause, bad quoting
    SyntaxError,
    /// Command exists but is not available in the current mode
    ModeError,
    /// Field or argument value rejected before reaching the store
    ValidationError,
    /// Object or history entry does not exist
    NotFound,
    /// The remote object store refused or failed the request
    RemoteError,
    /// Credentials or settings missing/unreadable at startup
    ConfigError,
    /// History database failures and unexpected logic bugs
    InternalError,
}

impl ErrorCategory {
    /// Machine-readable code for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SyntaxError => "SYNTAX_ERROR",
            Self::ModeError => "MODE_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::RemoteError => "REMOTE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Which part of the remote exchange failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum RemoteErrorKind {
    Authentication,
    Validation,
    Transport,
}

#[derive(Debug, Error)]
pub enum ScmError {
    #[error("unknown command '{token}' in {mode} mode")]
    UnknownCommand { token: String, mode: ModeKind },

    #[error("syntax error: {message}")]
    Syntax { message: String },

    #[error("{message}")]
    Mode { message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("remote {kind} error: {message}")]
    Remote {
        kind: RemoteErrorKind,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("history db error: {message}")]
    HistoryDb {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ScmError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownCommand { .. } | Self::Syntax { .. } => ErrorCategory::SyntaxError,
            Self::Mode { .. } => ErrorCategory::ModeError,
            Self::Validation { .. } => ErrorCategory::ValidationError,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Remote { .. } => ErrorCategory::RemoteError,
            Self::Config { .. } => ErrorCategory::ConfigError,
            Self::HistoryDb { .. } | Self::Internal { .. } => ErrorCategory::InternalError,
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    pub fn mode(message: impl Into<String>) -> Self {
        Self::Mode {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn remote(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self::Remote {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn remote_with_source(
        kind: RemoteErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Remote {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn history_db_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::HistoryDb {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True when no command in the grammar matched the leading tokens.
    pub fn is_unknown_command(&self) -> bool {
        matches!(self, Self::UnknownCommand { .. })
    }
}

/// Result type alias for the SCM shell
pub type Result<T> = std::result::Result<T, ScmError>;
