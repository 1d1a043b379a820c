//! Command interpreter for the SCM network-engineer shell.
//!
//! A modal grammar (operational, configuration, folder edit) drives parsing,
//! completion and help. Parsed commands are dispatched against an
//! [`ObjectStore`], and every executed line lands in a SQLite history.

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod filter;
pub mod grammar;
pub mod history_db;
pub mod objects;
pub mod session;
pub mod shell;
pub mod text_table;

pub use config::ScmCredentials;
pub use config::ShellSettings;
pub use dispatcher::CommandResult;
pub use dispatcher::CommandStatus;
pub use dispatcher::Dispatcher;
pub use dispatcher::Payload;
pub use errors::ErrorCategory;
pub use errors::RemoteErrorKind;
pub use errors::Result;
pub use errors::ScmError;
pub use filter::FilterPredicate;
pub use grammar::Grammar;
pub use history_db::HistoryDb;
pub use history_db::HistoryEntry;
pub use history_db::HistoryPage;
pub use history_db::HistoryQuery;
pub use objects::ConfigObject;
pub use objects::InMemoryObjectStore;
pub use objects::ObjectKind;
pub use objects::ObjectStore;
pub use session::Mode;
pub use session::ModeKind;
pub use session::Session;
pub use shell::LineOutcome;
pub use shell::Shell;
