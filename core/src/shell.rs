//! One interactive session: grammar, session state, dispatcher and history
//! wired together. Front ends feed it lines and render what comes back.

use crate::config::ShellSettings;
use crate::dispatcher::CommandResult;
use crate::dispatcher::Dispatcher;
use crate::errors::ScmError;
use crate::grammar::CommandId;
use crate::grammar::Completion;
use crate::grammar::Grammar;
use crate::grammar::help_request;
use crate::history_db::HistoryDb;
use crate::history_db::NewHistoryEntry;
use crate::objects::ObjectService;
use crate::objects::ObjectStore;
use crate::session::Mode;
use crate::session::Session;
use chrono::Utc;
use std::time::Instant;

#[derive(Debug)]
pub enum LineOutcome {
    /// Blank line; nothing happened.
    Empty,
    /// Trailing `?`: help text, nothing executed or recorded.
    Help(String),
    Executed {
        result: CommandResult,
        /// Id of the history row, `None` when the command was not recorded.
        history_id: Option<i64>,
        /// Set when recording the command failed.
        history_error: Option<ScmError>,
    },
}

impl LineOutcome {
    /// The session should end after this line.
    pub fn terminates(&self) -> bool {
        matches!(self, Self::Executed { result, .. } if result.terminate)
    }

    pub fn failed(&self) -> bool {
        matches!(self, Self::Executed { result, .. } if !result.is_success())
    }
}

pub struct Shell {
    session: Session,
    dispatcher: Dispatcher,
}

impl Shell {
    pub fn new(
        user: &str,
        store: Box<dyn ObjectStore>,
        history: HistoryDb,
        settings: &ShellSettings,
    ) -> Self {
        let mut session = Session::new(user);
        for folder in &settings.known_folders {
            session.remember_folder(folder);
        }
        let dispatcher = Dispatcher::new(
            Grammar::new(),
            ObjectService::new(store),
            history,
            settings.history_page_size,
        );
        Self {
            session,
            dispatcher,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn history(&self) -> &HistoryDb {
        self.dispatcher.history()
    }

    pub fn prompt(&self) -> String {
        self.session.prompt()
    }

    pub fn complete(&self, line: &str) -> Completion {
        self.dispatcher.grammar().complete(&self.session, line)
    }

    pub fn run_line(&mut self, line: &str) -> LineOutcome {
        let line = line.trim();
        if line.is_empty() {
            return LineOutcome::Empty;
        }
        let grammar = self.dispatcher.grammar();
        let mode = self.session.current_mode().clone();

        if let Some(prefix) = help_request(line) {
            return LineOutcome::Help(grammar.help(mode.kind(), prefix));
        }

        let started = Instant::now();
        let mut clears_history = false;
        let result = match grammar.parse(mode.kind(), line) {
            Ok(parsed) => {
                clears_history = parsed.id == CommandId::History && parsed.flag("--clear");
                self.dispatcher.dispatch(&parsed, &mut self.session)
            }
            Err(err) => {
                tracing::warn!(
                    category = err.category().as_str(),
                    command = %line,
                    error = %err,
                    "command rejected"
                );
                let mut result = CommandResult::failure(&err);
                result.elapsed = started.elapsed();
                result
            }
        };

        if clears_history && result.is_success() {
            return LineOutcome::Executed {
                result,
                history_id: None,
                history_error: None,
            };
        }

        let entry = NewHistoryEntry {
            timestamp: Utc::now(),
            mode: mode.kind(),
            folder: mode.folder().map(str::to_string),
            command_text: line.to_string(),
            status: result.status,
            summary: result.summary.clone(),
            output_text: result.output_text(),
        };
        let (history_id, history_error) = match self.dispatcher.history().record(&entry) {
            Ok(id) => (Some(id), None),
            Err(err) => {
                tracing::warn!(
                    category = err.category().as_str(),
                    error = %err,
                    "failed to record history"
                );
                (None, Some(err))
            }
        };
        LineOutcome::Executed {
            result,
            history_id,
            history_error,
        }
    }

    pub fn mode(&self) -> &Mode {
        self.session.current_mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::CommandStatus;
    use crate::history_db::HistoryQuery;
    use crate::objects::InMemoryObjectStore;
    use crate::session::ModeKind;
    use pretty_assertions::assert_eq;

    fn shell() -> Shell {
        Shell::new(
            "user",
            Box::new(InMemoryObjectStore::new()),
            HistoryDb::open_in_memory().expect("history"),
            &ShellSettings::default(),
        )
    }

    fn executed(outcome: LineOutcome) -> (CommandResult, Option<i64>) {
        match outcome {
            LineOutcome::Executed {
                result, history_id, ..
            } => (result, history_id),
            other => panic!("expected execution, got {other:?}"),
        }
    }

    #[test]
    fn test_help_is_not_executed_or_recorded() {
        let mut shell = shell();
        let outcome = shell.run_line("configure ?");
        assert!(matches!(outcome, LineOutcome::Help(text) if text.starts_with("Syntax: configure")));
        assert_eq!(shell.mode(), &Mode::Operational);
        assert_eq!(shell.history().count().expect("count"), 0);
    }

    #[test]
    fn test_blank_line_is_ignored() {
        let mut shell = shell();
        assert!(matches!(shell.run_line("   "), LineOutcome::Empty));
        assert_eq!(shell.history().count().expect("count"), 0);
    }

    #[test]
    fn test_failures_are_recorded_with_context() {
        let mut shell = shell();
        shell.run_line("configure");
        let (result, id) = executed(shell.run_line("bogus"));
        assert_eq!(result.status, CommandStatus::Failure);
        let entry = shell
            .history()
            .get(id.expect("recorded"))
            .expect("entry");
        assert_eq!(entry.mode, ModeKind::Configuration);
        assert_eq!(entry.status, CommandStatus::Failure);
        assert_eq!(entry.summary, "unknown command 'bogus' in configuration mode");
    }

    #[test]
    fn test_mode_recorded_before_transition() {
        let mut shell = shell();
        shell.run_line("configure");
        let (_, id) = executed(shell.run_line("edit folder Texas"));
        let entry = shell.history().get(id.expect("recorded")).expect("entry");
        assert_eq!(entry.mode, ModeKind::Configuration);
        assert_eq!(entry.folder, None);
        assert_eq!(shell.prompt(), "user(Texas)# ");
    }

    #[test]
    fn test_clear_leaves_store_empty() {
        let mut shell = shell();
        shell.run_line("configure");
        shell.run_line("exit");
        let (result, id) = executed(shell.run_line("history --clear"));
        assert!(result.is_success());
        assert_eq!(id, None);
        let page = shell
            .history()
            .page(&HistoryQuery::default())
            .expect("page");
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_settings_seed_folder_completion() {
        let mut shell = shell();
        shell.run_line("configure");
        assert_eq!(shell.complete("edit folder S").candidates, vec!["Shared"]);
    }
}
