//! Command dispatcher
//!
//! Resolves a `ParsedCommand` to its handler with an exhaustive match on
//! `CommandId`. Handlers return typed errors; `dispatch` folds every outcome
//! into a `CommandResult`, so nothing escapes to the loop.

use crate::errors::{ErrorCategory, Result, ScmError};
use crate::filter::FilterPredicate;
use crate::grammar::CommandId;
use crate::grammar::Grammar;
use crate::grammar::ParsedCommand;
use crate::history_db::HistoryDb;
use crate::history_db::HistoryEntry;
use crate::history_db::HistoryPage;
use crate::history_db::HistoryQuery;
use crate::objects::AddressFields;
use crate::objects::AddressType;
use crate::objects::ConfigObject;
use crate::objects::DeleteOutcome;
use crate::objects::ObjectFields;
use crate::objects::ObjectKind;
use crate::objects::ObjectService;
use crate::objects::SetOutcome;
use crate::session::Mode;
use crate::session::Session;
use crate::session::Transition;
use crate::session::Transitioned;
use crate::text_table::TextTable;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use std::time::Instant;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum CommandStatus {
    Success,
    Failure,
}

/// Structured result body handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    None,
    Message(String),
    Object(ConfigObject),
    Objects {
        kind: ObjectKind,
        folder: String,
        /// Active filter clauses, empty when unfiltered.
        filter: String,
        objects: Vec<ConfigObject>,
    },
    HistoryPage(HistoryPage),
    HistoryEntry(HistoryEntry),
    Help(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub status: CommandStatus,
    /// One line, suitable for a status bar or the history summary column.
    pub summary: String,
    pub payload: Payload,
    pub elapsed: Duration,
    pub error: Option<ErrorCategory>,
    /// The session ended with this command.
    pub terminate: bool,
}

impl CommandResult {
    fn success(summary: impl Into<String>, payload: Payload) -> Self {
        Self {
            status: CommandStatus::Success,
            summary: summary.into(),
            payload,
            elapsed: Duration::ZERO,
            error: None,
            terminate: false,
        }
    }

    pub fn failure(err: &ScmError) -> Self {
        Self {
            status: CommandStatus::Failure,
            summary: err.to_string(),
            payload: Payload::None,
            elapsed: Duration::ZERO,
            error: Some(err.category()),
            terminate: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }

    /// Plain-text rendering persisted as the history output.
    pub fn output_text(&self) -> String {
        match &self.payload {
            Payload::None => self.summary.clone(),
            payload => payload.to_string(),
        }
    }
}

pub struct Dispatcher {
    grammar: Grammar,
    objects: ObjectService,
    history: HistoryDb,
    page_size: u32,
}

impl Dispatcher {
    pub fn new(grammar: Grammar, objects: ObjectService, history: HistoryDb, page_size: u32) -> Self {
        Self {
            grammar,
            objects,
            history,
            page_size,
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn history(&self) -> &HistoryDb {
        &self.history
    }

    pub fn dispatch(&self, parsed: &ParsedCommand, session: &mut Session) -> CommandResult {
        let started = Instant::now();
        let mut result = match self.run(parsed, session) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(
                    category = err.category().as_str(),
                    command = %parsed.raw,
                    error = %err,
                    "command failed"
                );
                CommandResult::failure(&err)
            }
        };
        result.elapsed = started.elapsed();
        tracing::debug!(
            command = %parsed.raw,
            status = %result.status,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "command finished"
        );
        result
    }

    fn run(&self, parsed: &ParsedCommand, session: &mut Session) -> Result<CommandResult> {
        let mode = session.current_mode().kind();
        let spec = self
            .grammar
            .spec(parsed.id)
            .ok_or_else(|| ScmError::internal(format!("no grammar entry for {:?}", parsed.id)))?;
        if !spec.valid_in(mode) {
            return Err(ScmError::mode(format!(
                "'{}' is not valid in {mode} mode",
                spec.command_text()
            )));
        }

        match parsed.id {
            CommandId::Configure => self.transition(session, Transition::Configure),
            CommandId::EditFolder => {
                let folder = parsed.positional(0).unwrap_or_default().to_string();
                self.transition(session, Transition::EditFolder(folder))
            }
            CommandId::Exit => self.transition(session, Transition::Exit),
            CommandId::Quit => self.transition(session, Transition::Quit),
            CommandId::Set(kind) => self.set(kind, parsed, session),
            CommandId::Show(kind) => self.show(kind, parsed, session),
            CommandId::ShowFilter(kind) => self.show_filter(kind, parsed, session),
            CommandId::Delete(kind) => self.delete(kind, parsed, session),
            CommandId::History => self.history_command(parsed),
            CommandId::Help => {
                let text = self.grammar.help(mode, parsed.positional(0).unwrap_or_default());
                Ok(CommandResult::success("help", Payload::Help(text)))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Mode transitions
    // ─────────────────────────────────────────────────────────────────────────────

    fn transition(&self, session: &mut Session, transition: Transition) -> Result<CommandResult> {
        match session.apply(transition)? {
            Transitioned::Terminate => {
                let mut result = CommandResult::success("Goodbye", Payload::None);
                result.terminate = true;
                Ok(result)
            }
            Transitioned::To(Mode::Operational) => Ok(CommandResult::success(
                "Exited to operational mode",
                Payload::None,
            )),
            Transitioned::To(Mode::Configuration) => Ok(CommandResult::success(
                "Entered configuration mode",
                Payload::None,
            )),
            Transitioned::To(Mode::FolderEdit { folder }) => Ok(CommandResult::success(
                format!("Editing folder '{folder}'"),
                Payload::None,
            )),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Object commands
    // ─────────────────────────────────────────────────────────────────────────────

    fn set(
        &self,
        kind: ObjectKind,
        parsed: &ParsedCommand,
        session: &mut Session,
    ) -> Result<CommandResult> {
        let folder = active_folder(session)?;
        let fields = object_fields(kind, parsed)?;
        let outcome = self.objects.set(&folder, fields)?;
        let object = outcome.object().clone();
        session.remember_object(&folder, object.name());
        let verb = match outcome {
            SetOutcome::Created(_) => "Created",
            SetOutcome::Updated(_) => "Updated",
        };
        Ok(CommandResult::success(
            format!("{verb} {kind} '{}' in folder '{folder}'", object.name()),
            Payload::Object(object),
        ))
    }

    fn show(
        &self,
        kind: ObjectKind,
        parsed: &ParsedCommand,
        session: &mut Session,
    ) -> Result<CommandResult> {
        let folder = active_folder(session)?;
        match parsed.positional(0) {
            Some(name) => {
                let object = self.objects.show(kind, &folder, name)?;
                session.remember_object(&folder, object.name());
                Ok(CommandResult::success(
                    format!("{kind} '{name}'"),
                    Payload::Object(object),
                ))
            }
            None => self.listing(kind, folder, &FilterPredicate::default(), session),
        }
    }

    fn show_filter(
        &self,
        kind: ObjectKind,
        parsed: &ParsedCommand,
        session: &mut Session,
    ) -> Result<CommandResult> {
        let folder = active_folder(session)?;
        let predicate = FilterPredicate::from_parsed(parsed)?;
        self.listing(kind, folder, &predicate, session)
    }

    fn listing(
        &self,
        kind: ObjectKind,
        folder: String,
        predicate: &FilterPredicate,
        session: &mut Session,
    ) -> Result<CommandResult> {
        let objects = self.objects.list(kind, &folder, predicate)?;
        for object in &objects {
            session.remember_object(&folder, object.name());
        }
        let summary = format!("{} {kind}(s) in folder '{folder}'", objects.len());
        Ok(CommandResult::success(
            summary,
            Payload::Objects {
                kind,
                folder,
                filter: predicate.describe(),
                objects,
            },
        ))
    }

    fn delete(
        &self,
        kind: ObjectKind,
        parsed: &ParsedCommand,
        session: &mut Session,
    ) -> Result<CommandResult> {
        let folder = active_folder(session)?;
        let name = parsed
            .positional(0)
            .ok_or_else(|| ScmError::syntax("missing required parameter <name>"))?;
        let DeleteOutcome::Deleted { kind, name } = self.objects.delete(kind, &folder, name)?;
        session.forget_object(&folder, &name);
        let message = format!("Deleted {kind} '{name}' from folder '{folder}'");
        Ok(CommandResult::success(message.clone(), Payload::Message(message)))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────────────

    fn history_command(&self, parsed: &ParsedCommand) -> Result<CommandResult> {
        if parsed.flag("--clear") {
            let removed = self.history.clear()?;
            let message = format!("Cleared {removed} history entries");
            return Ok(CommandResult::success(message.clone(), Payload::Message(message)));
        }

        if let Some(id) = parsed.integer("--id") {
            let id = i64::try_from(id)
                .map_err(|_| ScmError::validation(format!("history id {id} is out of range")))?;
            let entry = self.history.get(id)?;
            return Ok(CommandResult::success(
                format!("history entry {id}"),
                Payload::HistoryEntry(entry),
            ));
        }

        let query = HistoryQuery {
            page: to_u32("--page", parsed.integer("--page").unwrap_or(1))?,
            page_size: to_u32(
                "--limit",
                parsed.integer("--limit").unwrap_or(u64::from(self.page_size)),
            )?,
            folder: parsed.text("--folder").map(str::to_string),
            text: parsed.text("--filter").map(str::to_string),
        };
        let page = self.history.page(&query)?;
        Ok(CommandResult::success(
            format!(
                "{} of {} history entries",
                page.entries.len(),
                page.total
            ),
            Payload::HistoryPage(page),
        ))
    }
}

fn active_folder(session: &Session) -> Result<String> {
    session
        .current_mode()
        .folder()
        .map(str::to_string)
        .ok_or_else(|| ScmError::mode("enter a folder with 'edit folder <name>' first"))
}

fn to_u32(keyword: &str, value: u64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| ScmError::validation(format!("'{keyword}' value {value} is too large")))
}

fn object_fields(kind: ObjectKind, parsed: &ParsedCommand) -> Result<ObjectFields> {
    match kind {
        ObjectKind::AddressObject => {
            let name = parsed
                .text("name")
                .ok_or_else(|| ScmError::syntax("missing required parameter 'name'"))?;
            let address_type = parsed
                .text("type")
                .map(|raw| {
                    AddressType::from_str(raw).map_err(|_| {
                        ScmError::validation(format!("unknown address type '{raw}'"))
                    })
                })
                .transpose()?;
            Ok(ObjectFields::Address(AddressFields {
                name: name.to_string(),
                address_type,
                value: parsed.text("value").map(str::to_string),
                description: parsed.text("description").map(str::to_string),
                tags: parsed
                    .list("tags")
                    .map(|tags| tags.iter().cloned().collect()),
            }))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plain-text rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Table of objects: one row each, columns from [`ConfigObject::fields`].
pub fn object_table(objects: &[ConfigObject]) -> TextTable {
    let headers = objects
        .first()
        .map(|o| o.fields().into_iter().map(|(k, _)| k).collect::<Vec<_>>())
        .unwrap_or_else(|| vec!["name", "type", "value", "description", "tags"]);
    let mut table = TextTable::new(headers);
    for object in objects {
        table.push_row(object.fields().into_iter().map(|(_, v)| v).collect());
    }
    table
}

pub fn history_table(entries: &[HistoryEntry]) -> TextTable {
    let mut table = TextTable::new(["ID", "Timestamp", "Folder", "Status", "Command"]);
    for entry in entries {
        table.push_row(vec![
            entry.id.to_string(),
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.folder.clone().unwrap_or_else(|| "-".to_string()),
            entry.status.to_string(),
            entry.command_text.clone(),
        ]);
    }
    table
}

/// `history --page N` with the page's other options carried over.
pub fn page_hint(page: &HistoryPage, target: u32) -> String {
    let mut hint = format!("history --page {target}");
    let query = &page.query;
    hint.push_str(&format!(" --limit {}", query.page_size));
    if let Some(folder) = &query.folder {
        hint.push_str(&format!(" --folder {}", quote_if_needed(folder)));
    }
    if let Some(text) = &query.text {
        hint.push_str(&format!(" --filter {}", quote_if_needed(text)));
    }
    hint
}

fn quote_if_needed(value: &str) -> String {
    if value.is_empty() || value.contains(char::is_whitespace) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

pub fn history_page_title(page: &HistoryPage) -> String {
    let mut title = format!(
        "Command History (page {} of {}, {} total)",
        page.query.page,
        page.total_pages().max(1),
        page.total
    );
    let mut filters = Vec::new();
    if let Some(folder) = &page.query.folder {
        filters.push(format!("folder={folder}"));
    }
    if let Some(text) = &page.query.text {
        filters.push(format!("filter={text}"));
    }
    if !filters.is_empty() {
        title.push_str(&format!(" [{}]", filters.join(", ")));
    }
    title
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::None => Ok(()),
            Payload::Message(message) => writeln!(f, "{message}"),
            Payload::Help(text) => write!(f, "{text}"),
            Payload::Object(object) => {
                let fields = object.fields();
                let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
                for (key, value) in fields {
                    writeln!(f, "{key:<width$}  {value}")?;
                }
                Ok(())
            }
            Payload::Objects {
                kind,
                folder,
                filter,
                objects,
            } => {
                if filter.is_empty() {
                    writeln!(f, "{kind} in folder '{folder}':")?;
                } else {
                    writeln!(f, "{kind} in folder '{folder}' matching {filter}:")?;
                }
                if objects.is_empty() {
                    writeln!(f, "(none)")
                } else {
                    write!(f, "{}", object_table(objects).render())
                }
            }
            Payload::HistoryPage(page) => {
                writeln!(f, "{}", history_page_title(page))?;
                if page.entries.is_empty() {
                    return writeln!(f, "No history entries.");
                }
                write!(f, "{}", history_table(&page.entries).render())?;
                if page.has_previous() {
                    writeln!(f, "Previous: {}", page_hint(page, page.query.page - 1))?;
                }
                if page.has_next() {
                    writeln!(f, "Next: {}", page_hint(page, page.query.page + 1))?;
                }
                Ok(())
            }
            Payload::HistoryEntry(entry) => {
                writeln!(f, "History entry {}", entry.id)?;
                writeln!(f, "Timestamp: {}", entry.timestamp.to_rfc3339())?;
                writeln!(f, "Mode:      {}", entry.mode)?;
                writeln!(f, "Folder:    {}", entry.folder.as_deref().unwrap_or("-"))?;
                writeln!(f, "Status:    {}", entry.status)?;
                writeln!(f, "Command:   {}", entry.command_text)?;
                writeln!(f, "Summary:   {}", entry.summary)?;
                writeln!(f, "Output:")?;
                write!(f, "{}", entry.output_text)
            }
        }
    }
}
