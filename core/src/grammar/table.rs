//! Declarative command table.
//!
//! Declaration order is presentation order for help and completion.

use crate::objects::AddressType;
use crate::objects::ObjectKind;
use crate::session::ModeKind;
use strum::IntoEnumIterator;
use strum::VariantNames;

const ANY_MODE: &[ModeKind] = &[
    ModeKind::Operational,
    ModeKind::Configuration,
    ModeKind::FolderEdit,
];
const OPERATIONAL: &[ModeKind] = &[ModeKind::Operational];
const CONFIGURATION: &[ModeKind] = &[ModeKind::Configuration];
const FOLDER_EDIT: &[ModeKind] = &[ModeKind::FolderEdit];

/// Closed set of commands; the dispatcher matches on this exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    Configure,
    EditFolder,
    Set(ObjectKind),
    Show(ObjectKind),
    ShowFilter(ObjectKind),
    Delete(ObjectKind),
    History,
    Help,
    Exit,
    Quit,
}

/// Where completion candidates for a free-text value come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    None,
    Folders,
    Objects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text(NameSource),
    Choice(&'static [&'static str]),
    /// Comma-separated; items trimmed, empties dropped.
    List,
    /// Non-negative integer.
    Integer,
    /// Present or absent; takes no value.
    Flag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub required: bool,
    /// Swallows every remaining token.
    pub greedy: bool,
    pub source: NameSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseSpec {
    pub keyword: &'static str,
    pub value: ValueType,
    pub required: bool,
    pub help: &'static str,
}

impl ClauseSpec {
    fn optional(keyword: &'static str, value: ValueType, help: &'static str) -> Self {
        Self {
            keyword,
            value,
            required: false,
            help,
        }
    }

    fn required(keyword: &'static str, value: ValueType, help: &'static str) -> Self {
        Self {
            keyword,
            value,
            required: true,
            help,
        }
    }

    fn placeholder(&self) -> String {
        match self.value {
            ValueType::Flag => String::new(),
            ValueType::Choice(values) => format!(" <{}>", values.join("|")),
            ValueType::List => " <a,b,...>".to_string(),
            ValueType::Integer => " <n>".to_string(),
            ValueType::Text(_) => format!(" <{}>", self.bare()),
        }
    }

    fn bare(&self) -> &'static str {
        self.keyword.trim_start_matches('-')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub id: CommandId,
    pub words: Vec<&'static str>,
    pub modes: &'static [ModeKind],
    pub params: Vec<ParamSpec>,
    pub clauses: Vec<ClauseSpec>,
    pub description: &'static str,
}

impl CommandSpec {
    fn new(id: CommandId, words: Vec<&'static str>, modes: &'static [ModeKind]) -> Self {
        Self {
            id,
            words,
            modes,
            params: Vec::new(),
            clauses: Vec::new(),
            description: "",
        }
    }

    fn param(mut self, name: &'static str, required: bool, source: NameSource) -> Self {
        self.params.push(ParamSpec {
            name,
            required,
            greedy: false,
            source,
        });
        self
    }

    fn greedy_param(mut self, name: &'static str) -> Self {
        self.params.push(ParamSpec {
            name,
            required: false,
            greedy: true,
            source: NameSource::None,
        });
        self
    }

    fn clauses(mut self, clauses: Vec<ClauseSpec>) -> Self {
        self.clauses = clauses;
        self
    }

    fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn valid_in(&self, mode: ModeKind) -> bool {
        self.modes.contains(&mode)
    }

    pub fn clause(&self, keyword: &str) -> Option<&ClauseSpec> {
        self.clauses.iter().find(|c| c.keyword == keyword)
    }

    pub fn command_text(&self) -> String {
        self.words.join(" ")
    }

    /// One-line usage, e.g. `delete address-object <name>`.
    pub fn syntax(&self) -> String {
        let mut out = self.command_text();
        for param in &self.params {
            let rendered = if param.greedy {
                format!("<{}>...", param.name)
            } else {
                format!("<{}>", param.name)
            };
            if param.required {
                out.push_str(&format!(" {rendered}"));
            } else {
                out.push_str(&format!(" [{rendered}]"));
            }
        }
        for clause in &self.clauses {
            let rendered = format!("{}{}", clause.keyword, clause.placeholder());
            if clause.required {
                out.push_str(&format!(" {rendered}"));
            } else {
                out.push_str(&format!(" [{rendered}]"));
            }
        }
        out
    }
}

fn set_clauses(kind: ObjectKind) -> Vec<ClauseSpec> {
    match kind {
        ObjectKind::AddressObject => vec![
            ClauseSpec::required(
                "name",
                ValueType::Text(NameSource::Objects),
                "Object name (unique within the folder)",
            ),
            ClauseSpec::optional(
                "type",
                ValueType::Choice(AddressType::VARIANTS),
                "Address type; required when creating",
            ),
            ClauseSpec::optional(
                "value",
                ValueType::Text(NameSource::None),
                "Address value for the type; required when creating",
            ),
            ClauseSpec::optional(
                "description",
                ValueType::Text(NameSource::None),
                "Free-text description",
            ),
            ClauseSpec::optional("tags", ValueType::List, "Comma-separated tags"),
        ],
    }
}

fn filter_clauses(kind: ObjectKind) -> Vec<ClauseSpec> {
    match kind {
        ObjectKind::AddressObject => vec![
            ClauseSpec::optional(
                "--name",
                ValueType::Text(NameSource::None),
                "Name contains text (case-insensitive)",
            ),
            ClauseSpec::optional(
                "--type",
                ValueType::Choice(AddressType::VARIANTS),
                "Exact address type",
            ),
            ClauseSpec::optional(
                "--value",
                ValueType::Text(NameSource::None),
                "Value contains text (case-insensitive)",
            ),
            ClauseSpec::optional(
                "--tag",
                ValueType::Text(NameSource::None),
                "Object carries this tag",
            ),
        ],
    }
}

fn history_clauses() -> Vec<ClauseSpec> {
    vec![
        ClauseSpec::optional("--page", ValueType::Integer, "Page number, starting at 1"),
        ClauseSpec::optional("--limit", ValueType::Integer, "Entries per page"),
        ClauseSpec::optional(
            "--folder",
            ValueType::Text(NameSource::Folders),
            "Only commands run in this folder",
        ),
        ClauseSpec::optional(
            "--filter",
            ValueType::Text(NameSource::None),
            "Command text contains (case-insensitive)",
        ),
        ClauseSpec::optional("--id", ValueType::Integer, "Show one entry in full"),
        ClauseSpec::optional("--clear", ValueType::Flag, "Delete all history entries"),
    ]
}

/// Build the full ordered command table.
pub fn command_table() -> Vec<CommandSpec> {
    let mut specs = vec![
        CommandSpec::new(CommandId::Configure, vec!["configure"], OPERATIONAL)
            .describe("Enter configuration mode"),
        CommandSpec::new(CommandId::EditFolder, vec!["edit", "folder"], CONFIGURATION)
            .param("name", true, NameSource::Folders)
            .describe("Edit objects in a folder"),
    ];

    for kind in ObjectKind::iter() {
        let word: &'static str = kind.into();
        specs.push(
            CommandSpec::new(CommandId::Set(kind), vec!["set", word], FOLDER_EDIT)
                .clauses(set_clauses(kind))
                .describe("Create an object, or update the supplied fields of an existing one"),
        );
    }
    for kind in ObjectKind::iter() {
        let word: &'static str = kind.into();
        specs.push(
            CommandSpec::new(CommandId::Show(kind), vec!["show", word], FOLDER_EDIT)
                .param("name", false, NameSource::Objects)
                .describe("Show one object, or list all objects in the folder"),
        );
        specs.push(
            CommandSpec::new(
                CommandId::ShowFilter(kind),
                vec!["show", kind.filter_word()],
                FOLDER_EDIT,
            )
            .clauses(filter_clauses(kind))
            .describe("List objects matching every given filter"),
        );
    }
    for kind in ObjectKind::iter() {
        let word: &'static str = kind.into();
        specs.push(
            CommandSpec::new(CommandId::Delete(kind), vec!["delete", word], FOLDER_EDIT)
                .param("name", true, NameSource::Objects)
                .describe("Delete an object"),
        );
    }

    specs.extend([
        CommandSpec::new(CommandId::History, vec!["history"], ANY_MODE)
            .clauses(history_clauses())
            .describe("Browse, search, or clear the command history"),
        CommandSpec::new(CommandId::Help, vec!["help"], ANY_MODE)
            .greedy_param("command")
            .describe("Show help for a command"),
        CommandSpec::new(CommandId::Exit, vec!["exit"], ANY_MODE)
            .describe("Leave the current mode; ends the session at the top level"),
        CommandSpec::new(CommandId::Quit, vec!["quit"], ANY_MODE).describe("End the session"),
    ]);
    specs
}
