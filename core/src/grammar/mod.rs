//! Grammar engine: one declarative command table drives parsing, completion
//! and help.

mod complete;
mod help;
mod parse;
mod table;
mod tokenize;

pub use complete::Completion;
pub use help::help_request;
pub use parse::ClauseValue;
pub use parse::ParsedCommand;
pub use table::ClauseSpec;
pub use table::CommandId;
pub use table::CommandSpec;
pub use table::NameSource;
pub use table::ParamSpec;
pub use table::ValueType;
pub use tokenize::tokenize;

use crate::errors::Result;
use crate::session::ModeKind;
use crate::session::Session;

/// The command table, built once per process.
#[derive(Debug, Clone)]
pub struct Grammar {
    specs: Vec<CommandSpec>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar {
    pub fn new() -> Self {
        Self {
            specs: table::command_table(),
        }
    }

    pub fn specs(&self) -> &[CommandSpec] {
        &self.specs
    }

    pub fn spec(&self, id: CommandId) -> Option<&CommandSpec> {
        self.specs.iter().find(|s| s.id == id)
    }

    pub fn parse(&self, mode: ModeKind, line: &str) -> Result<ParsedCommand> {
        parse::parse(&self.specs, mode, line)
    }

    pub fn complete(&self, session: &Session, line: &str) -> Completion {
        complete::complete(&self.specs, session, line)
    }

    pub fn help(&self, mode: ModeKind, prefix: &str) -> String {
        help::help(&self.specs, mode, prefix)
    }
}
