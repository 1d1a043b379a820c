//! Prefix completion driven by the command table.

use super::parse::longest_match;
use super::table::ClauseSpec;
use super::table::CommandSpec;
use super::table::NameSource;
use super::table::ValueType;
use super::tokenize::PartialLine;
use super::tokenize::split_partial;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    /// Byte offset in the line where the replaced word starts.
    pub start: usize,
    pub candidates: Vec<String>,
}

pub fn complete(specs: &[CommandSpec], session: &Session, line: &str) -> Completion {
    let PartialLine {
        tokens,
        partial,
        start,
    } = split_partial(line);
    let mode = session.current_mode().kind();
    let visible: Vec<&CommandSpec> = specs.iter().filter(|s| s.valid_in(mode)).collect();
    let mut candidates = Candidates::new(&partial);

    let depth = tokens.len();
    for spec in &visible {
        if depth < spec.words.len()
            && spec
                .words
                .iter()
                .zip(&tokens)
                .all(|(word, token)| word == token)
        {
            candidates.offer(spec.words[depth]);
        }
    }

    if let Some(spec) = longest_match(visible.iter().copied(), &tokens) {
        complete_arguments(spec, &tokens[spec.words.len()..], session, &mut candidates);
    }

    Completion {
        start,
        candidates: candidates.into_vec(),
    }
}

fn complete_arguments(
    spec: &CommandSpec,
    args: &[String],
    session: &Session,
    candidates: &mut Candidates,
) {
    let mut used: Vec<&str> = Vec::new();
    let mut positional = 0;
    let mut pending: Option<&ClauseSpec> = None;

    for arg in args {
        if pending.take().is_some() {
            continue;
        }
        match spec.clause(arg) {
            Some(clause) => {
                used.push(clause.keyword);
                if clause.value != ValueType::Flag {
                    pending = Some(clause);
                }
            }
            None => positional += 1,
        }
    }

    if let Some(clause) = pending {
        match clause.value {
            ValueType::Choice(values) => values.iter().for_each(|v| candidates.offer(v)),
            ValueType::Text(source) => offer_names(source, session, candidates),
            ValueType::List | ValueType::Integer | ValueType::Flag => {}
        }
        return;
    }

    if let Some(param) = spec.params.get(positional)
        && !param.greedy
    {
        offer_names(param.source, session, candidates);
    }
    for clause in &spec.clauses {
        if !used.contains(&clause.keyword) {
            candidates.offer(clause.keyword);
        }
    }
}

fn offer_names(source: NameSource, session: &Session, candidates: &mut Candidates) {
    let names: &[String] = match source {
        NameSource::None => &[],
        NameSource::Folders => session.known_folders(),
        NameSource::Objects => match session.current_mode().folder() {
            Some(folder) => session.known_objects(folder),
            None => &[],
        },
    };
    for name in names {
        candidates.offer(name);
    }
}

/// Ordered, de-duplicated, prefix-filtered candidate list.
struct Candidates {
    prefix: String,
    items: Vec<String>,
}

impl Candidates {
    fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_lowercase(),
            items: Vec::new(),
        }
    }

    fn offer(&mut self, candidate: &str) {
        if !candidate.to_lowercase().starts_with(&self.prefix) {
            return;
        }
        let rendered = if candidate.contains(char::is_whitespace) {
            format!("\"{candidate}\"")
        } else {
            candidate.to_string()
        };
        if !self.items.contains(&rendered) {
            self.items.push(rendered);
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}
