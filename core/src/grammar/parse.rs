//! Line → `ParsedCommand`.

use super::table::CommandId;
use super::table::CommandSpec;
use super::table::ValueType;
use super::tokenize::tokenize;
use crate::errors::{Result, ScmError};
use crate::session::ModeKind;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseValue {
    Text(String),
    List(Vec<String>),
    Integer(u64),
    Flag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub id: CommandId,
    pub positionals: Vec<String>,
    /// Keyed by the clause keyword as declared (`type`, `--page`, ...).
    pub clauses: BTreeMap<&'static str, ClauseValue>,
    pub raw: String,
}

impl ParsedCommand {
    pub fn positional(&self, idx: usize) -> Option<&str> {
        self.positionals.get(idx).map(String::as_str)
    }

    pub fn text(&self, keyword: &str) -> Option<&str> {
        match self.clauses.get(keyword) {
            Some(ClauseValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn list(&self, keyword: &str) -> Option<&[String]> {
        match self.clauses.get(keyword) {
            Some(ClauseValue::List(values)) => Some(values),
            _ => None,
        }
    }

    pub fn integer(&self, keyword: &str) -> Option<u64> {
        match self.clauses.get(keyword) {
            Some(ClauseValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn flag(&self, keyword: &str) -> bool {
        matches!(self.clauses.get(keyword), Some(ClauseValue::Flag))
    }
}

/// The command whose words form the longest full prefix of `tokens`.
pub(crate) fn longest_match<'a>(
    specs: impl IntoIterator<Item = &'a CommandSpec>,
    tokens: &[String],
) -> Option<&'a CommandSpec> {
    specs
        .into_iter()
        .filter(|spec| words_match(spec, tokens))
        .max_by_key(|spec| spec.words.len())
}

fn words_match(spec: &CommandSpec, tokens: &[String]) -> bool {
    spec.words.len() <= tokens.len()
        && spec
            .words
            .iter()
            .zip(tokens)
            .all(|(word, token)| word == token)
}

/// Leading tokens up to and including the first one no command accepts.
fn unmatched_prefix(specs: &[CommandSpec], tokens: &[String]) -> String {
    let matched = specs
        .iter()
        .map(|spec| {
            spec.words
                .iter()
                .zip(tokens)
                .take_while(|(word, token)| word == token)
                .count()
        })
        .max()
        .unwrap_or(0);
    let end = (matched + 1).min(tokens.len());
    tokens[..end].join(" ")
}

pub(crate) fn mode_hint(spec: &CommandSpec) -> &'static str {
    match spec.modes {
        [ModeKind::FolderEdit] => "enter a folder with 'edit folder <name>' first",
        [ModeKind::Configuration] => "enter configuration mode with 'configure' first",
        [ModeKind::Operational] => "only available in operational mode",
        _ => "",
    }
}

pub fn parse(specs: &[CommandSpec], mode: ModeKind, line: &str) -> Result<ParsedCommand> {
    let tokens = tokenize(line)?;
    if tokens.is_empty() {
        return Err(ScmError::syntax("empty command"));
    }

    let Some(spec) = longest_match(specs, &tokens) else {
        return Err(ScmError::UnknownCommand {
            token: unmatched_prefix(specs, &tokens),
            mode,
        });
    };
    if !spec.valid_in(mode) {
        return Err(ScmError::mode(format!(
            "'{}' is not valid in {mode} mode; {}",
            spec.command_text(),
            mode_hint(spec)
        )));
    }

    let mut positionals: Vec<String> = Vec::new();
    let mut clauses = BTreeMap::new();
    let mut args = tokens.into_iter().skip(spec.words.len());

    while let Some(token) = args.next() {
        if let Some(clause) = spec.clause(&token) {
            if clauses.contains_key(clause.keyword) {
                return Err(ScmError::syntax(format!(
                    "'{}' given more than once",
                    clause.keyword
                )));
            }
            let value = match clause.value {
                ValueType::Flag => ClauseValue::Flag,
                value_type => {
                    let raw = args.next().ok_or_else(|| {
                        ScmError::syntax(format!("'{}' expects a value", clause.keyword))
                    })?;
                    parse_value(clause.keyword, value_type, raw)?
                }
            };
            clauses.insert(clause.keyword, value);
            continue;
        }

        match spec.params.get(positionals.len()) {
            Some(param) if param.greedy => {
                let rest: Vec<String> = std::iter::once(token).chain(args.by_ref()).collect();
                positionals.push(rest.join(" "));
            }
            Some(_) => positionals.push(token),
            None => {
                return Err(ScmError::syntax(format!(
                    "unexpected argument '{token}' for '{}'",
                    spec.command_text()
                )));
            }
        }
    }

    if let Some(param) = spec
        .params
        .iter()
        .skip(positionals.len())
        .find(|p| p.required)
    {
        return Err(ScmError::syntax(format!(
            "missing required parameter <{}>; usage: {}",
            param.name,
            spec.syntax()
        )));
    }
    if let Some(clause) = spec
        .clauses
        .iter()
        .find(|c| c.required && !clauses.contains_key(c.keyword))
    {
        return Err(ScmError::syntax(format!(
            "missing required parameter '{}'; usage: {}",
            clause.keyword,
            spec.syntax()
        )));
    }

    tracing::debug!(command = %spec.command_text(), "parsed command");
    Ok(ParsedCommand {
        id: spec.id,
        positionals,
        clauses,
        raw: line.trim().to_string(),
    })
}

fn parse_value(keyword: &str, value_type: ValueType, raw: String) -> Result<ClauseValue> {
    match value_type {
        ValueType::Text(_) => Ok(ClauseValue::Text(raw)),
        ValueType::Choice(values) => values
            .iter()
            .find(|v| v.eq_ignore_ascii_case(&raw))
            .map(|v| ClauseValue::Text((*v).to_string()))
            .ok_or_else(|| {
                ScmError::validation(format!(
                    "invalid value '{raw}' for '{keyword}'; expected one of: {}",
                    values.join(", ")
                ))
            }),
        ValueType::List => Ok(ClauseValue::List(
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        )),
        ValueType::Integer => raw.parse::<u64>().map(ClauseValue::Integer).map_err(|_| {
            ScmError::syntax(format!(
                "'{keyword}' expects a non-negative integer, got '{raw}'"
            ))
        }),
        ValueType::Flag => Ok(ClauseValue::Flag),
    }
}
