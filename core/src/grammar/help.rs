//! Context-sensitive help text generated from the command table.

use super::parse::longest_match;
use super::parse::mode_hint;
use super::table::ClauseSpec;
use super::table::CommandSpec;
use super::table::ValueType;
use super::tokenize::split_partial;
use crate::session::ModeKind;
use unicode_width::UnicodeWidthStr;

/// If `line` ends with `?`, the text before it.
pub fn help_request(line: &str) -> Option<&str> {
    line.trim_end().strip_suffix('?')
}

pub fn help(specs: &[CommandSpec], mode: ModeKind, prefix: &str) -> String {
    let split = split_partial(prefix);
    let mut words = split.tokens;
    if !split.partial.is_empty() {
        words.push(split.partial);
    }

    if words.is_empty() {
        return command_list(
            &format!("Available commands ({mode} mode):"),
            specs.iter().filter(|s| s.valid_in(mode)),
        );
    }

    if let Some(spec) = longest_match(specs, &words) {
        return command_detail(spec, mode, &words[spec.words.len()..]);
    }

    let (last, leading) = match words.split_last() {
        Some(split) => split,
        None => return String::new(),
    };
    let matching: Vec<&CommandSpec> = specs
        .iter()
        .filter(|s| s.valid_in(mode) && s.words.len() > leading.len())
        .filter(|s| {
            s.words.iter().zip(leading).all(|(w, t)| w == t)
                && s.words[leading.len()].starts_with(last.as_str())
        })
        .collect();
    if matching.is_empty() {
        return format!(
            "No help for '{}' in {mode} mode. Type '?' for available commands.\n",
            words.join(" ")
        );
    }
    command_list("Matching commands:", matching)
}

fn command_list<'a>(title: &str, specs: impl IntoIterator<Item = &'a CommandSpec>) -> String {
    let specs: Vec<&CommandSpec> = specs.into_iter().collect();
    let width = specs
        .iter()
        .map(|s| s.command_text().width())
        .max()
        .unwrap_or(0);
    let mut out = format!("{title}\n");
    for spec in specs {
        let text = spec.command_text();
        let pad = width.saturating_sub(text.width());
        out.push_str(&format!("  {text}{}  {}\n", " ".repeat(pad), spec.description));
    }
    out
}

fn command_detail(spec: &CommandSpec, mode: ModeKind, args: &[String]) -> String {
    let mut out = format!("Syntax: {}\n  {}\n", spec.syntax(), spec.description);

    if !spec.clauses.is_empty() {
        let width = spec
            .clauses
            .iter()
            .map(|c| c.keyword.width())
            .max()
            .unwrap_or(0);
        out.push_str("Options:\n");
        for clause in &spec.clauses {
            let pad = width.saturating_sub(clause.keyword.width());
            let required = if clause.required { " (required)" } else { "" };
            out.push_str(&format!(
                "  {}{}  {}{required}\n",
                clause.keyword,
                " ".repeat(pad),
                clause.help
            ));
        }
    }

    if let Some(clause) = pending_clause(spec, args) {
        out.push_str(&format!("Expected value for '{}': {}\n", clause.keyword, clause.help));
        if let ValueType::Choice(values) = clause.value {
            out.push_str(&format!("  one of: {}\n", values.join(", ")));
        }
    }

    if !spec.valid_in(mode) {
        out.push_str(&format!(
            "Not available in {mode} mode; {}\n",
            mode_hint(spec)
        ));
    }
    out
}

/// The clause whose value the user is about to type, if any.
fn pending_clause<'a>(spec: &'a CommandSpec, args: &[String]) -> Option<&'a ClauseSpec> {
    let mut pending: Option<&ClauseSpec> = None;
    for arg in args {
        if pending.take().is_some() {
            continue;
        }
        pending = spec.clause(arg).filter(|c| c.value != ValueType::Flag);
    }
    pending
}
