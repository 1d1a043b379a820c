//! Interactive loop on rustyline, plus the non-interactive script runner.

use crate::render::Renderer;
use anyhow::Result;
use anyhow::anyhow;
use rustyline::Context;
use rustyline::Editor;
use rustyline::completion::Completer;
use rustyline::completion::Pair;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use scm_core::Grammar;
use scm_core::Session;
use scm_core::Shell;
use std::io::Write;

/// Completion source for the line editor.
///
/// Holds a snapshot of the session taken before each prompt, since the
/// editor owns its helper while a line is being read.
pub struct ShellHelper {
    grammar: Grammar,
    session: Session,
}

impl ShellHelper {
    pub fn new(session: Session) -> Self {
        Self {
            grammar: Grammar::new(),
            session,
        }
    }

    fn sync(&mut self, session: &Session) {
        self.session = session.clone();
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let completion = self.grammar.complete(&self.session, &line[..pos]);
        let pairs = completion
            .candidates
            .into_iter()
            .map(|candidate| Pair {
                replacement: format!("{candidate} "),
                display: candidate,
            })
            .collect();
        Ok((completion.start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    /// Greyed-out remainder when exactly one completion fits.
    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if line.is_empty() || pos < line.len() {
            return None;
        }
        let completion = self.grammar.complete(&self.session, line);
        let [only] = completion.candidates.as_slice() else {
            return None;
        };
        let partial = line.get(completion.start..)?;
        let rest = only.strip_prefix(partial)?;
        (!rest.is_empty()).then(|| rest.to_string())
    }
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl rustyline::Helper for ShellHelper {}

pub fn run_interactive(shell: &mut Shell, renderer: Renderer) -> Result<()> {
    let mut rl: Editor<ShellHelper, DefaultHistory> =
        Editor::new().map_err(|e| anyhow!("failed to initialise line editor: {e}"))?;
    rl.set_helper(Some(ShellHelper::new(shell.session().clone())));

    println!("Strata Cloud Manager shell. Type '?' for help, 'quit' to leave.");
    loop {
        if let Some(helper) = rl.helper_mut() {
            helper.sync(shell.session());
        }
        let line = match rl.readline(&shell.prompt()) {
            Ok(line) => line,
            Err(ReadlineError::Eof) => break,
            Err(ReadlineError::Interrupted) => continue,
            Err(e) => return Err(anyhow!("readline error: {e}")),
        };
        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(line.as_str());
        }
        let outcome = shell.run_line(&line);
        print!("{}", renderer.render(&outcome));
        std::io::stdout().flush()?;
        if outcome.terminates() {
            break;
        }
    }
    tracing::info!("interactive session ended");
    Ok(())
}

/// Runs `lines` in order, stopping early on `quit` or a final `exit`.
///
/// With `echo`, each line is printed after the prompt it was entered at so
/// the transcript reads like an interactive session. Returns `false` when
/// any command failed.
pub fn run_script<I, S>(shell: &mut Shell, renderer: Renderer, lines: I, echo: bool) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut all_ok = true;
    let mut out = String::new();
    for line in lines {
        let line = line.as_ref();
        if echo {
            out.push_str(&format!("{}{}\n", shell.prompt(), line.trim_end()));
        }
        let outcome = shell.run_line(line);
        if outcome.failed() {
            all_ok = false;
        }
        out.push_str(&renderer.render(&outcome));
        print!("{out}");
        out.clear();
        if outcome.terminates() {
            break;
        }
    }
    all_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scm_core::HistoryDb;
    use scm_core::InMemoryObjectStore;
    use scm_core::ShellSettings;

    fn shell() -> Shell {
        Shell::new(
            "user",
            Box::new(InMemoryObjectStore::new()),
            HistoryDb::open_in_memory().expect("history"),
            &ShellSettings::default(),
        )
    }

    #[test]
    fn test_helper_completes_mode_commands() {
        let helper = ShellHelper::new(Session::new("user"));
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        let (start, pairs) = helper.complete("con", 3, &ctx).expect("complete");
        assert_eq!(start, 0);
        let replacements: Vec<_> = pairs.into_iter().map(|p| p.replacement).collect();
        assert_eq!(replacements, vec!["configure ".to_string()]);
        assert_eq!(helper.hint("con", 3, &ctx), Some("figure".to_string()));
    }

    #[test]
    fn test_helper_follows_session_snapshot() {
        let mut shell = shell();
        let mut helper = ShellHelper::new(shell.session().clone());
        shell.run_line("configure");
        helper.sync(shell.session());
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        let (_, pairs) = helper.complete("edit folder ", 12, &ctx).expect("complete");
        let names: Vec<_> = pairs.into_iter().map(|p| p.display).collect();
        assert_eq!(names, vec!["Shared".to_string()]);
    }

    #[test]
    fn test_script_stops_at_quit_and_reports_failure() {
        let mut shell = shell();
        let ok = run_script(
            &mut shell,
            Renderer::new(false),
            ["configure", "bogus", "quit", "configure"],
            false,
        );
        assert!(!ok);
        assert_eq!(shell.history().count().expect("count"), 3);
    }
}
