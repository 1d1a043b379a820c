//! Terminal presentation of shell outcomes.

use owo_colors::OwoColorize;
use owo_colors::Style;
use scm_core::CommandResult;
use scm_core::CommandStatus;
use scm_core::ConfigObject;
use scm_core::HistoryEntry;
use scm_core::HistoryPage;
use scm_core::LineOutcome;
use scm_core::Payload;
use scm_core::dispatcher::history_page_title;
use scm_core::dispatcher::history_table;
use scm_core::dispatcher::object_table;
use scm_core::dispatcher::page_hint;
use scm_core::text_table::TextTable;
use scm_core::text_table::format_row;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn render(&self, outcome: &LineOutcome) -> String {
        match outcome {
            LineOutcome::Empty => String::new(),
            LineOutcome::Help(text) => text.clone(),
            LineOutcome::Executed {
                result,
                history_error,
                ..
            } => {
                let mut out = self.render_result(result);
                if let Some(err) = history_error {
                    out.push_str(&self.paint(
                        &format!("Warning: command not recorded in history: {err}\n"),
                        Style::new().yellow(),
                    ));
                }
                out
            }
        }
    }

    pub fn render_result(&self, result: &CommandResult) -> String {
        if !result.is_success() {
            return self.paint(
                &format!("Error: {}\n", result.summary),
                Style::new().red().bold(),
            );
        }
        match &result.payload {
            Payload::None => self.paint(&format!("{}\n", result.summary), Style::new().green()),
            Payload::Message(message) => self.paint(&format!("{message}\n"), Style::new().green()),
            Payload::Help(text) => text.clone(),
            Payload::Object(object) => {
                let mut out = self.paint(&format!("{}\n", result.summary), Style::new().green());
                out.push_str(&self.object_detail(object));
                out
            }
            Payload::Objects {
                kind,
                folder,
                filter,
                objects,
            } => {
                let title = if filter.is_empty() {
                    format!("{kind} in folder '{folder}' ({} found)", objects.len())
                } else {
                    format!(
                        "{kind} in folder '{folder}' matching {filter} ({} found)",
                        objects.len()
                    )
                };
                let mut out = self.paint(&format!("{title}\n"), Style::new().bold());
                if objects.is_empty() {
                    out.push_str("(none)\n");
                } else {
                    out.push_str(&self.table(&object_table(objects), |_| None));
                }
                out
            }
            Payload::HistoryPage(page) => self.history_page(page),
            Payload::HistoryEntry(entry) => self.history_entry(entry),
        }
    }

    fn object_detail(&self, object: &ConfigObject) -> String {
        let fields = object.fields();
        let width = fields.iter().map(|(k, _)| k.width()).max().unwrap_or(0);
        let mut out = String::new();
        for (key, value) in fields {
            let padded = format!("{key}:{}", " ".repeat(width - key.width()));
            out.push_str(&format!(
                "  {} {value}\n",
                self.paint(&padded, Style::new().bold())
            ));
        }
        out
    }

    /// Header in bold; `row_style` may color individual rows.
    fn table(&self, table: &TextTable, row_style: impl Fn(usize) -> Option<Style>) -> String {
        let widths = table.widths();
        let mut out = self.paint(&format_row(&table.headers, &widths), Style::new().bold());
        out.push('\n');
        for (idx, row) in table.rows.iter().enumerate() {
            let line = format_row(row, &widths);
            match row_style(idx) {
                Some(style) => out.push_str(&self.paint(&line, style)),
                None => out.push_str(&line),
            }
            out.push('\n');
        }
        out
    }

    fn history_page(&self, page: &HistoryPage) -> String {
        let mut out = self.paint(&format!("{}\n", history_page_title(page)), Style::new().bold());
        if page.entries.is_empty() {
            out.push_str("No history entries.\n");
            return out;
        }
        let failures: Vec<bool> = page.entries.iter().map(|e| e.status == CommandStatus::Failure).collect();
        out.push_str(&self.table(&history_table(&page.entries), |idx| {
            failures
                .get(idx)
                .copied()
                .unwrap_or(false)
                .then_some(Style::new().red())
        }));
        if page.has_previous() {
            out.push_str(&self.paint(
                &format!("Previous page: {}\n", page_hint(page, page.query.page - 1)),
                Style::new().dimmed(),
            ));
        }
        if page.has_next() {
            out.push_str(&self.paint(
                &format!("Next page: {}\n", page_hint(page, page.query.page + 1)),
                Style::new().dimmed(),
            ));
        }
        out
    }

    fn history_entry(&self, entry: &HistoryEntry) -> String {
        let status_style = if entry.status == CommandStatus::Success {
            Style::new().green()
        } else {
            Style::new().red()
        };
        let label = |text: &str| self.paint(&format!("{text:<10}"), Style::new().bold());
        let mut out = self.paint(&format!("History entry {}\n", entry.id), Style::new().bold());
        out.push_str(&format!("{} {}\n", label("Timestamp:"), entry.timestamp.to_rfc3339()));
        out.push_str(&format!("{} {}\n", label("Mode:"), entry.mode));
        out.push_str(&format!(
            "{} {}\n",
            label("Folder:"),
            entry.folder.as_deref().unwrap_or("-")
        ));
        out.push_str(&format!(
            "{} {}\n",
            label("Status:"),
            self.paint(entry.status.as_ref(), status_style)
        ));
        out.push_str(&format!("{} {}\n", label("Command:"), entry.command_text));
        out.push_str(&format!("{} {}\n", label("Summary:"), entry.summary));
        out.push_str(&format!("{}\n", label("Output:")));
        out.push_str(&entry.output_text);
        if !entry.output_text.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}
