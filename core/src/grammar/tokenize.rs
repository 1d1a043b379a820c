//! Whitespace tokenizer with double-quote grouping.

use crate::errors::{Result, ScmError};

/// Split a full command line. Quotes group words and are removed; `""` yields
/// an empty token. An unterminated quote is a syntax error.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let scan = scan(line);
    if scan.open_quote {
        return Err(ScmError::syntax("unterminated quote"));
    }
    let mut tokens = scan.tokens;
    if let Some(current) = scan.current {
        tokens.push(current.text);
    }
    Ok(tokens)
}

/// Lenient split for completion: finished tokens, the word under the cursor,
/// and the byte offset where that word starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialLine {
    pub tokens: Vec<String>,
    pub partial: String,
    pub start: usize,
}

pub fn split_partial(line: &str) -> PartialLine {
    let scan = scan(line);
    match scan.current {
        Some(current) => PartialLine {
            tokens: scan.tokens,
            partial: current.text,
            start: current.start,
        },
        None => PartialLine {
            tokens: scan.tokens,
            partial: String::new(),
            start: line.len(),
        },
    }
}

struct Word {
    text: String,
    start: usize,
}

struct Scan {
    tokens: Vec<String>,
    current: Option<Word>,
    open_quote: bool,
}

fn scan(line: &str) -> Scan {
    let mut tokens = Vec::new();
    let mut current: Option<Word> = None;
    let mut in_quote = false;

    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => {
                in_quote = !in_quote;
                current.get_or_insert_with(|| Word {
                    text: String::new(),
                    start: idx,
                });
            }
            c if c.is_whitespace() && !in_quote => {
                if let Some(word) = current.take() {
                    tokens.push(word.text);
                }
            }
            c => current
                .get_or_insert_with(|| Word {
                    text: String::new(),
                    start: idx,
                })
                .text
                .push(c),
        }
    }

    Scan {
        tokens,
        current,
        open_quote: in_quote,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quotes_group_words() {
        assert_eq!(
            tokenize(r#"set address-object name web description "front door""#).expect("tokens"),
            vec![
                "set",
                "address-object",
                "name",
                "web",
                "description",
                "front door"
            ]
        );
    }

    #[test]
    fn test_empty_quotes_yield_empty_token() {
        assert_eq!(
            tokenize(r#"description """#).expect("tokens"),
            vec!["description", ""]
        );
    }

    #[test]
    fn test_unterminated_quote_is_syntax_error() {
        let err = tokenize(r#"description "oops"#).expect_err("open quote");
        assert_eq!(err.category(), crate::ErrorCategory::SyntaxError);
    }

    #[test]
    fn test_split_partial_tracks_cursor_word() {
        let split = split_partial("show addr");
        assert_eq!(split.tokens, vec!["show"]);
        assert_eq!(split.partial, "addr");
        assert_eq!(split.start, 5);

        let split = split_partial("show ");
        assert_eq!(split.partial, "");
        assert_eq!(split.start, 5);
    }
}
