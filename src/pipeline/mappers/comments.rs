//! Comment splitter
//!
//! Turns [`TextLine`]s into [`LogicalLine`]s: the data part of a line separated from its
//! comment, with continuation lines folded in.
//!
//! # Logic
//!
//! - `;` starts a comment unless it appears inside double quotes or inside unbalanced
//!   `(` / `[` nesting. A backslash escapes the character after it; both stay in the data.
//! - `;--` opens a block comment that runs until the next `--;`, possibly lines later.
//!   Lines inside the block are comment-only.
//! - A line starting with spaces or tabs that follows a line whose nesting is still open is
//!   a continuation: its data and comment are appended to the previous logical line and the
//!   nesting state carries over. Any other line with leading whitespace has it stripped and
//!   gets `W_WSH_BOL`.
//! - Trailing spaces or tabs at the end of the physical line raise `W_WSH_EOL`, and so do
//!   spaces or tabs between data and the `;` of its comment. A line raises it at most once.
//! - Data is trimmed on both ends.
//!
//! Because a continuation can only be recognized once the next line is seen, the splitter
//! holds one logical line back and releases the last one on flush.

use super::{LogicalLine, TextLine};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::pipeline::mapper::LineMapper;

const BLOCK_OPEN: &str = "--";
const BLOCK_CLOSE: &str = "--;";

/// Quote and bracket state at the end of a scanned fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Nesting {
    in_quote: bool,
    parens: usize,
    brackets: usize,
}

impl Nesting {
    fn is_open(&self) -> bool {
        self.in_quote || self.parens > 0 || self.brackets > 0
    }
}

#[derive(Debug)]
struct Split {
    data: String,
    comment: Option<String>,
    nesting: Nesting,
    opens_block: bool,
    /// Data directly before a comment ends in blanks.
    padded: bool,
}

fn push_comment(comment: &mut Option<String>, text: &str) {
    comment.get_or_insert_with(String::new).push_str(text);
}

/// Scan `text` starting from `nesting` and split off the comment.
fn split(text: &str, mut nesting: Nesting) -> Split {
    let bytes = text.as_bytes();
    let mut data = String::new();
    let mut comment = None;
    let mut padded = false;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'"' => nesting.in_quote = !nesting.in_quote,
            b'(' if !nesting.in_quote => nesting.parens += 1,
            b')' if !nesting.in_quote => nesting.parens = nesting.parens.saturating_sub(1),
            b'[' if !nesting.in_quote => nesting.brackets += 1,
            b']' if !nesting.in_quote => nesting.brackets = nesting.brackets.saturating_sub(1),
            b';' if !nesting.is_open() => {
                data.push_str(&text[start..i]);
                padded |= data.ends_with(is_blank) && !data.trim_matches(is_blank).is_empty();
                let rest = &text[i + 1..];
                if let Some(block) = rest.strip_prefix(BLOCK_OPEN) {
                    match block.find(BLOCK_CLOSE) {
                        Some(end) => {
                            let close = i + 1 + BLOCK_OPEN.len() + end + BLOCK_CLOSE.len();
                            push_comment(&mut comment, &text[i + 1..close - 1]);
                            start = close;
                            i = close;
                            continue;
                        }
                        None => {
                            push_comment(&mut comment, rest);
                            return Split {
                                data,
                                comment,
                                nesting,
                                opens_block: true,
                                padded,
                            };
                        }
                    }
                }
                push_comment(&mut comment, rest);
                return Split {
                    data,
                    comment,
                    nesting,
                    opens_block: false,
                    padded,
                };
            }
            _ => {}
        }
        i += 1;
    }

    data.push_str(&text[start..]);
    Split {
        data,
        comment,
        nesting,
        opens_block: false,
        padded,
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// `W_WSH_EOL` for blanks before a comment, unless the line end already raised it.
fn check_padding(diagnostics: &Diagnostics, split: &Split, line: &TextLine) {
    if split.padded && !line.text.ends_with(is_blank) {
        diagnostics.emit(Diagnostic::new(DiagnosticKind::WshEol, line.location.clone()));
    }
}

struct Held {
    line: LogicalLine,
    nesting: Nesting,
}

pub struct CommentSplitter {
    diagnostics: Diagnostics,
    held: Option<Held>,
    in_block: bool,
}

impl CommentSplitter {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            held: None,
            in_block: false,
        }
    }

    /// Handle a line that starts inside a block comment.
    fn block_line(&mut self, line: &TextLine) -> Held {
        let text = line.text.as_str();
        let Some(end) = text.find(BLOCK_CLOSE) else {
            return Held {
                line: LogicalLine {
                    data: String::new(),
                    comment: Some(text.to_string()),
                    location: line.location.clone(),
                },
                nesting: Nesting::default(),
            };
        };

        self.in_block = false;
        let closing = &text[..end + BLOCK_OPEN.len()];
        let rest = text[end + BLOCK_CLOSE.len()..].trim_start_matches(is_blank);
        let mut held = self.scan(rest, Nesting::default(), line);
        let mut comment = closing.to_string();
        if let Some(tail) = held.line.comment.take() {
            comment.push_str(&tail);
        }
        held.line.comment = Some(comment);
        held
    }

    fn scan(&mut self, text: &str, nesting: Nesting, line: &TextLine) -> Held {
        let split = split(text, nesting);
        check_padding(&self.diagnostics, &split, line);
        self.in_block = split.opens_block;
        Held {
            line: LogicalLine {
                data: split.data.trim_matches(is_blank).to_string(),
                comment: split.comment,
                location: line.location.clone(),
            },
            nesting: split.nesting,
        }
    }
}

impl LineMapper for CommentSplitter {
    type Input = TextLine;
    type Output = LogicalLine;

    fn map(&mut self, line: TextLine) -> Option<LogicalLine> {
        if line.text.ends_with(is_blank) {
            self.diagnostics
                .emit(Diagnostic::new(DiagnosticKind::WshEol, line.location.clone()));
        }

        if self.in_block {
            let next = self.block_line(&line);
            return self.held.replace(next).map(|held| held.line);
        }

        let body = line.text.trim_start_matches(is_blank);
        let indented = !body.is_empty() && body.len() != line.text.len();

        if indented {
            if let Some(held) = self.held.as_mut().filter(|held| held.nesting.is_open()) {
                let split = split(body, held.nesting);
                check_padding(&self.diagnostics, &split, &line);
                held.line.data.push_str(split.data.trim_end_matches(is_blank));
                if let Some(comment) = split.comment {
                    push_comment(&mut held.line.comment, &comment);
                }
                held.nesting = split.nesting;
                self.in_block = split.opens_block;
                return None;
            }
            self.diagnostics
                .emit(Diagnostic::new(DiagnosticKind::WshBol, line.location.clone()));
        }

        let next = self.scan(body, Nesting::default(), &line);
        self.held.replace(next).map(|held| held.line)
    }

    fn flush(&mut self) -> Option<LogicalLine> {
        self.held.take().map(|held| held.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::location::SourceLocation;
    use crate::pipeline::mapper::LineStreamExt;
    use crate::pipeline::mappers::LineEnding;

    fn run(text: &str) -> (Vec<(String, Option<String>, usize)>, Vec<DiagnosticKind>) {
        let sink = Diagnostics::new();
        let lines: Vec<TextLine> = text
            .split('\n')
            .enumerate()
            .map(|(i, t)| TextLine {
                text: t.to_string(),
                ending: LineEnding::Lf,
                location: SourceLocation::new("a.conf", i + 1, Vec::new(), false).shared(),
            })
            .collect();
        let result = lines
            .into_iter()
            .map_lines(CommentSplitter::new(sink.clone()))
            .map(|l| (l.data, l.comment, l.location.line))
            .collect();
        (result, sink.kinds())
    }

    fn data(text: &str) -> Vec<String> {
        run(text).0.into_iter().map(|(d, _, _)| d).collect()
    }

    #[test]
    fn test_plain_comment() {
        let (lines, kinds) = run("foo=bar; note");
        assert_eq!(lines, vec![("foo=bar".into(), Some(" note".into()), 1)]);
        assert!(kinds.is_empty());
    }

    #[test]
    fn test_whitespace_before_comment() {
        let (lines, kinds) = run("foo=bar   ; note
baz=1	;x
; only
  ; indented");
        assert_eq!(lines[0].0, "foo=bar");
        assert_eq!(lines[1].0, "baz=1");
        assert_eq!(
            kinds,
            vec![DiagnosticKind::WshEol, DiagnosticKind::WshEol, DiagnosticKind::WshBol]
        );
    }

    #[test]
    fn test_whitespace_before_comment_and_at_end_warns_once() {
        let (_, kinds) = run("foo=bar ; note ");
        assert_eq!(kinds, vec![DiagnosticKind::WshEol]);
    }

    #[test]
    fn test_whitespace_inside_quotes_before_semicolon_is_data() {
        let (lines, kinds) = run(r#"x=Set(A="a ;b")"#);
        assert_eq!(lines[0].0, r#"x=Set(A="a ;b")"#);
        assert!(kinds.is_empty());
    }

    #[test]
    fn test_semicolon_inside_nesting_is_data() {
        assert_eq!(
            data(r#"exten => s,1,Set(A=";");x"#),
            vec![r#"exten => s,1,Set(A=";")"#]
        );
        assert_eq!(data("exten => s,1,Set(A=a;b)"), vec!["exten => s,1,Set(A=a;b)"]);
        assert_eq!(data("x=$[1;2]"), vec!["x=$[1;2]"]);
    }

    #[test]
    fn test_escaped_semicolon_is_data() {
        assert_eq!(data(r"x=a\;b;c"), vec![r"x=a\;b"]);
        assert_eq!(data(r#"x=a\";b"#), vec![r#"x=a\""#]);
    }

    #[test]
    fn test_trailing_whitespace() {
        let (lines, kinds) = run("foo=bar  ");
        assert_eq!(lines[0].0, "foo=bar");
        assert_eq!(kinds, vec![DiagnosticKind::WshEol]);
    }

    #[test]
    fn test_leading_whitespace_is_stripped() {
        let (lines, kinds) = run("[ctx]\n  foo=bar");
        assert_eq!(lines[1].0, "foo=bar");
        assert_eq!(kinds, vec![DiagnosticKind::WshBol]);
    }

    #[test]
    fn test_continuation_after_open_nesting() {
        let (lines, kinds) = run("exten => s,1,Set(A=1,\n    B=2); second\nx=y");
        assert_eq!(
            lines,
            vec![
                ("exten => s,1,Set(A=1,B=2)".into(), Some(" second".into()), 1),
                ("x=y".into(), None, 3),
            ]
        );
        assert!(kinds.is_empty());
    }

    #[test]
    fn test_block_comment_across_lines() {
        let (lines, _) = run("a=1 ;-- start\nmiddle\nend --; b\nc=2");
        assert_eq!(
            lines,
            vec![
                ("a=1".into(), Some("-- start".into()), 1),
                ("".into(), Some("middle".into()), 2),
                ("b".into(), Some("end --".into()), 3),
                ("c=2".into(), None, 4),
            ]
        );
    }

    #[test]
    fn test_inline_block_comment() {
        let (lines, _) = run("a=1;-- x --;2");
        assert_eq!(lines, vec![("a=12".into(), Some("-- x --".into()), 1)]);
    }

    #[test]
    fn test_whitespace_only_line() {
        let (lines, kinds) = run(" \t");
        assert_eq!(lines, vec![("".into(), None, 1)]);
        assert_eq!(kinds, vec![DiagnosticKind::WshEol]);
    }
}
