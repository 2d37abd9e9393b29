//! Vertical whitespace checker
//!
//! Passes elements through unchanged except for setting
//! [`Context::had_leading_comment`](crate::ast::Context). State is kept per file, so the
//! elements of a spliced include do not disturb the state of the including file.
//!
//! # Logic
//!
//! - Blank lines before the first element of a file: `W_WSH_BOF` (once).
//! - A second consecutive blank line: `W_WSH_VSPLIT_EXCESS` (once per run).
//! - A blank line that is the last line of its file: `W_WSH_EOF`.
//! - A context following other content without a blank line before it (or before the
//!   comment block directly above it): `W_WSH_VSPLIT_MISSING`.

use crate::ast::elements::Element;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::pipeline::mapper::LineMapper;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Default)]
struct FileState {
    seen_element: bool,
    seen_content: bool,
    blank_run: usize,
    in_comment_block: bool,
    blank_before_block: bool,
}

pub struct VerticalSpacingChecker {
    diagnostics: Diagnostics,
    files: HashMap<PathBuf, FileState>,
}

impl VerticalSpacingChecker {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            files: HashMap::new(),
        }
    }
}

impl LineMapper for VerticalSpacingChecker {
    type Input = Element;
    type Output = Element;

    fn map(&mut self, mut element: Element) -> Option<Element> {
        let location = element.location().clone();
        let state = self.files.entry(location.filename.clone()).or_default();
        let report = |kind| Diagnostic::new(kind, location.clone());

        match &mut element {
            Element::Empty(empty) if !empty.had_comment => {
                if !state.seen_element {
                    if state.blank_run == 0 {
                        self.diagnostics.emit(report(DiagnosticKind::WshBof));
                    }
                } else if state.blank_run == 1 {
                    self.diagnostics.emit(report(DiagnosticKind::WshVsplitExcess));
                }
                if location.is_last_line {
                    self.diagnostics.emit(report(DiagnosticKind::WshEof));
                }
                state.blank_run += 1;
                state.in_comment_block = false;
            }
            Element::Empty(_) => {
                if !state.in_comment_block {
                    state.blank_before_block = state.blank_run > 0 || !state.seen_content;
                    state.in_comment_block = true;
                }
                state.seen_element = true;
                state.blank_run = 0;
            }
            Element::Context(context) => {
                let separated = if state.in_comment_block {
                    state.blank_before_block
                } else {
                    state.blank_run > 0
                };
                if state.seen_content && !separated {
                    self.diagnostics.emit(
                        report(DiagnosticKind::WshVsplitMissing).with_arg("context", &context.name),
                    );
                }
                context.had_leading_comment = state.in_comment_block;
                state.seen_content = true;
                state.seen_element = true;
                state.blank_run = 0;
                state.in_comment_block = false;
            }
            Element::Varset(_) => {
                state.seen_content = true;
                state.seen_element = true;
                state.blank_run = 0;
                state.in_comment_block = false;
            }
        }
        Some(element)
    }
}
