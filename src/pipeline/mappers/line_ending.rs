//! Line ending checker
//!
//! # Logic
//!
//! The first line of a file decides its style: CRLF (or no terminator at all) makes it a
//! DOS file, LF makes it a Unix file. Every later line is compared against that:
//! - LF in a DOS file: `W_FILE_DOS_BARELF`
//! - CRLF in a Unix file: `W_FILE_UNIX_CRLF`
//! - no terminator in a Unix file: `W_FILE_UNIX_NOLF`
//!
//! A DOS file may end without a final CRLF. Lines pass through unchanged.

use super::{LineEnding, TextLine};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::pipeline::mapper::LineMapper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Dos,
    Unix,
}

pub struct LineEndingChecker {
    diagnostics: Diagnostics,
    style: Option<Style>,
}

impl LineEndingChecker {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            style: None,
        }
    }
}

impl LineMapper for LineEndingChecker {
    type Input = TextLine;
    type Output = TextLine;

    fn map(&mut self, line: TextLine) -> Option<TextLine> {
        let Some(style) = self.style else {
            self.style = Some(match line.ending {
                LineEnding::Lf => Style::Unix,
                LineEnding::CrLf | LineEnding::None => Style::Dos,
            });
            return Some(line);
        };

        let kind = match (style, line.ending) {
            (Style::Dos, LineEnding::Lf) => Some(DiagnosticKind::FileDosBareLf),
            (Style::Unix, LineEnding::CrLf) => Some(DiagnosticKind::FileUnixCrlf),
            (Style::Unix, LineEnding::None) => Some(DiagnosticKind::FileUnixNoLf),
            _ => None,
        };
        if let Some(kind) = kind {
            self.diagnostics
                .emit(Diagnostic::new(kind, line.location.clone()));
        }
        Some(line)
    }
}
