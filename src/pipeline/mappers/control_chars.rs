//! Control character checker
//!
//! Reports `W_FILE_CTRL_CHAR` for the first character below 0x20 (other than TAB) or DEL
//! on a line. Lines pass through unchanged.

use super::TextLine;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::pipeline::mapper::LineMapper;

pub struct ControlCharChecker {
    diagnostics: Diagnostics,
}

impl ControlCharChecker {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }
}

fn is_stray_control(c: char) -> bool {
    (c < '\u{20}' && c != '\t') || c == '\u{7f}'
}

impl LineMapper for ControlCharChecker {
    type Input = TextLine;
    type Output = TextLine;

    fn map(&mut self, line: TextLine) -> Option<TextLine> {
        if let Some((column, c)) = line
            .text
            .chars()
            .enumerate()
            .find(|&(_, c)| is_stray_control(c))
        {
            self.diagnostics.emit(
                Diagnostic::new(DiagnosticKind::FileCtrlChar, line.location.clone())
                    .with_arg("char", format!("0x{:02x}", c as u32))
                    .with_arg("column", column + 1),
            );
        }
        Some(line)
    }
}
