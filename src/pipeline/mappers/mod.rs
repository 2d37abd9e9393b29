//! [`LineMapper`](super::mapper::LineMapper) stages of the line-reader chain
//!
//! In chain order:
//! - [`EncodingDecoder`]: raw bytes to text
//! - [`LineEndingChecker`]: DOS/Unix consistency
//! - [`ControlCharChecker`]: stray control characters
//! - [`CommentSplitter`]: data/comment split and continuation folding

pub mod comments;
pub mod control_chars;
pub mod encoding;
pub mod line_ending;

pub use comments::CommentSplitter;
pub use control_chars::ControlCharChecker;
pub use encoding::EncodingDecoder;
pub use line_ending::LineEndingChecker;

use crate::ast::location::Loc;

/// Terminator found at the end of a physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    CrLf,
    Lf,
    None,
}

/// A decoded physical line without its terminator.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub ending: LineEnding,
    pub location: Loc,
}

/// A logical line split into data and comment.
///
/// Continuation lines are already folded in; `location` is the first physical line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    pub data: String,
    /// Comment text after the `;`, `None` when the line had no comment.
    pub comment: Option<String>,
    pub location: Loc,
}

impl LogicalLine {
    pub fn has_comment(&self) -> bool {
        self.comment.is_some()
    }
}
