//! The line-reader chain
//!
//! ```text
//! ByteLineSource -> EncodingDecoder -> LineEndingChecker -> ControlCharChecker -> CommentSplitter
//!    RawLine          TextLine            TextLine              TextLine            LogicalLine
//! ```
//!
//! Each arrow is a [`mapper::MapStream`]; the chain is lazy and single-pass. Building a
//! new chain resets all per-file state (line ending style, nesting, block comments).

pub mod mapper;
pub mod mappers;
pub mod source;

pub use mapper::{LineMapper, LineStreamExt, MapStream};
pub use mappers::{LineEnding, LogicalLine, TextLine};
pub use source::{ByteLineSource, FsOpener, MemoryOpener, RawLine, SourceError, SourceOpener};

use crate::diagnostics::Diagnostics;
use mappers::{CommentSplitter, ControlCharChecker, EncodingDecoder, LineEndingChecker};

/// Boxed stream of logical lines for one file.
pub type LogicalLines = Box<dyn Iterator<Item = LogicalLine>>;

/// Wire the line-reader stages on top of `source`.
pub fn logical_lines(source: ByteLineSource, diagnostics: &Diagnostics) -> LogicalLines {
    Box::new(
        source
            .map_lines(EncodingDecoder::new(diagnostics.clone()))
            .map_lines(LineEndingChecker::new(diagnostics.clone()))
            .map_lines(ControlCharChecker::new(diagnostics.clone()))
            .map_lines(CommentSplitter::new(diagnostics.clone())),
    )
}
