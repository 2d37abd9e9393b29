//! Encoding decoder
//!
//! Turns [`RawLine`]s into [`TextLine`]s.
//!
//! # Logic
//!
//! - The terminator (`\r\n`, `\n` or nothing) is split off and recorded.
//! - The remaining bytes are decoded as UTF-8.
//! - On failure `E_ENC_NOT_UTF8` is reported with the byte offset of the first invalid
//!   sequence and the line is decoded as ISO-8859-1 instead, which cannot fail.

use super::{LineEnding, TextLine};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::pipeline::mapper::LineMapper;
use crate::pipeline::source::RawLine;

pub struct EncodingDecoder {
    diagnostics: Diagnostics,
}

impl EncodingDecoder {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }
}

/// Split a raw line into content and terminator.
pub fn split_ending(bytes: &[u8]) -> (&[u8], LineEnding) {
    if let Some(content) = bytes.strip_suffix(b"\r\n") {
        (content, LineEnding::CrLf)
    } else if let Some(content) = bytes.strip_suffix(b"\n") {
        (content, LineEnding::Lf)
    } else {
        (bytes, LineEnding::None)
    }
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

impl LineMapper for EncodingDecoder {
    type Input = RawLine;
    type Output = TextLine;

    fn map(&mut self, line: RawLine) -> Option<TextLine> {
        let (content, ending) = split_ending(line.bytes());
        let text = match std::str::from_utf8(content) {
            Ok(text) => text.to_string(),
            Err(err) => {
                self.diagnostics.emit(
                    Diagnostic::new(DiagnosticKind::EncNotUtf8, line.location.clone())
                        .with_arg("offset", err.valid_up_to()),
                );
                decode_latin1(content)
            }
        };
        Some(TextLine {
            text,
            ending,
            location: line.location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::location::SourceLocation;

    fn raw(bytes: &[u8]) -> RawLine {
        RawLine {
            location: SourceLocation::new("a.conf", 1, bytes.to_vec(), false).shared(),
        }
    }

    #[test]
    fn test_utf8_line() {
        let sink = Diagnostics::new();
        let line = EncodingDecoder::new(sink.clone())
            .map(raw("caf\u{e9} => x\r\n".as_bytes()))
            .unwrap();
        assert_eq!(line.text, "caf\u{e9} => x");
        assert_eq!(line.ending, LineEnding::CrLf);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_latin1_fallback() {
        let sink = Diagnostics::new();
        let line = EncodingDecoder::new(sink.clone())
            .map(raw(b"caf\xe9\n"))
            .unwrap();
        assert_eq!(line.text, "caf\u{e9}");
        assert_eq!(sink.kinds(), vec![DiagnosticKind::EncNotUtf8]);
        assert_eq!(sink.events()[0].arg("offset"), Some("3"));
    }

    #[test]
    fn test_split_ending() {
        assert_eq!(split_ending(b"a\r\n"), (&b"a"[..], LineEnding::CrLf));
        assert_eq!(split_ending(b"a\n"), (&b"a"[..], LineEnding::Lf));
        assert_eq!(split_ending(b"a"), (&b"a"[..], LineEnding::None));
        assert_eq!(split_ending(b"a\r"), (&b"a\r"[..], LineEnding::None));
    }
}
