//! Source locations
//!
//! Every physical line read from a file gets exactly one [`SourceLocation`]. Downstream
//! stages, parsed elements and diagnostics share it through an [`Arc`] ([`Loc`]) instead of
//! copying it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared handle to a [`SourceLocation`].
pub type Loc = Arc<SourceLocation>;

/// Position of a single physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub filename: PathBuf,
    /// 1-based line number.
    pub line: usize,
    /// The line exactly as read, including its terminator.
    pub raw: Vec<u8>,
    pub is_last_line: bool,
}

impl SourceLocation {
    pub fn new(
        filename: impl Into<PathBuf>,
        line: usize,
        raw: Vec<u8>,
        is_last_line: bool,
    ) -> Self {
        Self {
            filename: filename.into(),
            line,
            raw,
            is_last_line,
        }
    }

    /// A location that does not correspond to a file, for text handed to the engines
    /// directly (e.g. an application argument under test).
    pub fn synthetic(label: &str) -> Loc {
        Arc::new(Self::new(label, 1, label.as_bytes().to_vec(), true))
    }

    pub fn shared(self) -> Loc {
        Arc::new(self)
    }

    /// Directory that relative `#include` paths are resolved against.
    pub fn directory(&self) -> &Path {
        self.filename.parent().unwrap_or_else(|| Path::new(""))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename.display(), self.line)
    }
}
