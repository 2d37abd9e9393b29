//! Byte line source and file openers
//!
//! The leaf of the line-reader chain. A [`SourceOpener`] turns a path into a buffered
//! reader; [`ByteLineSource`] splits that reader into raw lines (terminator included) and
//! attaches a [`SourceLocation`] to each of them.
//!
//! # Logic
//!
//! The source always keeps one line of lookahead so it knows, when handing out a line,
//! whether it is the last one of the file. Empty files produce no lines at all.

use crate::ast::location::{Loc, SourceLocation};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{}: file not found", .path.display())]
    NotFound { path: PathBuf },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SourceError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            SourceError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            SourceError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound { .. })
    }
}

/// Resolves a path to a readable byte stream.
pub trait SourceOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn BufRead>, SourceError>;
}

/// Reads files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOpener;

impl SourceOpener for FsOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn BufRead>, SourceError> {
        let file = File::open(path).map_err(|e| SourceError::from_io(path, e))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Serves files from memory. Paths are matched exactly as given.
#[derive(Debug, Clone, Default)]
pub struct MemoryOpener {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl AsRef<[u8]>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl AsRef<[u8]>) {
        self.files.insert(path.into(), content.as_ref().to_vec());
    }
}

impl SourceOpener for MemoryOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn BufRead>, SourceError> {
        match self.files.get(path) {
            Some(content) => Ok(Box::new(Cursor::new(content.clone()))),
            None => Err(SourceError::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// One physical line as read from the file.
#[derive(Debug, Clone)]
pub struct RawLine {
    pub location: Loc,
}

impl RawLine {
    /// The line bytes including the terminator.
    pub fn bytes(&self) -> &[u8] {
        &self.location.raw
    }
}

pub struct ByteLineSource {
    filename: PathBuf,
    reader: Box<dyn BufRead>,
    line: usize,
    lookahead: Option<Vec<u8>>,
}

impl ByteLineSource {
    pub fn new(filename: impl Into<PathBuf>, reader: Box<dyn BufRead>) -> Self {
        Self {
            filename: filename.into(),
            reader,
            line: 0,
            lookahead: None,
        }
    }

    pub fn open(opener: &dyn SourceOpener, path: &Path) -> Result<Self, SourceError> {
        let reader = opener.open(path)?;
        Ok(Self::new(path, reader))
    }

    fn read_line(&mut self) -> Option<Vec<u8>> {
        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => Some(buf),
            Err(err) => {
                tracing::warn!(
                    file = %self.filename.display(),
                    error = %err,
                    "read failed, truncating"
                );
                None
            }
        }
    }
}

impl Iterator for ByteLineSource {
    type Item = RawLine;

    fn next(&mut self) -> Option<RawLine> {
        let current = match self.lookahead.take() {
            Some(line) => line,
            None => self.read_line()?,
        };
        self.lookahead = self.read_line();
        self.line += 1;
        let location = SourceLocation::new(
            self.filename.clone(),
            self.line,
            current,
            self.lookahead.is_none(),
        );
        Some(RawLine {
            location: location.shared(),
        })
    }
}

impl std::fmt::Debug for ByteLineSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteLineSource")
            .field("filename", &self.filename)
            .field("line", &self.line)
            .finish()
    }
}
