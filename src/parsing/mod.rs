//! Element parsing
//!
//! [`GrammarParser`] classifies logical lines into elements and splices includes;
//! [`VerticalSpacingChecker`] checks blank-line conventions on the resulting stream.

pub mod grammar;
pub mod vertical_spacing;

pub use grammar::GrammarParser;
pub use vertical_spacing::VerticalSpacingChecker;

use crate::ast::elements::Element;
use crate::diagnostics::Diagnostics;
use crate::pipeline::mapper::{LineStreamExt, MapStream};
use crate::pipeline::source::{SourceError, SourceOpener};
use std::path::Path;
use std::rc::Rc;

/// Checked element stream of a file and its includes.
pub type Elements = MapStream<GrammarParser, VerticalSpacingChecker>;

/// Open `path` and build the element stream for it.
pub fn elements(
    path: &Path,
    opener: Rc<dyn SourceOpener>,
    diagnostics: &Diagnostics,
) -> Result<Elements, SourceError> {
    let parser = GrammarParser::open(path, opener, diagnostics.clone())?;
    Ok(parser.map_lines(VerticalSpacingChecker::new(diagnostics.clone())))
}

/// Convenience for tests and tools: all elements of `path`.
pub fn collect_elements(
    path: &Path,
    opener: Rc<dyn SourceOpener>,
    diagnostics: &Diagnostics,
) -> Result<Vec<Element>, SourceError> {
    Ok(elements(path, opener, diagnostics)?.collect())
}
