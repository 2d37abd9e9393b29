//! Line grammar
//!
//! Classifies each [`LogicalLine`] into an [`Element`] using an ordered rule table. The
//! first rule that matches wins, so the arrow form is tried before the equals form:
//! 1. context: `[name]` or `[name](templates)`
//! 2. arrow varset: `key => value`
//! 3. equals varset: `key = value`
//! 4. empty: no data (possibly a comment)
//!
//! A line matching none of them is a preprocessor directive when it starts with `#`, and
//! `E_CONF_UNPARSEABLE` otherwise.
//!
//! # Includes
//!
//! `#include` and `#tryinclude` build a nested parser over the referenced file (resolved
//! relative to the including file) and hand out its elements before continuing with the
//! next line of the current file. There is no guard against a file including itself.

use crate::ast::elements::{Context, Element, EmptyLine, Separator, Varset};
use crate::ast::location::Loc;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::pipeline::source::{ByteLineSource, SourceError, SourceOpener};
use crate::pipeline::{logical_lines, LogicalLine, LogicalLines};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Context,
    Arrow,
    Equals,
    Empty,
}

/// Grammar rules in match order.
const GRAMMAR_RULES: &[(Rule, &str)] = &[
    (
        Rule::Context,
        r"^\[(?P<name>[^\]]+)\](?:\((?P<templates>[^)]*)\))?$",
    ),
    (
        Rule::Arrow,
        r"^(?P<key>[^=#\s][^=]*?)(?P<lws>\s*)=>(?P<rws>\s*)(?P<value>.*)$",
    ),
    (
        Rule::Equals,
        r"^(?P<key>[^=#\s][^=]*?)(?P<lws>\s*)=(?P<rws>\s*)(?P<value>.*)$",
    ),
    (Rule::Empty, r"^$"),
];

static GRAMMAR: Lazy<Vec<(Rule, Regex)>> = Lazy::new(|| {
    GRAMMAR_RULES
        .iter()
        .map(|(rule, pattern)| (*rule, Regex::new(pattern).unwrap()))
        .collect()
});

static DIRECTIVE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?P<directive>\w+)\s*(?P<arg>.*)$").unwrap());

/// Element stream of one file, with includes spliced in.
pub struct GrammarParser {
    lines: LogicalLines,
    include: Option<Box<GrammarParser>>,
    opener: Rc<dyn SourceOpener>,
    diagnostics: Diagnostics,
}

impl GrammarParser {
    pub fn new(
        lines: LogicalLines,
        opener: Rc<dyn SourceOpener>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            lines,
            include: None,
            opener,
            diagnostics,
        }
    }

    /// Open `path` through `opener` and parse it.
    pub fn open(
        path: &Path,
        opener: Rc<dyn SourceOpener>,
        diagnostics: Diagnostics,
    ) -> Result<Self, SourceError> {
        let source = ByteLineSource::open(opener.as_ref(), path)?;
        let lines = logical_lines(source, &diagnostics);
        Ok(Self::new(lines, opener, diagnostics))
    }

    fn classify(&mut self, line: LogicalLine) -> Option<Element> {
        let matched = GRAMMAR
            .iter()
            .find_map(|(rule, regex)| regex.captures(&line.data).map(|caps| (*rule, caps)));

        match matched {
            Some((Rule::Context, caps)) => Some(Element::Context(context(&caps, &line))),
            Some((Rule::Arrow, caps)) => {
                Some(Element::Varset(self.varset(&caps, &line, Separator::Arrow)))
            }
            Some((Rule::Equals, caps)) => {
                Some(Element::Varset(self.varset(&caps, &line, Separator::Equals)))
            }
            Some((Rule::Empty, _)) => Some(Element::Empty(EmptyLine {
                had_comment: line.has_comment(),
                location: line.location,
            })),
            None if line.data.starts_with('#') => {
                self.directive(&line);
                None
            }
            None => {
                self.diagnostics.emit(
                    Diagnostic::new(DiagnosticKind::ConfUnparseable, line.location.clone())
                        .with_arg("data", &line.data),
                );
                None
            }
        }
    }

    fn varset(&self, caps: &Captures<'_>, line: &LogicalLine, separator: Separator) -> Varset {
        let key = caps["key"].to_string();
        let (lws, rws, value) = (&caps["lws"], &caps["rws"], &caps["value"]);

        let conventional = match separator {
            Separator::Arrow => lws == " " && (rws == " " || value.is_empty()),
            Separator::Equals => lws.is_empty() && rws.is_empty(),
        };
        if !conventional {
            let kind = match separator {
                Separator::Arrow => DiagnosticKind::WshObjset,
                Separator::Equals => DiagnosticKind::WshVarset,
            };
            self.diagnostics
                .emit(Diagnostic::new(kind, line.location.clone()).with_arg("key", &key));
        }

        Varset {
            key,
            value: value.to_string(),
            separator,
            had_comment: line.has_comment(),
            location: line.location.clone(),
        }
    }

    fn directive(&mut self, line: &LogicalLine) {
        let Some(caps) = DIRECTIVE_REGEX.captures(&line.data) else {
            self.diagnostics.emit(
                Diagnostic::new(DiagnosticKind::ConfUnparseable, line.location.clone())
                    .with_arg("data", &line.data),
            );
            return;
        };
        let directive = &caps["directive"];
        let arg = unquote(caps["arg"].trim());

        match directive {
            "include" | "tryinclude" | "exec" if arg.is_empty() => {
                self.diagnostics.emit(
                    Diagnostic::new(DiagnosticKind::PpArgMissing, line.location.clone())
                        .with_arg("directive", directive),
                );
            }
            "include" => self.include(&line.location, arg, true),
            "tryinclude" => self.include(&line.location, arg, false),
            "exec" => {
                self.diagnostics.emit(
                    Diagnostic::new(DiagnosticKind::PpExec, line.location.clone())
                        .with_arg("command", arg),
                );
            }
            other => {
                self.diagnostics.emit(
                    Diagnostic::new(DiagnosticKind::PpUnknown, line.location.clone())
                        .with_arg("directive", other),
                );
            }
        }
    }

    fn include(&mut self, location: &Loc, arg: &str, required: bool) {
        let path = resolve(location, arg);
        match GrammarParser::open(&path, Rc::clone(&self.opener), self.diagnostics.clone()) {
            Ok(parser) => {
                tracing::debug!(from = %location, path = %path.display(), "splicing include");
                self.include = Some(Box::new(parser));
            }
            Err(err) => {
                tracing::debug!(from = %location, error = %err, "include not opened");
                if required {
                    self.diagnostics.emit(
                        Diagnostic::new(DiagnosticKind::PpIncludeMissing, location.clone())
                            .with_arg("path", path.display()),
                    );
                }
            }
        }
    }
}

impl Iterator for GrammarParser {
    type Item = Element;

    fn next(&mut self) -> Option<Element> {
        loop {
            if let Some(include) = self.include.as_mut() {
                if let Some(element) = include.next() {
                    return Some(element);
                }
                self.include = None;
            }
            let line = self.lines.next()?;
            if let Some(element) = self.classify(line) {
                return Some(element);
            }
        }
    }
}

fn context(caps: &Captures<'_>, line: &LogicalLine) -> Context {
    let mut context = Context::new(caps["name"].trim(), line.location.clone());
    if let Some(templates) = caps.name("templates") {
        context.templates = templates
            .as_str()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
    }
    context
}

/// Strip one pair of surrounding `"..."` or `<...>`.
fn unquote(arg: &str) -> &str {
    arg.strip_prefix('"')
        .and_then(|a| a.strip_suffix('"'))
        .or_else(|| arg.strip_prefix('<').and_then(|a| a.strip_suffix('>')))
        .unwrap_or(arg)
}

fn resolve(location: &Loc, arg: &str) -> PathBuf {
    let path = Path::new(arg);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        location.directory().join(path)
    }
}
