//! Substitution scanner
//!
//! # Logic
//!
//! The input is scanned left to right for `${` and `$[`. For each one the matching closing
//! bracket is located with [`find_closing`], the inner text is classified and parsed
//! recursively, and the text between substitutions is kept as literals.
//!
//! Classification of `${inner}` only looks at characters outside nested substitutions:
//! - a `(` makes it a function call; the arguments run to the last `)`, and whatever
//!   follows must be empty or a `:start[:length]` slice;
//! - otherwise a `:` makes it a sliced variable; the bounds may be substitutions
//!   themselves and are only checked as integers when they are literal;
//! - otherwise it is a plain variable reference.
//!
//! `$[inner]` is kept as an expression; its content is parsed but never evaluated.

use super::{SliceBound, SliceSpec, Var, VarFunc, VarParseError, VarSlice, VariableUsage};
use crate::ast::location::Loc;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};

/// Find the bracket closing the one at `open_at` (`{`, `[` or `(`).
///
/// Only brackets of the same kind are counted. Returns the index of the closing bracket and
/// whether a nested `${` or `$[` was seen on the way.
pub fn find_closing(text: &str, open_at: usize) -> Result<(usize, bool), VarParseError> {
    let bytes = text.as_bytes();
    let (open, close) = match bytes.get(open_at) {
        Some(b'[') => (b'[', b']'),
        Some(b'(') => (b'(', b')'),
        _ => (b'{', b'}'),
    };

    let mut depth = 0usize;
    let mut nested = false;
    for (i, &b) in bytes.iter().enumerate().skip(open_at) {
        if b == open {
            depth += 1;
        } else if b == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Ok((i, nested));
            }
        } else if b == b'$' && matches!(bytes.get(i + 1), Some(b'{' | b'[')) {
            nested = true;
        }
    }
    Err(VarParseError::Unterminated {
        open: open as char,
        close: close as char,
        position: open_at,
    })
}

fn starts_substitution(bytes: &[u8], i: usize) -> bool {
    bytes[i] == b'$' && matches!(bytes.get(i + 1), Some(b'{' | b'['))
}

/// Indices of `target` outside nested substitutions.
fn top_level_indices(text: &str, target: u8) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if starts_substitution(bytes, i) {
            match find_closing(text, i + 1) {
                Ok((end, _)) => {
                    i = end + 1;
                    continue;
                }
                Err(_) => break,
            }
        }
        if bytes[i] == target {
            found.push(i);
        }
        i += 1;
    }
    found
}

/// Parses argument data into [`Var`] trees.
///
/// Slice problems are reported to the diagnostic sink at `location`; referenced names are
/// recorded in the usage registry.
pub struct VarParser<'a> {
    diagnostics: &'a Diagnostics,
    usage: &'a mut VariableUsage,
    location: Loc,
}

impl<'a> VarParser<'a> {
    pub fn new(
        diagnostics: &'a Diagnostics,
        usage: &'a mut VariableUsage,
        location: Loc,
    ) -> Self {
        Self {
            diagnostics,
            usage,
            location,
        }
    }

    pub fn parse(&mut self, text: &str) -> Result<Var, VarParseError> {
        let bytes = text.as_bytes();
        let mut parts = Vec::new();
        let mut literal_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            if !starts_substitution(bytes, i) {
                i += 1;
                continue;
            }
            if literal_start < i {
                parts.push(Var::literal(&text[literal_start..i]));
            }
            let (end, _) = find_closing(text, i + 1)?;
            let inner = &text[i + 2..end];
            let node = if bytes[i + 1] == b'{' {
                self.parse_braced(inner)?
            } else {
                Var::Expr(Box::new(self.parse(inner)?))
            };
            parts.push(node);
            i = end + 1;
            literal_start = i;
        }

        if literal_start < bytes.len() {
            parts.push(Var::literal(&text[literal_start..]));
        }
        Ok(Var::join(parts))
    }

    fn parse_braced(&mut self, inner: &str) -> Result<Var, VarParseError> {
        if let Some(&paren) = top_level_indices(inner, b'(').first() {
            return self.parse_function(inner, paren);
        }

        if let Some(&colon) = top_level_indices(inner, b':').first() {
            let name = self.parse(&inner[..colon])?;
            self.record(&name);
            let spec = self.slice_spec(&inner[colon + 1..], &name.to_string())?;
            return Ok(match spec {
                Some(spec) => Var::Slice(VarSlice {
                    name: Box::new(name),
                    spec,
                }),
                None => Var::Ref(Box::new(name)),
            });
        }

        let name = self.parse(inner)?;
        self.record(&name);
        Ok(Var::Ref(Box::new(name)))
    }

    fn parse_function(&mut self, inner: &str, paren: usize) -> Result<Var, VarParseError> {
        let name = &inner[..paren];
        let close = top_level_indices(inner, b')')
            .last()
            .copied()
            .filter(|&close| close > paren)
            .ok_or_else(|| VarParseError::UnbalancedParens {
                function: name.to_string(),
            })?;

        let args = self.parse(&inner[paren + 1..close])?;
        self.usage.record_function(name, &self.location);

        let tail = &inner[close + 1..];
        let slice = if tail.is_empty() {
            None
        } else if let Some(spec) = tail.strip_prefix(':') {
            self.slice_spec(spec, name)?
        } else {
            self.diagnostics.emit(
                Diagnostic::new(DiagnosticKind::FuncTailInvalid, self.location.clone())
                    .with_arg("tail", tail)
                    .with_arg("function", name),
            );
            None
        };

        Ok(Var::Func(VarFunc {
            name: name.to_string(),
            args: Box::new(args),
            slice,
        }))
    }

    /// Parse and validate `start[:length]`. `None` means the slice is dropped.
    ///
    /// Bounds may themselves be substitutions; only literal bounds are checked.
    fn slice_spec(
        &mut self,
        spec: &str,
        name: &str,
    ) -> Result<Option<SliceSpec>, VarParseError> {
        let (start_raw, length_raw) = match top_level_indices(spec, b':').first() {
            Some(&colon) => (&spec[..colon], Some(&spec[colon + 1..])),
            None => (spec, None),
        };

        let start = match self.parse(start_raw.trim())? {
            Var::Literal(text) => match text.parse::<i64>() {
                Ok(start) => SliceBound::Fixed(start),
                Err(_) => {
                    self.diagnostics.emit(
                        Diagnostic::new(DiagnosticKind::VarSubstrStart, self.location.clone())
                            .with_arg("start", start_raw)
                            .with_arg("name", name),
                    );
                    return Ok(None);
                }
            },
            dynamic => SliceBound::Dynamic(Box::new(dynamic)),
        };

        let length = match length_raw {
            Some(raw) => self.slice_length(raw, &start, name)?,
            None => None,
        };

        if start == SliceBound::Fixed(0) && length.is_none() {
            self.diagnostics.emit(
                Diagnostic::new(DiagnosticKind::VarSubstrZero, self.location.clone())
                    .with_arg("name", name),
            );
            return Ok(None);
        }
        Ok(Some(SliceSpec { start, length }))
    }

    fn slice_length(
        &mut self,
        raw: &str,
        start: &SliceBound<i64>,
        name: &str,
    ) -> Result<Option<SliceBound<u64>>, VarParseError> {
        let text = match self.parse(raw.trim())? {
            Var::Literal(text) => text,
            dynamic => return Ok(Some(SliceBound::Dynamic(Box::new(dynamic)))),
        };

        let fits = |length: u64| match start {
            SliceBound::Fixed(start) if *start < 0 => length <= start.unsigned_abs(),
            _ => true,
        };
        let length = text
            .parse::<u64>()
            .ok()
            .filter(|&length| length > 0 && fits(length));
        if length.is_none() {
            self.diagnostics.emit(
                Diagnostic::new(DiagnosticKind::VarSubstrLen, self.location.clone())
                    .with_arg("length", raw)
                    .with_arg("name", name),
            );
        }
        Ok(length.map(SliceBound::Fixed))
    }

    fn record(&mut self, name: &Var) {
        if let Var::Literal(name) = name {
            self.usage.record_variable(name, &self.location);
        }
    }
}
