//! Variable substitution trees
//!
//! Argument data such as `Set(x=${CALLERID(num):0:3}-$[${a}+1])` is parsed into a small
//! tree of [`Var`] nodes. Leaves carry text or a name; [`Var::Join`] only carries children.
//!
//! The tree can be turned back into its source text with `Display`, or resolved against a
//! name-to-value map with [`Var::format`]. Expressions and functions are never evaluated;
//! they are re-serialized with their contents resolved.

mod parser;
mod usage;

pub use parser::{find_closing, VarParser};
pub use usage::VariableUsage;

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VarParseError {
    #[error("unterminated {open}...{close} starting at offset {position}")]
    Unterminated {
        open: char,
        close: char,
        position: usize,
    },
    #[error("unbalanced parentheses in function call {function}")]
    UnbalancedParens { function: String },
}

/// One bound of a slice: a number written out, or a substitution resolved at format time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceBound<T> {
    Fixed(T),
    Dynamic(Box<Var>),
}

impl<T: Copy + std::str::FromStr> SliceBound<T> {
    /// The numeric value, resolving a dynamic bound against `values`. `None` when the
    /// resolved text is not a number.
    pub fn resolve(&self, values: &HashMap<String, String>) -> Option<T> {
        match self {
            SliceBound::Fixed(value) => Some(*value),
            SliceBound::Dynamic(var) => var.format(values).trim().parse().ok(),
        }
    }
}

impl<T: fmt::Display> fmt::Display for SliceBound<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SliceBound::Fixed(value) => write!(f, "{}", value),
            SliceBound::Dynamic(var) => write!(f, "{}", var),
        }
    }
}

/// `:start[:length]` suffix of a variable or function result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceSpec {
    pub start: SliceBound<i64>,
    pub length: Option<SliceBound<u64>>,
}

impl SliceSpec {
    pub fn fixed(start: i64, length: Option<u64>) -> Self {
        Self {
            start: SliceBound::Fixed(start),
            length: length.map(SliceBound::Fixed),
        }
    }

    /// Apply to `value`. A negative start counts from the end.
    ///
    /// Dynamic bounds are resolved against `values`; a start that does not resolve to a
    /// number counts as 0 and such a length as no length.
    pub fn apply(&self, value: &str, values: &HashMap<String, String>) -> String {
        let chars: Vec<char> = value.chars().collect();
        let len = chars.len() as i64;
        let start = self.start.resolve(values).unwrap_or(0);
        let start = if start < 0 {
            (len + start).max(0)
        } else {
            start.min(len)
        };
        let start = start as usize;
        let end = match self.length.as_ref().and_then(|length| length.resolve(values)) {
            Some(length) => start.saturating_add(length as usize).min(chars.len()),
            None => chars.len(),
        };
        chars[start..end].iter().collect()
    }
}

impl fmt::Display for SliceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.start)?;
        if let Some(length) = &self.length {
            write!(f, ":{}", length)?;
        }
        Ok(())
    }
}

/// `${name:start[:length]}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarSlice {
    pub name: Box<Var>,
    pub spec: SliceSpec,
}

/// `${NAME(args)}` with an optional slice of the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarFunc {
    pub name: String,
    pub args: Box<Var>,
    pub slice: Option<SliceSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Var {
    Literal(String),
    Join(Vec<Var>),
    /// `${name}`; the name may itself contain substitutions.
    Ref(Box<Var>),
    Slice(VarSlice),
    /// `$[...]`
    Expr(Box<Var>),
    Func(VarFunc),
}

impl Var {
    pub fn literal(text: impl Into<String>) -> Self {
        Var::Literal(text.into())
    }

    /// Join `parts`, collapsing the trivial cases.
    pub fn join(mut parts: Vec<Var>) -> Self {
        match parts.len() {
            0 => Var::Literal(String::new()),
            1 => parts.remove(0),
            _ => Var::Join(parts),
        }
    }

    /// True when the text contains no substitution at all.
    pub fn is_literal(&self) -> bool {
        matches!(self, Var::Literal(_))
    }

    /// Resolve references against `values`. Unknown names resolve to the empty string.
    pub fn format(&self, values: &HashMap<String, String>) -> String {
        match self {
            Var::Literal(text) => text.clone(),
            Var::Join(parts) => parts.iter().map(|p| p.format(values)).collect(),
            Var::Ref(name) => lookup(values, &name.format(values)).to_string(),
            Var::Slice(slice) => slice
                .spec
                .apply(lookup(values, &slice.name.format(values)), values),
            Var::Expr(inner) => format!("$[{}]", inner.format(values)),
            Var::Func(func) => {
                let mut out = format!("${{{}({})", func.name, func.args.format(values));
                if let Some(spec) = &func.slice {
                    out.push_str(&spec.to_string());
                }
                out.push('}');
                out
            }
        }
    }
}

fn lookup<'a>(values: &'a HashMap<String, String>, name: &str) -> &'a str {
    values.get(name).map(String::as_str).unwrap_or("")
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Var::Literal(text) => f.write_str(text),
            Var::Join(parts) => parts.iter().try_for_each(|p| write!(f, "{}", p)),
            Var::Ref(name) => write!(f, "${{{}}}", name),
            Var::Slice(slice) => write!(f, "${{{}{}}}", slice.name, slice.spec),
            Var::Expr(inner) => write!(f, "$[{}]", inner),
            Var::Func(func) => {
                write!(f, "${{{}({})", func.name, func.args)?;
                if let Some(spec) = &func.slice {
                    write!(f, "{}", spec)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, None, "abcdef")]
    #[case(2, None, "cdef")]
    #[case(2, Some(3), "cde")]
    #[case(-2, None, "ef")]
    #[case(-4, Some(2), "cd")]
    #[case(10, None, "")]
    #[case(-10, Some(2), "ab")]
    fn test_slice_apply(#[case] start: i64, #[case] length: Option<u64>, #[case] expected: &str) {
        let spec = SliceSpec::fixed(start, length);
        assert_eq!(spec.apply("abcdef", &HashMap::new()), expected);
    }

    #[test]
    fn test_dynamic_bounds_resolve_at_format_time() {
        let spec = SliceSpec {
            start: SliceBound::Dynamic(Box::new(Var::Ref(Box::new(Var::literal("OFFSET"))))),
            length: Some(SliceBound::Fixed(2)),
        };
        let values = HashMap::from([("OFFSET".to_string(), "1".to_string())]);
        assert_eq!(spec.apply("abcdef", &values), "bc");
        assert_eq!(spec.apply("abcdef", &HashMap::new()), "ab");
        assert_eq!(spec.to_string(), ":${OFFSET}:2");
    }

    #[test]
    fn test_format_resolves_references() {
        let tree = Var::join(vec![
            Var::literal("+1"),
            Var::Slice(VarSlice {
                name: Box::new(Var::literal("NUM")),
                spec: SliceSpec::fixed(1, None),
            }),
            Var::Ref(Box::new(Var::literal("MISSING"))),
        ]);
        let values = HashMap::from([("NUM".to_string(), "0612".to_string())]);
        assert_eq!(tree.format(&values), "+1612");
        assert_eq!(tree.to_string(), "+1${NUM:1}${MISSING}");
    }

    #[test]
    fn test_join_collapses() {
        assert_eq!(Var::join(vec![]), Var::literal(""));
        assert_eq!(Var::join(vec![Var::literal("a")]), Var::literal("a"));
    }
}
