//! Grammar elements produced by the line classifier
//!
//! A configuration file reduces to three element kinds: context headers, key/value
//! assignments, and empty (possibly comment-only) lines. Preprocessor directives never
//! surface as elements; they are resolved inside the grammar stage.

use super::location::Loc;

/// One classified logical line.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Context(Context),
    Varset(Varset),
    Empty(EmptyLine),
}

impl Element {
    pub fn location(&self) -> &Loc {
        match self {
            Element::Context(context) => &context.location,
            Element::Varset(varset) => &varset.location,
            Element::Empty(empty) => &empty.location,
        }
    }
}

/// A line without data. `had_comment` distinguishes comment-only lines from blank ones.
#[derive(Debug, Clone, PartialEq)]
pub struct EmptyLine {
    pub had_comment: bool,
    pub location: Loc,
}

/// A `[name]` or `[name](templates)` section with the assignments that follow it.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub name: String,
    pub templates: Vec<String>,
    pub had_leading_comment: bool,
    pub location: Loc,
    pub varsets: Vec<Varset>,
}

impl Context {
    pub fn new(name: impl Into<String>, location: Loc) -> Self {
        Self {
            name: name.into(),
            templates: Vec::new(),
            had_leading_comment: false,
            location,
            varsets: Vec::new(),
        }
    }

    /// First assignment with the given key.
    pub fn get(&self, key: &str) -> Option<&Varset> {
        self.varsets.iter().find(|varset| varset.key == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `key => value`
    Arrow,
    /// `key = value`
    Equals,
}

impl Separator {
    pub fn as_str(self) -> &'static str {
        match self {
            Separator::Arrow => "=>",
            Separator::Equals => "=",
        }
    }
}

/// A single `key = value` or `key => value` line.
#[derive(Debug, Clone, PartialEq)]
pub struct Varset {
    pub key: String,
    pub value: String,
    pub separator: Separator,
    pub had_comment: bool,
    pub location: Loc,
}

impl Varset {
    pub fn is_arrow(&self) -> bool {
        self.separator == Separator::Arrow
    }
}
