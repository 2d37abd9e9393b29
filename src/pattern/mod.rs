//! Extension patterns
//!
//! A [`Pattern`] keeps the raw spelling for display but compares, hashes and orders by
//! its token sequence only. Differently spelled patterns that reduce to the same tokens
//! are interchangeable:
//!
//! ```text
//! "100" == "_100" == "1-0-0" == "_1-0-0"
//! "_X"  == "_[0-9]" == "_x"
//! ```
//!
//! The comparison key is `(is_pattern, tokens...)`, where `is_pattern` is set when any
//! token is something other than a single literal character. Literal extensions therefore
//! sort below all wildcard patterns.

mod tokens;

pub use tokens::{tokenize, CharClass, PatternToken};

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    is_pattern: bool,
    tokens: Vec<PatternToken>,
}

impl Pattern {
    pub fn parse(raw: &str) -> Self {
        let tokens = tokenize(raw);
        let is_pattern = tokens.iter().any(|token| !token.is_literal());
        Self {
            raw: raw.to_string(),
            is_pattern,
            tokens,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn tokens(&self) -> &[PatternToken] {
        &self.tokens
    }

    /// True when the pattern matches more than one fixed string.
    pub fn is_pattern(&self) -> bool {
        self.is_pattern
    }

    pub fn is_valid(&self) -> bool {
        !self.tokens.contains(&PatternToken::Invalid)
    }

    pub fn key(&self) -> (bool, &[PatternToken]) {
        (self.is_pattern, &self.tokens)
    }

    pub fn matches_same(&self, other: &Pattern) -> bool {
        self.key() == other.key()
    }

    /// The conventional spelling of this pattern's tokens.
    ///
    /// Literal extensions lose their `_` prefix and dashes, unless they contain a literal
    /// `-` or start with `_`; the digit classes are written as `X`, `Z` and `N`; other
    /// classes as sets with runs of three or more compressed to ranges. Invalid patterns
    /// are returned unchanged.
    pub fn canonical_pattern(&self) -> String {
        if !self.is_valid() {
            return self.raw.clone();
        }

        if !self.is_pattern {
            let literal: String = self
                .tokens
                .iter()
                .filter_map(|token| match token {
                    PatternToken::Chars(class) => Some(class.start()),
                    _ => None,
                })
                .collect();
            // A plain string drops dashes and a leading `_` switches to pattern syntax.
            if !literal.starts_with('_') && !literal.contains('-') {
                return literal;
            }
        }

        let mut out = String::from("_");
        for token in &self.tokens {
            match token {
                PatternToken::Chars(class) => write_class(&mut out, class),
                PatternToken::OneOrMore => out.push('.'),
                PatternToken::ZeroOrMore => out.push('!'),
                PatternToken::Invalid => {}
            }
        }
        out
    }

    pub fn is_canonical(&self) -> bool {
        self.raw == self.canonical_pattern()
    }
}

fn write_class(out: &mut String, class: &CharClass) {
    if class.is_literal() {
        let c = class.start();
        if matches!(c, 'X' | 'x' | 'Z' | 'z' | 'N' | 'n' | '.' | '!' | '[' | '-') {
            out.push('[');
            out.push(c);
            out.push(']');
        } else {
            out.push(c);
        }
        return;
    }
    if *class == CharClass::digits() {
        out.push('X');
        return;
    }
    if *class == CharClass::nonzero() {
        out.push('Z');
        return;
    }
    if *class == CharClass::two_to_nine() {
        out.push('N');
        return;
    }

    // A literal dash only survives as the first member of a set.
    let members = class.members();
    out.push('[');
    if members.contains(&'-') {
        out.push('-');
    }
    let rest: Vec<char> = members.iter().copied().filter(|&c| c != '-').collect();
    let mut i = 0;
    while i < rest.len() {
        let mut j = i;
        while j + 1 < rest.len() && (rest[j] as u32) + 1 == rest[j + 1] as u32 {
            j += 1;
        }
        if j - i >= 2 {
            out.push(rest[i]);
            out.push('-');
            out.push(rest[j]);
        } else {
            out.extend(&rest[i..=j]);
        }
        i = j + 1;
    }
    out.push(']');
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.matches_same(other)
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl Ord for Pattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Pattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
