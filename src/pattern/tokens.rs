//! Pattern tokens and their total order
//!
//! Every pattern reduces to a sequence of [`PatternToken`]s. The derived order of the
//! enum gives:
//!
//! - character classes first, ordered by size and then by members, so a single-character
//!   class (a literal) sorts below every real class and `N` < `Z` < `X`;
//! - then `.` (one or more of anything), then `!` (zero or more of anything);
//! - the invalid token last.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// A non-empty, sorted, duplicate-free set of characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharClass {
    members: Vec<char>,
}

impl CharClass {
    pub fn literal(c: char) -> Self {
        Self { members: vec![c] }
    }

    /// Inclusive range; reversed bounds are swapped.
    pub fn range(a: char, b: char) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self {
            members: (lo..=hi).collect(),
        }
    }

    /// Returns `None` for an empty set.
    pub fn from_chars(chars: impl IntoIterator<Item = char>) -> Option<Self> {
        let mut members: Vec<char> = chars.into_iter().collect();
        members.sort_unstable();
        members.dedup();
        if members.is_empty() {
            None
        } else {
            Some(Self { members })
        }
    }

    /// `X`: 0-9
    pub fn digits() -> Self {
        Self::range('0', '9')
    }

    /// `Z`: 1-9
    pub fn nonzero() -> Self {
        Self::range('1', '9')
    }

    /// `N`: 2-9
    pub fn two_to_nine() -> Self {
        Self::range('2', '9')
    }

    pub fn members(&self) -> &[char] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_literal(&self) -> bool {
        self.members.len() == 1
    }

    pub fn start(&self) -> char {
        self.members[0]
    }
}

impl Ord for CharClass {
    fn cmp(&self, other: &Self) -> Ordering {
        self.members
            .len()
            .cmp(&other.members.len())
            .then_with(|| self.members.cmp(&other.members))
    }
}

impl PartialOrd for CharClass {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternToken {
    Chars(CharClass),
    /// `.`
    OneOrMore,
    /// `!`
    ZeroOrMore,
    /// Unterminated or empty `[...]` set, or a bare `_`.
    Invalid,
}

impl PatternToken {
    pub fn literal(c: char) -> Self {
        PatternToken::Chars(CharClass::literal(c))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, PatternToken::Chars(class) if class.is_literal())
    }
}

/// Split a raw extension string into tokens.
///
/// Strings starting with `_` are patterns; anything else is taken literally. Dashes are
/// dropped everywhere except inside `[...]`.
pub fn tokenize(raw: &str) -> Vec<PatternToken> {
    let Some(body) = raw.strip_prefix('_') else {
        return raw
            .chars()
            .filter(|&c| c != '-')
            .map(PatternToken::literal)
            .collect();
    };

    let mut tokens = Vec::new();
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        let token = match c {
            '-' => continue,
            'X' | 'x' => PatternToken::Chars(CharClass::digits()),
            'Z' | 'z' => PatternToken::Chars(CharClass::nonzero()),
            'N' | 'n' => PatternToken::Chars(CharClass::two_to_nine()),
            '.' => PatternToken::OneOrMore,
            '!' => PatternToken::ZeroOrMore,
            '[' => match parse_set(&mut chars) {
                Some(class) => PatternToken::Chars(class),
                None => {
                    tokens.push(PatternToken::Invalid);
                    break;
                }
            },
            other => PatternToken::literal(other),
        };
        tokens.push(token);
    }

    if tokens.is_empty() {
        tokens.push(PatternToken::Invalid);
    }
    tokens
}

/// Parse the inside of a `[...]` set; the opening bracket is already consumed.
fn parse_set(chars: &mut Peekable<Chars<'_>>) -> Option<CharClass> {
    let mut items = Vec::new();
    loop {
        match chars.next()? {
            ']' => break,
            c => items.push(c),
        }
    }

    let mut members = Vec::new();
    let mut i = 0;
    while i < items.len() {
        if i + 2 < items.len() && items[i + 1] == '-' {
            members.extend(CharClass::range(items[i], items[i + 2]).members);
            i += 3;
        } else {
            members.push(items[i]);
            i += 1;
        }
    }
    CharClass::from_chars(members)
}
