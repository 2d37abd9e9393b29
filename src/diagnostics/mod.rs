//! Diagnostics and the sink that collects them
//!
//! Diagnostics are never raised through the pipeline's control flow. Each stage holds a
//! clone of a [`Diagnostics`] handle and reports to it; the owner of the parse run reads
//! the collected events afterwards.
//!
//! The sink keeps:
//! - every event in emission order,
//! - a multiset keyed by [`DiagnosticKind`] for assertions,
//! - a set of muted kinds (still collected, but not counted as reportable),
//! - per-kind callbacks, used by fix-up tooling to pick out specific diagnostics.
//!
//! A handle is `Rc`-based and therefore bound to one thread. Concurrent parses each use
//! their own sink.

mod kinds;

pub use kinds::DiagnosticKind;

use crate::ast::location::Loc;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// How serious a diagnostic is. None of them stops processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Structural violation; the offending element is usually dropped.
    Error,
    /// Style or consistency deviation; the element is kept.
    Warning,
    /// Optional convention suggestion.
    Hint,
}

impl Severity {
    pub fn letter(self) -> char {
        match self {
            Severity::Error => 'E',
            Severity::Warning => 'W',
            Severity::Hint => 'H',
        }
    }
}

/// A single reported problem.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub location: Loc,
    /// Earlier occurrence, for duplicate-style diagnostics.
    pub previous: Option<Loc>,
    pub args: Vec<(&'static str, String)>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, location: Loc) -> Self {
        Self {
            kind,
            location,
            previous: None,
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, name: &'static str, value: impl fmt::Display) -> Self {
        self.args.push((name, value.to_string()));
        self
    }

    pub fn with_previous(mut self, previous: Loc) -> Self {
        self.previous = Some(previous);
        self
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The kind's template with every `{name}` placeholder replaced by its argument.
    pub fn message(&self) -> String {
        let mut message = self.kind.template().to_string();
        for (name, value) in &self.args {
            message = message.replace(&format!("{{{}}}", name), value);
        }
        message
    }

    /// Flat, serializable view used for JSON output.
    pub fn to_record(&self) -> DiagnosticRecord {
        DiagnosticRecord {
            code: self.kind,
            severity: self.severity().letter(),
            file: self.location.filename.display().to_string(),
            line: self.location.line,
            message: self.message(),
            previous: self.previous.as_ref().map(|loc| loc.to_string()),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.location, self.kind.code(), self.message())?;
        if let Some(previous) = &self.previous {
            write!(f, " (previous at {})", previous)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticRecord {
    pub code: DiagnosticKind,
    pub severity: char,
    pub file: String,
    pub line: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

type Callback = Box<dyn FnMut(&Diagnostic)>;

#[derive(Default)]
struct Store {
    events: Vec<Diagnostic>,
    counts: HashMap<DiagnosticKind, usize>,
    muted: HashSet<DiagnosticKind>,
    callbacks: HashMap<DiagnosticKind, Vec<Callback>>,
}

/// Shared handle to a diagnostic sink. Cloning the handle shares the sink.
#[derive(Clone, Default)]
pub struct Diagnostics {
    store: Rc<RefCell<Store>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, diagnostic: Diagnostic) {
        tracing::debug!(
            code = diagnostic.kind.code(),
            location = %diagnostic.location,
            "{}",
            diagnostic.message()
        );

        // Callbacks run without the store borrowed so they may inspect the sink.
        let mut callbacks = self
            .store
            .borrow_mut()
            .callbacks
            .remove(&diagnostic.kind)
            .unwrap_or_default();
        for callback in callbacks.iter_mut() {
            callback(&diagnostic);
        }

        let mut store = self.store.borrow_mut();
        if !callbacks.is_empty() {
            let registered = store.callbacks.entry(diagnostic.kind).or_default();
            let added_meanwhile = std::mem::replace(registered, callbacks);
            registered.extend(added_meanwhile);
        }
        *store.counts.entry(diagnostic.kind).or_insert(0) += 1;
        store.events.push(diagnostic);
    }

    /// Register a callback invoked for every diagnostic of `kind`.
    pub fn on(&self, kind: DiagnosticKind, callback: impl FnMut(&Diagnostic) + 'static) {
        self.store
            .borrow_mut()
            .callbacks
            .entry(kind)
            .or_default()
            .push(Box::new(callback));
    }

    pub fn mute(&self, kind: DiagnosticKind) {
        self.store.borrow_mut().muted.insert(kind);
    }

    pub fn is_muted(&self, kind: DiagnosticKind) -> bool {
        self.store.borrow().muted.contains(&kind)
    }

    /// Forget all collected events. Mutes and callbacks are kept.
    pub fn reset(&self) {
        let mut store = self.store.borrow_mut();
        store.events.clear();
        store.counts.clear();
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.store.borrow().counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.store.borrow().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All events in emission order, muted ones included.
    pub fn events(&self) -> Vec<Diagnostic> {
        self.store.borrow().events.clone()
    }

    /// Kinds of all events in emission order.
    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.store.borrow().events.iter().map(|d| d.kind).collect()
    }

    /// Events whose kind is not muted.
    pub fn reportable(&self) -> Vec<Diagnostic> {
        let store = self.store.borrow();
        store
            .events
            .iter()
            .filter(|d| !store.muted.contains(&d.kind))
            .cloned()
            .collect()
    }

    pub fn has_reportable(&self) -> bool {
        let store = self.store.borrow();
        store.events.iter().any(|d| !store.muted.contains(&d.kind))
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.store.borrow();
        f.debug_struct("Diagnostics")
            .field("events", &store.events.len())
            .field("muted", &store.muted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::location::SourceLocation;

    fn loc(line: usize) -> Loc {
        SourceLocation::new("test.conf", line, Vec::new(), false).shared()
    }

    #[test]
    fn test_message_fills_arguments() {
        let diagnostic = Diagnostic::new(DiagnosticKind::DpPrioDupe, loc(3))
            .with_arg("priority", 2)
            .with_arg("pattern", "100")
            .with_previous(loc(2));
        assert_eq!(diagnostic.message(), "duplicate priority 2 for 100");
        assert_eq!(
            diagnostic.to_string(),
            "test.conf:3: E_DP_PRIO_DUPE duplicate priority 2 for 100 (previous at test.conf:2)"
        );
    }

    #[test]
    fn test_counts_by_kind_and_reset() {
        let sink = Diagnostics::new();
        sink.emit(Diagnostic::new(DiagnosticKind::WshEol, loc(1)));
        sink.emit(Diagnostic::new(DiagnosticKind::WshEol, loc(2)));
        sink.emit(Diagnostic::new(DiagnosticKind::WshBol, loc(3)));
        assert_eq!(sink.count(DiagnosticKind::WshEol), 2);
        assert_eq!(sink.count(DiagnosticKind::WshBol), 1);
        assert_eq!(sink.len(), 3);

        sink.reset();
        assert!(sink.is_empty());
        assert_eq!(sink.count(DiagnosticKind::WshEol), 0);
    }

    #[test]
    fn test_muted_kinds_are_collected_but_not_reportable() {
        let sink = Diagnostics::new();
        sink.mute(DiagnosticKind::WshEol);
        sink.emit(Diagnostic::new(DiagnosticKind::WshEol, loc(1)));
        assert_eq!(sink.len(), 1);
        assert!(!sink.has_reportable());

        sink.emit(Diagnostic::new(DiagnosticKind::WshBol, loc(2)));
        assert_eq!(sink.reportable().len(), 1);
    }

    #[test]
    fn test_callbacks_see_their_kind_only() {
        let sink = Diagnostics::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_in_callback = Rc::clone(&seen);
        sink.on(DiagnosticKind::DpLabelDupe, move |d| {
            seen_in_callback.borrow_mut().push(d.location.line)
        });

        sink.emit(Diagnostic::new(DiagnosticKind::DpLabelDupe, loc(4)));
        sink.emit(Diagnostic::new(DiagnosticKind::WshEol, loc(5)));
        sink.emit(Diagnostic::new(DiagnosticKind::DpLabelDupe, loc(6)));

        assert_eq!(*seen.borrow(), vec![4, 6]);
    }
}
