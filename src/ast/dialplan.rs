//! Dialplan model
//!
//! A [`Dialplan`] owns the `[general]` and `[globals]` contexts plus the ordered list of
//! [`DialplanContext`]s. Each dialplan context stores its extensions in insertion order and
//! indexes them by [`ExtensionKey`] (pattern plus optional caller-id match), which is where
//! priority resolution and duplicate/order detection happen.

use super::elements::Context;
use super::location::Loc;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::pattern::Pattern;
use crate::settings::DuplicatePriorityPolicy;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    /// The `hint` pseudo-priority. Sorts before every numbered step.
    Hint,
    Number(u32),
}

impl Priority {
    pub fn number(self) -> Option<u32> {
        match self {
            Priority::Number(n) => Some(n),
            Priority::Hint => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Hint => f.write_str("hint"),
            Priority::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Priority as written, before `n` is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityRef {
    Explicit(Priority),
    /// `n`: one more than the previous priority of the same extension.
    Next,
}

/// Pattern plus optional caller-id match (`exten => 100/555,1,...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionKey {
    pub pattern: Pattern,
    pub caller_id: Option<String>,
}

impl fmt::Display for ExtensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.caller_id {
            Some(cid) => write!(f, "{}/{}", self.pattern, cid),
            None => write!(f, "{}", self.pattern),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    pub key: ExtensionKey,
    pub priority: Priority,
    pub label: Option<String>,
    /// Application call, e.g. `Dial(SIP/100,30)`.
    pub app: String,
    pub location: Loc,
}

impl Extension {
    pub fn pattern(&self) -> &Pattern {
        &self.key.pattern
    }
}

/// An `exten`/`same` line after splitting but before priority resolution.
#[derive(Debug, Clone)]
pub struct PendingExtension {
    /// `None` for `same =>`, which inherits the previous extension's key.
    pub key: Option<ExtensionKey>,
    pub priority: PriorityRef,
    pub label: Option<String>,
    pub app: String,
    pub location: Loc,
}

/// `include => other` inside a dialplan context.
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    pub context: String,
    pub location: Loc,
}

/// Invariant failures. User input that the grammar cannot rule out by itself ends up
/// here instead of in the diagnostic sink.
#[derive(Debug, Clone, Error)]
pub enum DialplanError {
    #[error("{location}: 'same' without a preceding extension in [{context}]")]
    SameWithoutPredecessor { context: String, location: Loc },
    #[error("{location}: priority 'n' without a preceding priority for {key} in [{context}]")]
    NextWithoutPredecessor {
        context: String,
        key: String,
        location: Loc,
    },
}

#[derive(Debug, Clone)]
pub struct DialplanContext {
    pub name: String,
    pub location: Loc,
    pub had_leading_comment: bool,
    extensions: Vec<Extension>,
    includes: Vec<Include>,
    by_key: HashMap<ExtensionKey, Vec<usize>>,
    key_order: Vec<ExtensionKey>,
    last: Option<usize>,
}

impl DialplanContext {
    pub fn new(name: impl Into<String>, location: Loc) -> Self {
        Self {
            name: name.into(),
            location,
            had_leading_comment: false,
            extensions: Vec::new(),
            includes: Vec::new(),
            by_key: HashMap::new(),
            key_order: Vec::new(),
            last: None,
        }
    }

    /// All extensions in insertion order.
    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn includes(&self) -> &[Include] {
        &self.includes
    }

    /// Extension keys in the order they first appeared.
    pub fn keys(&self) -> &[ExtensionKey] {
        &self.key_order
    }

    /// Extensions sharing `key`, in insertion order.
    pub fn extensions_for<'a>(
        &'a self,
        key: &ExtensionKey,
    ) -> impl Iterator<Item = &'a Extension> + 'a {
        self.by_key
            .get(key)
            .into_iter()
            .flatten()
            .map(move |&index| &self.extensions[index])
    }

    /// Extensions for a bare pattern without caller-id match.
    pub fn extensions_for_pattern<'a>(
        &'a self,
        pattern: &str,
    ) -> impl Iterator<Item = &'a Extension> + 'a {
        let key = ExtensionKey {
            pattern: Pattern::parse(pattern),
            caller_id: None,
        };
        self.by_key
            .get(&key)
            .into_iter()
            .flatten()
            .map(move |&index| &self.extensions[index])
    }

    pub fn last_extension(&self) -> Option<&Extension> {
        self.last.map(|index| &self.extensions[index])
    }

    pub fn add_include(&mut self, include: Include) {
        self.includes.push(include);
    }

    /// Resolve and store an extension.
    ///
    /// Duplicate priorities, out-of-order priorities and duplicate labels are reported to
    /// `diagnostics`. A missing predecessor for `same` or `n` is returned as an error and
    /// nothing is stored.
    pub fn add_extension(
        &mut self,
        pending: PendingExtension,
        policy: DuplicatePriorityPolicy,
        diagnostics: &Diagnostics,
    ) -> Result<(), DialplanError> {
        let key = match pending.key {
            Some(key) => key,
            None => self
                .last_extension()
                .map(|previous| previous.key.clone())
                .ok_or_else(|| DialplanError::SameWithoutPredecessor {
                    context: self.name.clone(),
                    location: pending.location.clone(),
                })?,
        };

        let previous = self
            .extensions_for(&key)
            .filter(|ext| ext.priority.number().is_some())
            .last()
            .cloned();

        let priority = match pending.priority {
            PriorityRef::Explicit(priority) => priority,
            PriorityRef::Next => match previous.as_ref().and_then(|ext| ext.priority.number()) {
                Some(n) => Priority::Number(n + 1),
                None => {
                    return Err(DialplanError::NextWithoutPredecessor {
                        context: self.name.clone(),
                        key: key.to_string(),
                        location: pending.location,
                    })
                }
            },
        };

        let mut extension = Extension {
            key,
            priority,
            label: pending.label,
            app: pending.app,
            location: pending.location,
        };

        let duplicate = self.by_key.get(&extension.key).and_then(|indexes| {
            indexes
                .iter()
                .copied()
                .find(|&index| self.extensions[index].priority == priority)
        });
        if let Some(index) = duplicate {
            diagnostics.emit(
                Diagnostic::new(DiagnosticKind::DpPrioDupe, extension.location.clone())
                    .with_arg("priority", priority)
                    .with_arg("pattern", &extension.key)
                    .with_previous(self.extensions[index].location.clone()),
            );
            if policy == DuplicatePriorityPolicy::KeepLast {
                self.check_label(&mut extension, Some(index), diagnostics);
                self.extensions[index] = extension;
                self.last = Some(index);
            }
            return Ok(());
        }

        if let (Priority::Number(n), Some(previous)) = (priority, previous.as_ref()) {
            if previous.priority.number().is_some_and(|prev| n <= prev) {
                diagnostics.emit(
                    Diagnostic::new(DiagnosticKind::DpPrioBadOrder, extension.location.clone())
                        .with_arg("priority", priority)
                        .with_arg("pattern", &extension.key)
                        .with_arg("previous", previous.priority)
                        .with_previous(previous.location.clone()),
                );
            }
        }

        self.check_label(&mut extension, None, diagnostics);

        let index = self.extensions.len();
        match self.by_key.get_mut(&extension.key) {
            Some(indexes) => indexes.push(index),
            None => {
                self.key_order.push(extension.key.clone());
                self.by_key.insert(extension.key.clone(), vec![index]);
            }
        }
        self.extensions.push(extension);
        self.last = Some(index);
        Ok(())
    }

    /// Clear the label of `extension` if another extension with the same key already uses
    /// it. `replacing` is skipped, it is about to be overwritten.
    fn check_label(
        &self,
        extension: &mut Extension,
        replacing: Option<usize>,
        diagnostics: &Diagnostics,
    ) {
        let Some(label) = extension.label.as_deref() else {
            return;
        };
        let clash = self
            .by_key
            .get(&extension.key)
            .into_iter()
            .flatten()
            .copied()
            .filter(|&index| Some(index) != replacing)
            .map(|index| &self.extensions[index])
            .find(|other| other.label.as_deref() == Some(label));
        if let Some(other) = clash {
            diagnostics.emit(
                Diagnostic::new(DiagnosticKind::DpLabelDupe, extension.location.clone())
                    .with_arg("label", label)
                    .with_arg("pattern", &extension.key)
                    .with_previous(other.location.clone()),
            );
            extension.label = None;
        }
    }

    pub(crate) fn set_leading_comment(&mut self, had_leading_comment: bool) {
        self.had_leading_comment |= had_leading_comment;
    }
}

/// Root of a parsed dialplan.
#[derive(Debug, Clone, Default)]
pub struct Dialplan {
    pub general: Option<Context>,
    pub globals: Option<Context>,
    contexts: Vec<DialplanContext>,
    index: HashMap<String, usize>,
}

impl Dialplan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dialplan contexts in the order they were first opened.
    pub fn contexts(&self) -> &[DialplanContext] {
        &self.contexts
    }

    pub fn context(&self, name: &str) -> Option<&DialplanContext> {
        self.index.get(name).map(|&index| &self.contexts[index])
    }

    pub(crate) fn context_mut(&mut self, name: &str) -> Option<&mut DialplanContext> {
        match self.index.get(name) {
            Some(&index) => Some(&mut self.contexts[index]),
            None => None,
        }
    }

    /// Contexts by name, for include and goto resolution done outside the core.
    pub fn contexts_by_name(&self) -> HashMap<&str, &DialplanContext> {
        self.contexts.iter().map(|c| (c.name.as_str(), c)).collect()
    }

    pub(crate) fn push_context(&mut self, context: DialplanContext) {
        self.index.insert(context.name.clone(), self.contexts.len());
        self.contexts.push(context);
    }

    /// Human-inspectable rendering, grouping extensions by key:
    ///
    /// ```text
    /// [default]
    ///   include => other
    ///   100 => 1(start): NoOp(x)
    ///          2: Hangup()
    /// ```
    ///
    /// Keys appear in first-seen order, priorities ascending with `hint` first. The key
    /// column is padded to the widest key of the context.
    pub fn format(&self) -> String {
        let mut sections = Vec::new();
        for context in [&self.general, &self.globals].into_iter().flatten() {
            let mut out = format!("[{}]\n", context.name);
            for varset in &context.varsets {
                out.push_str(&format!(
                    "  {} {} {}\n",
                    varset.key,
                    varset.separator.as_str(),
                    varset.value
                ));
            }
            sections.push(out);
        }

        for context in &self.contexts {
            let mut out = format!("[{}]\n", context.name);
            for include in &context.includes {
                out.push_str(&format!("  include => {}\n", include.context));
            }
            let labels: Vec<String> = context.keys().iter().map(|k| k.to_string()).collect();
            let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
            for (key, label) in context.keys().iter().zip(&labels) {
                let mut entries: Vec<&Extension> = context.extensions_for(key).collect();
                entries.sort_by_key(|ext| ext.priority);
                for (i, ext) in entries.iter().enumerate() {
                    let head = if i == 0 {
                        format!("{:<width$} =>", label, width = width)
                    } else {
                        " ".repeat(width + 3)
                    };
                    let step = match &ext.label {
                        Some(name) => format!("{}({})", ext.priority, name),
                        None => ext.priority.to_string(),
                    };
                    out.push_str(&format!("  {} {}: {}\n", head, step, ext.app));
                }
            }
            sections.push(out);
        }
        sections.join("\n")
    }
}
