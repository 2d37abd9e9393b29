//! Dialplan aggregation
//!
//! Turns the generic [`Context`] stream into a [`Dialplan`].
//!
//! # Logic
//!
//! - `[general]` and `[globals]` are kept aside as plain contexts. A second occurrence
//!   raises `W_DP_GENERAL_DUPE` / `W_DP_GLOBALS_DUPE` and is merged or discarded.
//! - Any other context becomes a [`DialplanContext`]. Reopening a name raises
//!   `W_DP_CTX_DUPE` and continues filling the existing context.
//! - Inside a dialplan context each varset is classified by key:
//!   - `exten => pattern[/cid],priority[(label)],app`
//!   - `same => priority[(label)],app`
//!   - `include => context`
//!   - anything else: `E_DP_KEY_INVALID`
//!
//! Fields are split on commas outside parentheses, so the application part keeps its own
//! commas. Priority resolution and duplicate detection live in
//! [`DialplanContext::add_extension`]; invariant failures it returns are logged and
//! collected in [`DialplanBuild::errors`].

use crate::ast::dialplan::{
    Dialplan, DialplanContext, DialplanError, ExtensionKey, Include, PendingExtension, Priority,
    PriorityRef,
};
use crate::ast::elements::{Context, Varset};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::pattern::Pattern;
use crate::settings::{DialplanSettings, SingletonPolicy};
use once_cell::sync::Lazy;
use regex::Regex;

static PRIORITY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<prio>[^()]+?)(?:\((?P<label>[^()]*)\))?$").unwrap());

/// Result of aggregating a dialplan.
#[derive(Debug, Default)]
pub struct DialplanBuild {
    pub dialplan: Dialplan,
    /// Invariant failures; the offending entries were dropped.
    pub errors: Vec<DialplanError>,
}

pub struct DialplanAggregator {
    settings: DialplanSettings,
    diagnostics: Diagnostics,
    build: DialplanBuild,
}

impl DialplanAggregator {
    pub fn new(settings: DialplanSettings, diagnostics: Diagnostics) -> Self {
        Self {
            settings,
            diagnostics,
            build: DialplanBuild::default(),
        }
    }

    /// Consume every context and return the finished dialplan.
    pub fn aggregate(mut self, contexts: impl IntoIterator<Item = Context>) -> DialplanBuild {
        for context in contexts {
            self.add_context(context);
        }
        self.build
    }

    pub fn add_context(&mut self, context: Context) {
        match context.name.as_str() {
            "general" => self.add_singleton(context, DiagnosticKind::DpGeneralDupe),
            "globals" => self.add_singleton(context, DiagnosticKind::DpGlobalsDupe),
            _ => self.add_dialplan_context(context),
        }
    }

    fn add_singleton(&mut self, context: Context, duplicate: DiagnosticKind) {
        let slot = if duplicate == DiagnosticKind::DpGeneralDupe {
            &mut self.build.dialplan.general
        } else {
            &mut self.build.dialplan.globals
        };
        if slot.is_none() {
            *slot = Some(context);
            return;
        }
        let Some(existing) = slot.as_mut() else {
            return;
        };

        self.diagnostics.emit(
            Diagnostic::new(duplicate, context.location.clone())
                .with_previous(existing.location.clone()),
        );
        match self.settings.singleton_duplicates {
            SingletonPolicy::Merge => existing.varsets.extend(context.varsets),
            SingletonPolicy::Discard => {
                tracing::debug!(context = %context.name, "discarding duplicate section")
            }
        }
    }

    fn add_dialplan_context(&mut self, context: Context) {
        let Context {
            name,
            had_leading_comment,
            location,
            varsets,
            ..
        } = context;

        match self.build.dialplan.context(&name) {
            Some(existing) => {
                self.diagnostics.emit(
                    Diagnostic::new(DiagnosticKind::DpCtxDupe, location.clone())
                        .with_arg("context", &name)
                        .with_previous(existing.location.clone()),
                );
                tracing::debug!(context = %name, location = %location, "reopening context");
            }
            None => {
                self.build
                    .dialplan
                    .push_context(DialplanContext::new(name.clone(), location));
            }
        }
        let Some(target) = self.build.dialplan.context_mut(&name) else {
            return;
        };
        target.set_leading_comment(had_leading_comment);

        for varset in varsets {
            if let Err(err) = classify(target, varset, &self.settings, &self.diagnostics) {
                tracing::error!(error = %err, "dialplan invariant violated");
                self.build.errors.push(err);
            }
        }
    }
}

fn classify(
    context: &mut DialplanContext,
    varset: Varset,
    settings: &DialplanSettings,
    diagnostics: &Diagnostics,
) -> Result<(), DialplanError> {
    let key = varset.key.to_ascii_lowercase();
    if matches!(key.as_str(), "exten" | "same" | "include") && !varset.is_arrow() {
        diagnostics.emit(
            Diagnostic::new(DiagnosticKind::DpExtenEquals, varset.location.clone())
                .with_arg("key", &varset.key),
        );
    }

    match key.as_str() {
        "exten" | "same" => match parse_extension(&varset, key == "same", diagnostics) {
            Some(pending) => {
                context.add_extension(pending, settings.duplicate_priority, diagnostics)
            }
            None => Ok(()),
        },
        "include" => {
            context.add_include(Include {
                context: varset.value.trim().to_string(),
                location: varset.location,
            });
            Ok(())
        }
        _ => {
            diagnostics.emit(
                Diagnostic::new(DiagnosticKind::DpKeyInvalid, varset.location.clone())
                    .with_arg("key", &varset.key)
                    .with_arg("context", &context.name),
            );
            Ok(())
        }
    }
}

/// Split an `exten`/`same` value into its fields. `None` when the entry is dropped.
fn parse_extension(
    varset: &Varset,
    is_same: bool,
    diagnostics: &Diagnostics,
) -> Option<PendingExtension> {
    let wanted = if is_same { 2 } else { 3 };
    let fields = split_fields(&varset.value, wanted);
    if fields.len() < wanted {
        diagnostics.emit(
            Diagnostic::new(DiagnosticKind::DpValueInvalid, varset.location.clone())
                .with_arg("key", &varset.key)
                .with_arg("value", &varset.value),
        );
        return None;
    }

    let (key, rest) = if is_same {
        (None, &fields[..])
    } else {
        (Some(parse_key(fields[0], varset, diagnostics)?), &fields[1..])
    };
    let (priority, label) = parse_priority(rest[0], varset, diagnostics)?;

    Some(PendingExtension {
        key,
        priority,
        label,
        app: rest[1].to_string(),
        location: varset.location.clone(),
    })
}

fn parse_key(field: &str, varset: &Varset, diagnostics: &Diagnostics) -> Option<ExtensionKey> {
    let (raw, caller_id) = match field.split_once('/') {
        Some((raw, cid)) => (raw.trim(), Some(cid.trim().to_string())),
        None => (field, None),
    };
    let pattern = Pattern::parse(raw);

    if !pattern.is_valid() {
        diagnostics.emit(
            Diagnostic::new(DiagnosticKind::DpPatInvalid, varset.location.clone())
                .with_arg("pattern", raw),
        );
        return None;
    }
    if !pattern.is_canonical() {
        diagnostics.emit(
            Diagnostic::new(DiagnosticKind::PatNonCanonical, varset.location.clone())
                .with_arg("pattern", raw)
                .with_arg("canonical", pattern.canonical_pattern()),
        );
    }
    Some(ExtensionKey { pattern, caller_id })
}

fn parse_priority(
    field: &str,
    varset: &Varset,
    diagnostics: &Diagnostics,
) -> Option<(PriorityRef, Option<String>)> {
    let invalid = || {
        diagnostics.emit(
            Diagnostic::new(DiagnosticKind::DpPrioInvalid, varset.location.clone())
                .with_arg("priority", field),
        );
    };

    let Some(caps) = PRIORITY_REGEX.captures(field) else {
        invalid();
        return None;
    };
    let priority = match caps["prio"].trim() {
        "n" => PriorityRef::Next,
        "hint" => PriorityRef::Explicit(Priority::Hint),
        number => match number.parse::<u32>() {
            Ok(n) if n > 0 => PriorityRef::Explicit(Priority::Number(n)),
            _ => {
                invalid();
                return None;
            }
        },
    };
    let label = caps
        .name("label")
        .map(|m| m.as_str().trim().to_string())
        .filter(|label| !label.is_empty());
    Some((priority, label))
}

/// Split on commas outside parentheses into at most `max` trimmed fields.
fn split_fields(value: &str, max: usize) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 && fields.len() + 1 < max => {
                fields.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(value[start..].trim());
    fields
}
