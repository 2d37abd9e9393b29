//! Generic configuration aggregation
//!
//! Groups the element stream into [`Context`]s.
//!
//! # Logic
//!
//! - A context element closes the previous context (which is yielded) and becomes the
//!   current one.
//! - Varsets are appended to the current context. Without one they raise
//!   `E_CONF_CTX_MISSING` and are dropped.
//! - Empty lines are consumed.
//! - At the end of input the current context is yielded.
//!
//! Contexts are yielded in file order. Reopened names are not merged here; that is up to
//! the consumer.

use crate::ast::elements::{Context, Element};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};

pub struct ConfigAggregator<I> {
    elements: I,
    current: Option<Context>,
    diagnostics: Diagnostics,
}

impl<I> ConfigAggregator<I>
where
    I: Iterator<Item = Element>,
{
    pub fn new(elements: I, diagnostics: Diagnostics) -> Self {
        Self {
            elements,
            current: None,
            diagnostics,
        }
    }

    fn open(&mut self, context: Context) -> Option<Context> {
        if !context.templates.is_empty() {
            self.diagnostics.emit(
                Diagnostic::new(DiagnosticKind::ConfTemplateNotImpl, context.location.clone())
                    .with_arg("context", &context.name)
                    .with_arg("templates", context.templates.join(",")),
            );
        }
        self.current.replace(context)
    }
}

impl<I> Iterator for ConfigAggregator<I>
where
    I: Iterator<Item = Element>,
{
    type Item = Context;

    fn next(&mut self) -> Option<Context> {
        loop {
            match self.elements.next() {
                Some(Element::Context(context)) => {
                    if let Some(previous) = self.open(context) {
                        return Some(previous);
                    }
                }
                Some(Element::Varset(varset)) => match self.current.as_mut() {
                    Some(context) => context.varsets.push(varset),
                    None => self.diagnostics.emit(
                        Diagnostic::new(DiagnosticKind::ConfCtxMissing, varset.location.clone())
                            .with_arg("key", &varset.key),
                    ),
                },
                Some(Element::Empty(_)) => {}
                None => return self.current.take(),
            }
        }
    }
}
