//! # pbxlint
//!
//! A static checker for PBX configuration and dialplan files.
//!
//! Files are read through a chain of lazy line stages (see [`pipeline`]), classified
//! by an ordered grammar (see [`parsing`]), and aggregated into contexts and a dialplan
//! (see [`building`]). Every deviation is reported to an explicit [`diagnostics::Diagnostics`]
//! sink; nothing in the chain aborts on bad input.
//!
//! The [`pattern`] and [`variable`] engines are independent of the stream stages and can be
//! used on their own.
//!
//! ## Testing
//!
//! Helpers for in-memory fixtures and diagnostic assertions live in the [`testing`] module.

pub mod ast;
pub mod building;
pub mod diagnostics;
pub mod loader;
pub mod parsing;
pub mod pattern;
pub mod pipeline;
pub mod settings;
pub mod testing;
pub mod variable;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use loader::Loader;
pub use settings::Settings;
