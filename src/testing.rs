//! Test helpers
//!
//! Fixtures are served from memory under the name [`FIXTURE_PATH`], so locations in
//! diagnostics read `test.conf:<line>`.
//!
//! ```rust,ignore
//! let (build, sink) = parse_dialplan("[c]\nexten => s,1,NoOp()\n");
//! assert_kinds(&sink, &[]);
//! ```

use crate::ast::elements::Context;
use crate::building::DialplanBuild;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::loader::Loader;
use crate::pipeline::source::MemoryOpener;
use crate::settings::Settings;

pub const FIXTURE_PATH: &str = "test.conf";

fn fixture_loader(content: &str, settings: Settings) -> Loader {
    Loader::new()
        .with_opener(MemoryOpener::new().with_file(FIXTURE_PATH, content))
        .with_settings(settings)
        .expect("fixture settings to be valid")
}

/// Parse `content` as a generic configuration file.
pub fn parse_config(content: &str) -> (Vec<Context>, Diagnostics) {
    let loader = fixture_loader(content, Settings::default());
    let contexts = loader
        .load_config(FIXTURE_PATH)
        .expect("in-memory fixture to open");
    (contexts, loader.diagnostics().clone())
}

/// Parse `content` as a dialplan with default settings.
pub fn parse_dialplan(content: &str) -> (DialplanBuild, Diagnostics) {
    parse_dialplan_with(content, Settings::default())
}

pub fn parse_dialplan_with(content: &str, settings: Settings) -> (DialplanBuild, Diagnostics) {
    let loader = fixture_loader(content, settings);
    let build = loader
        .load_dialplan(FIXTURE_PATH)
        .expect("in-memory fixture to open");
    (build, loader.diagnostics().clone())
}

/// Assert the exact sequence of reported kinds.
#[track_caller]
pub fn assert_kinds(diagnostics: &Diagnostics, expected: &[DiagnosticKind]) {
    let actual = diagnostics.kinds();
    assert_eq!(
        actual,
        expected,
        "diagnostics: {:#?}",
        diagnostics
            .events()
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
    );
}
