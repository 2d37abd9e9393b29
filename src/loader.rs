//! Entry point for checking files
//!
//! [`Loader`] wires the whole chain for one top-level file:
//!
//! ```text
//! ByteLineSource -> ... -> GrammarParser -> VerticalSpacingChecker -> ConfigAggregator
//!                                                                  -> DialplanAggregator
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! let loader = Loader::new().with_settings(settings)?;
//! let build = loader.load_dialplan("/etc/pbx/extensions.conf")?;
//! for diagnostic in loader.diagnostics().reportable() {
//!     println!("{}", diagnostic);
//! }
//! ```

use crate::ast::elements::Context;
use crate::building::{ConfigAggregator, DialplanAggregator, DialplanBuild};
use crate::diagnostics::Diagnostics;
use crate::parsing;
use crate::pipeline::source::{FsOpener, SourceError, SourceOpener};
use crate::settings::{Settings, SettingsError};
use std::path::Path;
use std::rc::Rc;

pub struct Loader {
    opener: Rc<dyn SourceOpener>,
    diagnostics: Diagnostics,
    settings: Settings,
}

impl Loader {
    /// Loader reading from disk with default settings and a fresh sink.
    pub fn new() -> Self {
        Self {
            opener: Rc::new(FsOpener),
            diagnostics: Diagnostics::new(),
            settings: Settings::default(),
        }
    }

    pub fn with_opener(mut self, opener: impl SourceOpener + 'static) -> Self {
        self.opener = Rc::new(opener);
        self
    }

    /// Use `settings`, muting the kinds they list on the sink.
    pub fn with_settings(mut self, settings: Settings) -> Result<Self, SettingsError> {
        for kind in settings.muted_kinds()? {
            self.diagnostics.mute(kind);
        }
        self.settings = settings;
        Ok(self)
    }

    /// Report into an existing sink instead of a fresh one.
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Parse `path` as a generic configuration file.
    pub fn load_config(&self, path: impl AsRef<Path>) -> Result<Vec<Context>, SourceError> {
        let elements =
            parsing::elements(path.as_ref(), Rc::clone(&self.opener), &self.diagnostics)?;
        Ok(ConfigAggregator::new(elements, self.diagnostics.clone()).collect())
    }

    /// Parse `path` as a dialplan.
    pub fn load_dialplan(&self, path: impl AsRef<Path>) -> Result<DialplanBuild, SourceError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading dialplan");
        let elements = parsing::elements(path, Rc::clone(&self.opener), &self.diagnostics)?;
        let contexts = ConfigAggregator::new(elements, self.diagnostics.clone());
        let aggregator =
            DialplanAggregator::new(self.settings.dialplan.clone(), self.diagnostics.clone());
        Ok(aggregator.aggregate(contexts))
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("diagnostics", &self.diagnostics)
            .field("settings", &self.settings)
            .finish()
    }
}
