//! Checker settings
//!
//! `defaults/pbxlint.default.toml` is embedded into the binary. User files and single-key
//! overrides are layered on top through [`SettingsLoader`] before deserializing into
//! [`Settings`]. The command line layers, in order: the defaults, a [`LOCAL_FILE`] in the
//! working directory if there is one, the `--settings` file, then each `--set key=value`.

use crate::diagnostics::DiagnosticKind;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

const DEFAULT_TOML: &str = include_str!("../defaults/pbxlint.default.toml");

/// Settings file picked up from the working directory when present.
pub const LOCAL_FILE: &str = "pbxlint.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Config(#[from] ConfigError),
    #[error("unknown diagnostic code in diagnostics.muted: {0}")]
    UnknownCode(String),
    #[error("expected key=value, got '{0}'")]
    Assignment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub diagnostics: DiagnosticsSettings,
    pub dialplan: DialplanSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiagnosticsSettings {
    pub muted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DialplanSettings {
    pub duplicate_priority: DuplicatePriorityPolicy,
    pub singleton_duplicates: SingletonPolicy,
}

/// Which of two entries with the same pattern and priority is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePriorityPolicy {
    KeepFirst,
    KeepLast,
}

/// Handling of a repeated `[general]` or `[globals]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SingletonPolicy {
    Merge,
    Discard,
}

impl Settings {
    /// The muted codes as kinds. Unknown codes are an error.
    pub fn muted_kinds(&self) -> Result<Vec<DiagnosticKind>, SettingsError> {
        self.diagnostics
            .muted
            .iter()
            .map(|code| {
                DiagnosticKind::from_code(code)
                    .ok_or_else(|| SettingsError::UnknownCode(code.clone()))
            })
            .collect()
    }
}

impl Default for Settings {
    /// Same values as the embedded defaults file.
    fn default() -> Self {
        Self {
            diagnostics: DiagnosticsSettings { muted: Vec::new() },
            dialplan: DialplanSettings {
                duplicate_priority: DuplicatePriorityPolicy::KeepFirst,
                singleton_duplicates: SingletonPolicy::Merge,
            },
        }
    }
}

/// Layers user settings over the built-in defaults.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    builder: ConfigBuilder<DefaultState>,
}

impl SettingsLoader {
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a settings file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional settings file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (used for CLI flags).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, SettingsError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Apply a `key=value` override as written on the command line.
    pub fn with_assignment(self, assignment: &str) -> Result<Self, SettingsError> {
        match assignment.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                self.set_override(key.trim(), value.trim().to_string())
            }
            _ => Err(SettingsError::Assignment(assignment.to_string())),
        }
    }

    pub fn build(self) -> Result<Settings, SettingsError> {
        let settings: Settings = self.builder.build()?.try_deserialize()?;
        settings.muted_kinds()?;
        Ok(settings)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}
