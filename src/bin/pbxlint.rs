//! Command-line interface for pbxlint
//!
//! Checks one or more dialplan (or plain configuration) files and prints the collected
//! diagnostics.
//!
//! Usage:
//!   pbxlint `<path>...` [--settings `<file>`] [--set `<key=value>`]... [--mute `<CODE>`]...
//!           [--format text|json]
//!   pbxlint `<path>` --dump                 - Print the normalized dialplan
//!   pbxlint `<path>` --config-only          - Skip dialplan checks
//!
//! Exit status is 0 when nothing reportable was found, 1 when diagnostics were reported
//! and 2 when a file or the settings could not be loaded. A `pbxlint.toml` in the working
//! directory is read before `--settings`.

use clap::{Parser, ValueEnum};
use pbxlint::diagnostics::Diagnostics;
use pbxlint::settings::{SettingsLoader, LOCAL_FILE};
use pbxlint::Loader;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "pbxlint", version, about = "Static checker for PBX dialplan files")]
struct Cli {
    /// Files to check
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Settings file layered over the built-in defaults
    #[arg(long, short = 'c')]
    settings: Option<PathBuf>,

    /// Override one setting, e.g. dialplan.duplicate_priority=keep-last (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Diagnostic code to mute (repeatable)
    #[arg(long = "mute", value_name = "CODE")]
    muted: Vec<String>,

    /// Output format for diagnostics
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Only check the generic configuration layer
    #[arg(long)]
    config_only: bool,

    /// Print the normalized dialplan after checking
    #[arg(long, conflicts_with = "config_only")]
    dump: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = SettingsLoader::new().with_optional_file(LOCAL_FILE);
    if let Some(path) = &cli.settings {
        settings = settings.with_file(path);
    }
    let settings = match cli
        .overrides
        .iter()
        .try_fold(settings, |settings, raw| settings.with_assignment(raw))
        .and_then(SettingsLoader::build)
    {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Settings error: {}", e);
            return ExitCode::from(2);
        }
    };

    let diagnostics = Diagnostics::new();
    for code in &cli.muted {
        match pbxlint::DiagnosticKind::from_code(code) {
            Some(kind) => diagnostics.mute(kind),
            None => {
                eprintln!("Unknown diagnostic code: {}", code);
                return ExitCode::from(2);
            }
        }
    }

    let loader = match Loader::new()
        .with_diagnostics(diagnostics)
        .with_settings(settings)
    {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("Settings error: {}", e);
            return ExitCode::from(2);
        }
    };

    let mut failed_open = false;
    for path in &cli.paths {
        if cli.config_only {
            if let Err(e) = loader.load_config(path) {
                eprintln!("{}", e);
                failed_open = true;
            }
            continue;
        }
        match loader.load_dialplan(path) {
            Ok(build) => {
                if cli.dump {
                    print!("{}", build.dialplan.format());
                }
            }
            Err(e) => {
                eprintln!("{}", e);
                failed_open = true;
            }
        }
    }

    let reportable = loader.diagnostics().reportable();
    match cli.format {
        OutputFormat::Text => {
            for diagnostic in &reportable {
                println!("{}", diagnostic);
            }
        }
        OutputFormat::Json => {
            let records: Vec<_> = reportable.iter().map(|d| d.to_record()).collect();
            match serde_json::to_string_pretty(&records) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Serialization error: {}", e);
                    return ExitCode::from(2);
                }
            }
        }
    }

    if failed_open {
        ExitCode::from(2)
    } else if reportable.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
