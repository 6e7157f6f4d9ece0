//! Tracing subscriber setup.
//!
//! Filter priority: `TURBO_LOG`, then `RUST_LOG`, then the `-v` / `-q` flags.
//! Logs go to stderr so JSON output on stdout stays clean.

use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    fn default_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
        }
    }
}

/// Install the global subscriber. Call once, before loading config.
pub fn init(verbosity: Verbosity) {
    let use_ansi = std::io::IsTerminal::is_terminal(&std::io::stderr());
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi)
        .with_target(verbosity == Verbosity::Verbose);

    tracing_subscriber::registry()
        .with(build_filter(verbosity))
        .with(layer.without_time().compact())
        .init();
}

fn build_filter(verbosity: Verbosity) -> EnvFilter {
    if let Ok(directives) = std::env::var("TURBO_LOG") {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let level = verbosity.default_level().as_str().to_lowercase();
    match verbosity {
        Verbosity::Verbose => EnvFilter::new(format!(
            "turbo_cli={level},turbo_search={level},turbo_data={level},turbo_widget={level},info"
        )),
        _ => EnvFilter::new(level),
    }
}
