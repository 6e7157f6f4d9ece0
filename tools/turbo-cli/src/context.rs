//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::debug;
use turbo_search::{SearchConfig, SearchSession, SearchState};

use crate::output::Output;

/// Config file names looked up from the working directory upwards.
pub const CONFIG_NAMES: [&str; 3] = ["turbo.toml", ".turbo.toml", "turbo.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// Search configuration, environment overrides applied.
    pub config: SearchConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (mut config, config_path) = match config_path {
            Some(path) => {
                let path = PathBuf::from(path);
                let config = SearchConfig::load(&path)
                    .with_context(|| format!("Failed to load config: {}", path.display()))?;
                (config, Some(path))
            }
            // Try to find config in current directory or parent directories
            None => match Self::find_config(&cwd) {
                Some(path) => {
                    let config = SearchConfig::load(&path)
                        .with_context(|| format!("Failed to load config: {}", path.display()))?;
                    (config, Some(path))
                }
                None => (SearchConfig::default(), None),
            },
        };

        config
            .apply_overrides(std::env::vars())
            .context("Invalid TURBO_* environment override")?;
        debug!(path = ?config_path, "configuration loaded");

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            for name in CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    return Some(config_path);
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Build a search session against the configured backend, starting at `state`.
    pub fn session(&self, state: SearchState) -> Result<SearchSession> {
        self.config.validate().context(
            "Configuration is incomplete; run `turbo config init` or set TURBO_BASE_URL, TURBO_ORGANIZATION_ID and TURBO_SITE_ID",
        )?;
        let fetcher = Arc::new(self.config.http_fetcher());
        Ok(SearchSession::configured(&self.config, fetcher)
            .initial_state(state)
            .build())
    }
}
