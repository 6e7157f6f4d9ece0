//! CLI command implementations.

pub mod browse;
pub mod config;
pub mod search;
pub mod suggest;
pub mod widget;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use turbo_search::ids::AttributeId;
use turbo_search::SearchState;

/// Arguments for the search command.
#[derive(Args)]
pub struct SearchArgs {
    /// Search text.
    #[arg(short, long)]
    pub query: Option<String>,

    /// Refinement as `attribute=value`; repeat for more.
    #[arg(short, long = "refine", value_name = "ATTR=VALUE")]
    pub refinements: Vec<String>,

    /// Sort option id.
    #[arg(short, long)]
    pub sort: Option<String>,

    /// Number of pages to load.
    #[arg(short, long, default_value_t = 1)]
    pub pages: u32,

    /// Start at this offset instead of the first page.
    #[arg(long)]
    pub offset: Option<u32>,
}

impl SearchArgs {
    /// Initial search state described by the flags.
    pub fn state(&self) -> Result<SearchState> {
        let mut state = SearchState {
            query: self
                .query
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            sort: self.sort.clone().map(Into::into),
            ..SearchState::default()
        };
        for raw in &self.refinements {
            let (attribute, value) = parse_refinement(raw)?;
            state.refinements.insert(attribute, value);
        }
        Ok(state)
    }
}

/// Arguments for the interactive browse command.
#[derive(Args)]
pub struct BrowseArgs {
    /// Initial search text.
    #[arg(short, long)]
    pub query: Option<String>,
}

/// Arguments for the suggest command.
#[derive(Args)]
pub struct SuggestArgs {
    /// Partial search text.
    pub text: String,
}

/// Arguments for the widget command.
#[derive(Args)]
pub struct WidgetArgs {
    /// Recommendations payload written by the app.
    #[arg(default_value = "recommendations.json")]
    pub file: String,

    /// URL scheme used for deep links.
    #[arg(long, default_value = "turbocommerce")]
    pub scheme: String,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,

    /// Initialize a new configuration file.
    Init {
        /// Overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },

    /// Validate configuration.
    Validate,
}

/// Split `attribute=value` into its parts.
pub fn parse_refinement(raw: &str) -> Result<(AttributeId, String)> {
    let Some((attribute, value)) = raw.split_once('=') else {
        bail!("Invalid refinement '{}': expected ATTR=VALUE", raw);
    };
    let (attribute, value) = (attribute.trim(), value.trim());
    if attribute.is_empty() || value.is_empty() {
        bail!("Invalid refinement '{}': attribute and value are required", raw);
    }
    Ok((AttributeId::new(attribute), value.to_string()))
}
