//! Turbo CLI - drive the TurboCommerce catalog search from a terminal.
//!
//! Commands:
//! - `turbo search` - Run a search and print the merged result pages
//! - `turbo browse` - Refine, sort and paginate interactively
//! - `turbo suggest` - Show type-ahead suggestions
//! - `turbo widget` - Preview the home-screen recommendation timeline
//! - `turbo config` - Manage configuration

mod commands;
mod context;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{BrowseArgs, ConfigArgs, SearchArgs, SuggestArgs, WidgetArgs};

/// Turbo CLI - Faceted catalog search for the TurboCommerce storefront
#[derive(Parser)]
#[command(name = "turbo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "TURBO_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog
    Search(SearchArgs),

    /// Browse results interactively
    Browse(BrowseArgs),

    /// Show search suggestions for partial input
    Suggest(SuggestArgs),

    /// Preview the recommendation widget timeline
    Widget(WidgetArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(logging::Verbosity::from_flags(cli.verbose, cli.quiet));

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Execute command
    let result = match cli.command {
        Commands::Search(args) => commands::search::run(args, &ctx).await,
        Commands::Browse(args) => commands::browse::run(args, &ctx).await,
        Commands::Suggest(args) => commands::suggest::run(args, &ctx).await,
        Commands::Widget(args) => commands::widget::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
