//! One-shot search command.

use anyhow::Result;
use serde::Serialize;
use turbo_search::presentation::FilterPresentation;
use turbo_search::{LoadOutcome, ProductSummary, SearchSession, SearchSnapshot, SearchState};

use super::SearchArgs;
use crate::context::Context;

/// Machine-readable result of `turbo search --json`.
#[derive(Serialize)]
struct SearchReport {
    parameters: SearchState,
    total: Option<u32>,
    remaining: Option<u32>,
    loaded_offsets: Vec<u32>,
    has_more: bool,
    items: Vec<ProductSummary>,
    filters: FilterPresentation,
    errors: Vec<String>,
}

impl From<SearchSnapshot> for SearchReport {
    fn from(snapshot: SearchSnapshot) -> Self {
        Self {
            parameters: snapshot.parameters,
            total: snapshot.total,
            remaining: snapshot.remaining,
            loaded_offsets: snapshot.loaded_offsets,
            has_more: snapshot.has_more,
            items: snapshot.items,
            filters: snapshot.filters,
            errors: snapshot
                .errors
                .iter()
                .map(|(offset, err)| format!("offset {}: {}", offset, err))
                .collect(),
        }
    }
}

/// Run the search command.
pub async fn run(args: SearchArgs, ctx: &Context) -> Result<()> {
    let session = ctx.session(args.state()?)?;

    let spinner = ctx.output.spinner("Searching catalog...");
    let result = load_pages(&session, args.offset, args.pages.max(1)).await;
    spinner.finish_and_clear();
    result?;

    let snapshot = session.snapshot();
    if ctx.output.is_json() {
        ctx.output.json(&SearchReport::from(snapshot));
        return Ok(());
    }

    render(ctx, &snapshot);
    Ok(())
}

async fn load_pages(session: &SearchSession, offset: Option<u32>, pages: u32) -> Result<()> {
    let first = match offset {
        Some(offset) => session.load_page(offset).await?,
        None => session.load_next().await?,
    };
    if first == LoadOutcome::Skipped {
        return Ok(());
    }

    for _ in 1..pages {
        if session.load_next().await? == LoadOutcome::Skipped {
            break;
        }
    }
    Ok(())
}

/// Print a snapshot the way the storefront result grid shows it.
pub fn render(ctx: &Context, snapshot: &SearchSnapshot) {
    let title = match snapshot.parameters.query.as_deref() {
        Some(q) => format!("Results for \"{}\"", q),
        None => "Results".to_string(),
    };
    ctx.output.header(&title);

    if let Some(total) = snapshot.total {
        ctx.output.kv("total", &total.to_string());
    }
    if let Some(remaining) = snapshot.remaining {
        ctx.output.kv("remaining", &remaining.to_string());
    }
    ctx.output.filters(&snapshot.filters);

    if snapshot.items.is_empty() && snapshot.errors.is_empty() {
        ctx.output.info("No products found");
    }

    let base = snapshot.loaded_offsets.first().copied().unwrap_or(0) as usize;
    for (index, item) in snapshot.items.iter().enumerate() {
        ctx.output.product(base + index, item);
    }

    for (offset, err) in &snapshot.errors {
        ctx.output
            .warn(&format!("Page at offset {} failed: {}", offset, err));
    }
    if snapshot.has_more {
        ctx.output.debug("more results available");
    }
}
