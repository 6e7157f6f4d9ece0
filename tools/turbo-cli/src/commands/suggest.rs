//! Search-as-you-type suggestions.

use anyhow::Result;
use turbo_search::SearchState;

use super::SuggestArgs;
use crate::context::Context;

/// Run the suggest command.
pub async fn run(args: SuggestArgs, ctx: &Context) -> Result<()> {
    let session = ctx.session(SearchState::default())?;

    let Some(suggestions) = session.suggest(&args.text).await? else {
        ctx.output.warn(&format!(
            "Suggestions start at {} characters",
            ctx.config.suggestion_min_chars
        ));
        if ctx.output.is_json() {
            ctx.output.json(&serde_json::Value::Null);
        }
        return Ok(());
    };

    if ctx.output.is_json() {
        ctx.output.json(&*suggestions);
        return Ok(());
    }

    if suggestions.is_empty() {
        ctx.output.info("No suggestions");
        return Ok(());
    }

    if !suggestions.phrases.is_empty() {
        ctx.output.header("Phrases");
        for phrase in &suggestions.phrases {
            let marker = if phrase.exact { " (exact)" } else { "" };
            ctx.output.list_item(&format!("{}{}", phrase.phrase, marker));
        }
    }
    if !suggestions.products.is_empty() {
        ctx.output.header("Products");
        for product in &suggestions.products {
            ctx.output.kv(product.id.as_str(), &product.name);
        }
    }
    if !suggestions.categories.is_empty() {
        ctx.output.header("Categories");
        for category in &suggestions.categories {
            ctx.output.kv(category.id.as_str(), &category.name);
        }
    }

    Ok(())
}
