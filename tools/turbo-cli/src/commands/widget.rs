//! Preview of the home-screen recommendation widget.

use anyhow::Result;
use chrono::Utc;
use turbo_widget::{
    build_timeline, load_recommendations, FileSource, HttpImageLoader, RefreshPolicy,
};

use super::WidgetArgs;
use crate::context::Context;

/// Run the widget command.
pub async fn run(args: WidgetArgs, ctx: &Context) -> Result<()> {
    let source = FileSource::new(ctx.cwd.join(&args.file));
    let recs = load_recommendations(&source);
    ctx.output.debug(&format!("{} recommendation(s) loaded", recs.len()));

    let loader = HttpImageLoader::default();
    let spinner = ctx.output.spinner("Downloading images...");
    let timeline = build_timeline(Utc::now(), recs, &loader).await;
    spinner.finish_and_clear();

    ctx.output.header("Widget timeline");
    for entry in &timeline.entries {
        let when = entry.date.format("%H:%M:%S").to_string();
        match &entry.recommendation {
            Some(rec) => {
                let image = match &entry.image {
                    Some(bytes) => format!("{} bytes", bytes.len()),
                    None => "no image".to_string(),
                };
                ctx.output.kv(&when, &format!("{} ({})", rec.product_name, image));
                ctx.output.list_item(&rec.deep_link(&args.scheme));
            }
            None => ctx.output.kv(&when, "No recommendations yet"),
        }
    }

    match timeline.policy {
        RefreshPolicy::AtEnd => ctx.output.info("Refresh after the last entry"),
        RefreshPolicy::After(at) => {
            ctx.output.info(&format!("Refresh at {}", at.format("%H:%M:%S")))
        }
    }

    Ok(())
}
