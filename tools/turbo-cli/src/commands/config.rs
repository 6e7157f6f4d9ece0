//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use turbo_search::config::generate_default_config;

use super::{ConfigArgs, ConfigCommand};
use crate::context::{Context, CONFIG_NAMES};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        let mut config = ctx.config.clone();
        if config.backend.access_token.is_some() {
            config.backend.access_token = Some("********".to_string());
        }
        ctx.output.json(&config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let config = &ctx.config;
    ctx.output.info("[backend]");
    ctx.output.kv("base_url", &config.backend.base_url);
    ctx.output.kv("organization_id", &config.backend.organization_id);
    ctx.output.kv("site_id", &config.backend.site_id);
    if config.backend.access_token.is_some() {
        ctx.output.kv("access_token", "********");
    }

    ctx.output.info("[search]");
    ctx.output.kv("locale", &config.locale);
    ctx.output.kv("currency", &config.currency);
    ctx.output.kv("page_size", &config.page_size.to_string());
    ctx.output.kv("suggestion_min_chars", &config.suggestion_min_chars.to_string());
    ctx.output.kv("suggestion_limit", &config.suggestion_limit.to_string());
    ctx.output.kv("timeout_ms", &config.timeout_ms.to_string());
    ctx.output.kv("expand", &config.request.expand.join(", "));

    ctx.output.info("[retry]");
    ctx.output.kv("max_attempts", &config.retry.max_attempts.to_string());
    ctx.output.kv("backoff_base_ms", &config.retry.backoff_base_ms.to_string());
    ctx.output.kv("backoff_max_ms", &config.retry.backoff_max_ms.to_string());

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;
    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    if let Err(e) = ctx.config.validate() {
        ctx.output.error(&format!("Error: {}", e));
        bail!("Configuration is invalid");
    }

    if ctx.config.backend.access_token.is_none() {
        ctx.output
            .warn("Warning: no access token; requests will be sent unauthenticated");
    }
    ctx.output.success("Configuration is valid");

    Ok(())
}
