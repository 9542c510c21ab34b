//! Inspect translated attributes in a JSON fixture.
//!
//! Usage:
//!   translatable-inspect <fixture.json> <attribute> [locale] [--fallback] [--translated-in <locales>]
//!
//! Optional environment variables:
//! - APP_LOCALE (defaults to en)
//! - APP_FALLBACK_LOCALE

use anyhow::{bail, Context, Result};
use helpermodel_translatable::config::Config;
use helpermodel_translatable::fixture;
use helpermodel_translatable::Translatable;
use tracing::info;

struct Args {
    fixture: String,
    attribute: String,
    locale: Option<String>,
    fallback: bool,
    translated_in: Option<Vec<String>>,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut fallback = false;
    let mut translated_in = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--fallback" => fallback = true,
            "--translated-in" => {
                let locales = args.next().context("--translated-in needs a value")?;
                translated_in = Some(locales.split(',').map(|l| l.trim().to_string()).collect());
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let (Some(fixture), Some(attribute)) = (positional.next(), positional.next()) else {
        bail!("Usage: translatable-inspect <fixture.json> <attribute> [locale] [--fallback] [--translated-in <locales>]");
    };

    Ok(Args {
        fixture,
        attribute,
        locale: positional.next(),
        fallback,
        translated_in,
    })
}

fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("helpermodel_translatable=info".parse()?),
        )
        .init();

    let args = parse_args()?;
    let config = Config::from_env()?;
    let ctx = config.locale_context();

    info!(
        "Resolving '{}' (active locale {}, fallback {:?})",
        args.attribute,
        ctx.locale(),
        ctx.fallback_locale()
    );

    let models = fixture::load_models(&args.fixture)?;
    let selected = match (&args.translated_in, models.first()) {
        (Some(locales), Some(first)) => first.query().translated_in(locales.clone()).get(&models),
        _ => models.iter().collect(),
    };

    for model in selected {
        let value = if model.is_translatable_attribute(&args.attribute) {
            model.translation(&ctx, &args.attribute, args.locale.as_deref(), args.fallback)
        } else {
            model.raw_attribute(&args.attribute)
        };

        let id = model
            .raw_attribute("id")
            .map(|id| id.to_string())
            .unwrap_or_else(|| "?".to_string());

        match value {
            Some(value) => println!("{}#{}\t{}", model.class_basename(), id, value),
            None => println!("{}#{}\t(empty)", model.class_basename(), id),
        }
    }

    Ok(())
}
