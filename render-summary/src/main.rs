use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use tracker_expr::{format_date, resolve_template, resolve_value, Value};

mod input;

/// Render tracker summaries from collected data.
#[derive(Debug, Parser)]
#[command(name = "render-summary")]
struct Cli {
    /// JSON file holding the date range and the datasets.
    #[arg(short, long)]
    input: PathBuf,

    /// Text containing `{{expression::format}}` placeholders.
    #[arg(short, long, required_unless_present = "value", conflicts_with = "value")]
    template: Option<String>,

    /// Print the first value resolved from the given text instead.
    #[arg(long)]
    value: Option<String>,

    /// Override the date format of the input file.
    #[arg(long)]
    date_format: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let json = fs::read_to_string(&cli.input)
        .with_context(|| format!("could not read {}", cli.input.display()))?;
    let mut ctx = input::load(&json)?;
    if let Some(date_format) = cli.date_format {
        ctx = ctx.with_date_format(date_format);
    }
    log::info!(
        "loaded {} dataset(s) over {} days",
        ctx.collection().len(),
        ctx.collection().num_days()
    );

    if let Some(template) = cli.template {
        println!("{}", resolve_template(&template, &ctx)?);
    } else if let Some(text) = cli.value {
        match resolve_value(&text, &ctx)? {
            Value::Number(n) => println!("{n}"),
            Value::Date(date) => println!("{}", format_date(date, ctx.date_format())?),
            Value::Series(series) => println!("dataset '{}'", series.name()),
        }
    }

    Ok(())
}
