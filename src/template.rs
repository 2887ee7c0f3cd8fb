//! Substitution of `{{expression}}` and `{{expression::format}}`
//! placeholders inside free text.

use std::sync::OnceLock;

use regex::Regex;

use crate::{
    context::RenderContext,
    error::{Error, Result},
    eval::evaluate_str,
    format::{format_date, format_number},
    value::Value,
};

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(
            r"\{\{(?P<expr>[\w+\-*/\s()\[\]%.,]+)(?:::(?P<format>[\w+\-*/\s()\[\]%.,:]+))?\}\}",
        )
        .expect("placeholder pattern is valid")
    })
}

fn numeric_literal() -> &'static Regex {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    NUMERIC.get_or_init(|| {
        Regex::new(r"^(-?[0-9]+\.[0-9]+|-?[0-9]+)$").expect("numeric pattern is valid")
    })
}

/// A placeholder that evaluated to a number or a date.
#[derive(Debug, Clone, PartialEq)]
struct Resolved {
    source: String,
    value: Value,
    text: String,
}

/// Evaluate every distinct placeholder of `text`, in order of first
/// appearance. Placeholders evaluating to a dataset are left out.
fn resolve(text: &str, ctx: &RenderContext) -> Result<Vec<Resolved>> {
    let mut resolved: Vec<Resolved> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for captures in placeholder().captures_iter(text) {
        let (Some(source), Some(expr)) = (captures.get(0), captures.name("expr")) else {
            continue;
        };
        let source = source.as_str();
        if seen.contains(&source) {
            continue;
        }
        seen.push(source);

        let format = captures.name("format").map(|format| format.as_str());
        log::debug!("resolving placeholder {source}");
        let value = evaluate_str(expr.as_str(), ctx)?;
        let text = match &value {
            Value::Number(n) => match format {
                Some(format) => format_number(*n, format)?,
                None => format!("{n:.1}"),
            },
            Value::Date(date) => format_date(*date, format.unwrap_or(ctx.date_format()))?,
            Value::Series(series) => {
                log::warn!(
                    "placeholder {source} evaluates to dataset '{}', leaving it as is",
                    series.name()
                );
                continue;
            }
        };
        resolved.push(Resolved {
            source: source.to_string(),
            value,
            text,
        });
    }

    Ok(resolved)
}

/// Replace every placeholder of `text` by its formatted value.
///
/// ```
/// use tracker_expr::{resolve_template, RenderContext, SeriesCollection};
/// use time::macros::date;
///
/// let collection = SeriesCollection::new(date!(2024 - 01 - 01), date!(2024 - 01 - 31)).unwrap();
/// let ctx = RenderContext::new(collection);
/// assert_eq!(resolve_template("Total: {{2 + 3}}", &ctx).unwrap(), "Total: 5.0");
/// assert_eq!(resolve_template("Total: {{2 + 3::d}}", &ctx).unwrap(), "Total: 5");
/// ```
pub fn resolve_template(text: &str, ctx: &RenderContext) -> Result<String> {
    let mut output = text.to_string();
    for resolved in resolve(text, ctx)? {
        output = output.replace(&resolved.source, &resolved.text);
    }
    Ok(output)
}

/// The value of a bare number, or of the first placeholder of `text` that
/// resolves to a number or a date.
pub fn resolve_value(text: &str, ctx: &RenderContext) -> Result<Value> {
    let text = text.trim();
    if numeric_literal().is_match(text) {
        if let Ok(n) = text.parse() {
            return Ok(Value::Number(n));
        }
    }
    resolve(text, ctx)?
        .into_iter()
        .next()
        .map(|resolved| resolved.value)
        .ok_or(Error::Unresolved)
}
