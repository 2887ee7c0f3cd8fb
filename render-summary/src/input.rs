use std::collections::BTreeMap;

use anyhow::{bail, Context};
use serde::Deserialize;
use time::{macros::format_description, Date};
use tracker_expr::{RenderContext, SeriesCollection, SeriesSpec};

/// Collected tracker data, as dumped by the note scanner.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryInput {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub date_format: Option<String>,
    #[serde(default)]
    pub series: Vec<SeriesInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesInput {
    #[serde(flatten)]
    pub spec: SeriesSpec,
    #[serde(default)]
    pub targets: u32,
    /// ISO date to value.
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}

fn parse_date(date: &str) -> anyhow::Result<Date> {
    Date::parse(date, format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("invalid date `{date}`, expected YYYY-MM-DD"))
}

impl SummaryInput {
    pub fn into_context(self) -> anyhow::Result<RenderContext> {
        let start = parse_date(&self.start_date)?;
        let end = parse_date(&self.end_date)?;
        let mut collection = SeriesCollection::new(start, end)?;

        for input in self.series {
            let name = input.spec.name.clone();
            let series = collection.create_series(input.spec)?;
            series.increment_targets(input.targets);
            for (date, value) in input.values {
                let date = parse_date(&date).with_context(|| format!("in dataset '{name}'"))?;
                if !series.set_value(date, value) {
                    log::warn!("dataset '{name}': {date} is outside of the date range, skipped");
                }
            }
        }

        let mut ctx = RenderContext::new(collection);
        if let Some(date_format) = self.date_format {
            ctx = ctx.with_date_format(date_format);
        }
        Ok(ctx)
    }
}

pub fn load(json: &str) -> anyhow::Result<RenderContext> {
    let input: SummaryInput = serde_json::from_str(json).context("malformed summary input")?;
    if input.series.iter().all(|series| series.spec.x_axis) {
        bail!("the input doesn't contain any dataset to summarize");
    }
    input.into_context()
}

#[cfg(test)]
mod test {
    use time::macros::date;
    use tracker_expr::{resolve_template, ValueType};

    use super::*;

    const INPUT: &str = r#"{
        "startDate": "2024-01-01",
        "endDate": "2024-01-05",
        "dateFormat": "DD/MM",
        "series": [
            { "id": 0, "name": "date", "xAxis": true },
            {
                "id": 1,
                "name": "pushups",
                "targets": 3,
                "values": { "2024-01-01": 10, "2024-01-02": 12, "2024-01-04": 15, "2024-02-01": 99 }
            },
            { "id": 2, "name": "bedtime", "valueType": "time", "values": {} }
        ]
    }"#;

    #[test]
    fn builds_the_context() {
        let ctx = load(INPUT).unwrap();
        assert_eq!(ctx.start_date(), date!(2024 - 01 - 01));
        assert_eq!(ctx.date_format(), "DD/MM");
        assert_eq!(ctx.collection().x_series_ids(), vec![0]);

        let pushups = ctx.dataset(1).unwrap();
        assert_eq!(pushups.values(), &[Some(10.0), Some(12.0), None, Some(15.0), None]);
        assert_eq!(pushups.num_targets(), 3);
        assert_eq!(ctx.dataset(2).unwrap().value_type(), ValueType::Time);
    }

    #[test]
    fn renders_a_summary() {
        let ctx = load(INPUT).unwrap();
        let text = "{{sum()::d}} pushups, best on {{maxDate()}}, {{numTargets()::d}} targets";
        assert_eq!(resolve_template(text, &ctx).unwrap(), "37 pushups, best on 04/01, 3 targets");
    }

    #[test]
    fn rejects_bad_input() {
        let json = r#"{ "startDate": "2024-01-01", "endDate": "2024-01-05", "series": [] }"#;
        assert!(load(json).is_err());

        let json = r#"{
            "startDate": "01/01/2024",
            "endDate": "2024-01-05",
            "series": [{ "id": 0, "name": "a" }]
        }"#;
        let error = load(json).unwrap_err();
        assert_eq!(error.to_string(), "invalid date `01/01/2024`, expected YYYY-MM-DD");
    }
}
