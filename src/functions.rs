//! Named functions callable from expressions.
//!
//! Two registries live side by side: functions reducing a dataset to a
//! value (`max`, `currentStreak`, `endDate`, ...) and functions
//! transforming a dataset into another one (`normalize`,
//! `setMissingValues`).

use std::{collections::HashMap, fmt, sync::OnceLock};

use statrs::statistics::Statistics;
use time::Date;

use crate::{
    context::RenderContext,
    error::{Error, Reason, Result},
    series::Series,
    value::Value,
};

/// Reduce a dataset to a number, a date or another dataset.
pub type ValueFn = fn(&Series, &RenderContext) -> Result<Value>;

/// Build a new dataset from a dataset and extra arguments.
pub type TransformFn = fn(&Series, &[Value], &RenderContext) -> Result<Series>;

#[derive(Default, Clone)]
pub struct FunctionRegistry {
    value_fns: HashMap<&'static str, ValueFn>,
    transform_fns: HashMap<&'static str, TransformFn>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value_fns: Vec<_> = self.value_fns.keys().collect();
        value_fns.sort();
        let mut transform_fns: Vec<_> = self.transform_fns.keys().collect();
        transform_fns.sort();
        f.debug_struct("FunctionRegistry")
            .field("value_fns", &value_fns)
            .field("transform_fns", &transform_fns)
            .finish()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in function.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register_value("min", min);
        registry.register_value("minDate", min_date);
        registry.register_value("max", max);
        registry.register_value("maxDate", max_date);
        registry.register_value("startDate", start_date);
        registry.register_value("endDate", end_date);
        registry.register_value("sum", sum);
        registry.register_value("numTargets", num_targets);
        registry.register_value("numDays", num_days);
        registry.register_value("numDaysHavingData", num_days_having_data);
        registry.register_value("maxStreak", max_streak);
        registry.register_value("maxStreakStart", max_streak_start);
        registry.register_value("maxStreakEnd", max_streak_end);
        registry.register_value("maxBreaks", max_breaks);
        registry.register_value("maxBreaksStart", max_breaks_start);
        registry.register_value("maxBreaksEnd", max_breaks_end);
        registry.register_value("currentStreak", current_streak);
        registry.register_value("currentStreakStart", current_streak_start);
        registry.register_value("currentStreakEnd", current_streak_end);
        registry.register_value("currentBreaks", current_breaks);
        registry.register_value("currentBreaksStart", current_breaks_start);
        registry.register_value("currentBreaksEnd", current_breaks_end);
        registry.register_value("average", average);
        registry.register_value("median", median);
        registry.register_value("variance", variance);

        registry.register_value("count", |_, _| deprecated("count"));
        registry.register_value("days", |_, _| deprecated("days"));
        registry.register_value("lastStreak", |_, _| deprecated("lastStreak"));

        registry.register_transform("normalize", normalize);
        registry.register_transform("setMissingValues", set_missing_values);

        registry
    }

    /// The shared registry of built-in functions.
    pub fn builtins() -> &'static FunctionRegistry {
        static BUILTINS: OnceLock<FunctionRegistry> = OnceLock::new();
        BUILTINS.get_or_init(FunctionRegistry::with_builtins)
    }

    pub fn register_value(&mut self, name: &'static str, function: ValueFn) {
        self.value_fns.insert(name, function);
    }

    pub fn register_transform(&mut self, name: &'static str, function: TransformFn) {
        self.transform_fns.insert(name, function);
    }

    pub fn value_fn(&self, name: &str) -> Option<ValueFn> {
        self.value_fns.get(name).copied()
    }

    pub fn transform_fn(&self, name: &str) -> Option<TransformFn> {
        self.transform_fns.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.value_fns.contains_key(name) || self.transform_fns.contains_key(name)
    }
}

/// Renamed functions, with the name to use instead.
const DEPRECATED: &[(&str, &str)] = &[
    ("count", "numTargets"),
    ("days", "numDays"),
    ("lastStreak", "currentStreak"),
];

/// The function replacing the deprecated function `name`.
pub(crate) fn replacement_of(name: &str) -> Option<&'static str> {
    DEPRECATED
        .iter()
        .find(|(deprecated, _)| *deprecated == name)
        .map(|(_, replacement)| *replacement)
}

fn deprecated(name: &'static str) -> Result<Value> {
    log::warn!("call to deprecated function '{name}'");
    Err(Error::Deprecated {
        name: name.to_string(),
        replacement: replacement_of(name).unwrap_or(name),
    })
}

/// Values of the days holding data, failing when there is none.
fn data(series: &Series, name: &str) -> Result<Vec<f64>> {
    let values: Vec<f64> = series.values().iter().flatten().copied().collect();
    if values.is_empty() {
        return Err(Error::Function {
            name: name.to_string(),
            reason: Reason::NoData,
        });
    }
    Ok(values)
}

fn extremum(series: &Series, name: &str, pick: fn(f64, f64) -> f64) -> Result<f64> {
    let values = data(series, name)?;
    Ok(values[1..].iter().fold(values[0], |acc, &v| pick(acc, v)))
}

/// The latest date holding `target`.
fn latest_date_of(series: &Series, target: f64) -> Option<Date> {
    series
        .iter()
        .rev()
        .find(|point| point.value == Some(target))
        .map(|point| point.date)
}

fn min(series: &Series, _: &RenderContext) -> Result<Value> {
    extremum(series, "min", f64::min).map(Value::Number)
}

fn min_date(series: &Series, _: &RenderContext) -> Result<Value> {
    let min = extremum(series, "minDate", f64::min)?;
    latest_date_of(series, min)
        .map(Value::Date)
        .ok_or_else(|| Error::Function {
            name: "minDate".to_string(),
            reason: Reason::NoData,
        })
}

fn max(series: &Series, _: &RenderContext) -> Result<Value> {
    extremum(series, "max", f64::max).map(Value::Number)
}

fn max_date(series: &Series, _: &RenderContext) -> Result<Value> {
    let max = extremum(series, "maxDate", f64::max)?;
    latest_date_of(series, max)
        .map(Value::Date)
        .ok_or_else(|| Error::Function {
            name: "maxDate".to_string(),
            reason: Reason::NoData,
        })
}

fn start_date(series: &Series, ctx: &RenderContext) -> Result<Value> {
    Ok(Value::Date(series.start_date().unwrap_or(ctx.start_date())))
}

fn end_date(series: &Series, ctx: &RenderContext) -> Result<Value> {
    Ok(Value::Date(series.end_date().unwrap_or(ctx.end_date())))
}

fn sum(series: &Series, _: &RenderContext) -> Result<Value> {
    Ok(Value::Number(series.values().iter().flatten().sum()))
}

fn num_targets(series: &Series, _: &RenderContext) -> Result<Value> {
    Ok(Value::Number(series.num_targets() as f64))
}

fn num_days(series: &Series, _: &RenderContext) -> Result<Value> {
    Ok(Value::Number(series.len() as f64))
}

fn num_days_having_data(series: &Series, _: &RenderContext) -> Result<Value> {
    Ok(Value::Number(series.len_not_null() as f64))
}

/// A maximal run of days that all hold data (a streak) or that all miss
/// data (a break). Indices are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    start: usize,
    end: usize,
}

impl Run {
    fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

fn runs(series: &Series, with_data: bool) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for (index, value) in series.values().iter().enumerate() {
        if value.is_some() != with_data {
            continue;
        }
        match runs.last_mut() {
            Some(run) if run.end + 1 == index => run.end = index,
            _ => runs.push(Run {
                start: index,
                end: index,
            }),
        }
    }
    runs
}

/// Among streaks of equal length the latest one wins.
fn longest_streak(series: &Series) -> Option<Run> {
    runs(series, true)
        .into_iter()
        .fold(None, |best: Option<Run>, run| match best {
            Some(best) if run.len() < best.len() => Some(best),
            _ => Some(run),
        })
}

/// Among breaks of equal length the earliest one wins.
fn longest_break(series: &Series) -> Option<Run> {
    runs(series, false)
        .into_iter()
        .fold(None, |best: Option<Run>, run| match best {
            Some(best) if run.len() <= best.len() => Some(best),
            _ => Some(run),
        })
}

/// Number of days at the end of the series that hold data (or miss it).
fn trailing(series: &Series, with_data: bool) -> usize {
    series
        .values()
        .iter()
        .rev()
        .take_while(|value| value.is_some() == with_data)
        .count()
}

fn streak_error(run: &'static str) -> Error {
    Error::Streak {
        run,
        reason: Reason::NotFound,
    }
}

fn break_error(run: &'static str) -> Error {
    Error::BrokenStreak {
        run,
        reason: Reason::NotFound,
    }
}

fn max_streak(series: &Series, _: &RenderContext) -> Result<Value> {
    let len = longest_streak(series).map_or(0, |run| run.len());
    Ok(Value::Number(len as f64))
}

fn max_streak_start(series: &Series, _: &RenderContext) -> Result<Value> {
    let run = longest_streak(series).ok_or_else(|| streak_error("Longest streak"))?;
    Ok(Value::Date(series.dates()[run.start]))
}

fn max_streak_end(series: &Series, _: &RenderContext) -> Result<Value> {
    let run = longest_streak(series).ok_or_else(|| streak_error("Longest streak"))?;
    Ok(Value::Date(series.dates()[run.end]))
}

fn max_breaks(series: &Series, _: &RenderContext) -> Result<Value> {
    let len = longest_break(series).map_or(0, |run| run.len());
    Ok(Value::Number(len as f64))
}

fn max_breaks_start(series: &Series, _: &RenderContext) -> Result<Value> {
    let run = longest_break(series).ok_or_else(|| break_error("Longest break"))?;
    Ok(Value::Date(series.dates()[run.start]))
}

fn max_breaks_end(series: &Series, _: &RenderContext) -> Result<Value> {
    let run = longest_break(series).ok_or_else(|| break_error("Longest break"))?;
    Ok(Value::Date(series.dates()[run.end]))
}

fn current_streak(series: &Series, _: &RenderContext) -> Result<Value> {
    if series.len_not_null() == 0 {
        return Err(streak_error("Streak"));
    }
    Ok(Value::Number(trailing(series, true) as f64))
}

fn current_streak_start(series: &Series, _: &RenderContext) -> Result<Value> {
    match trailing(series, true) {
        0 => Err(streak_error("Current streak")),
        len => Ok(Value::Date(series.dates()[series.len() - len])),
    }
}

fn current_streak_end(series: &Series, _: &RenderContext) -> Result<Value> {
    match trailing(series, true) {
        0 => Err(streak_error("Current streak")),
        _ => Ok(Value::Date(series.dates()[series.len() - 1])),
    }
}

fn current_breaks(series: &Series, _: &RenderContext) -> Result<Value> {
    Ok(Value::Number(trailing(series, false) as f64))
}

fn current_breaks_start(series: &Series, _: &RenderContext) -> Result<Value> {
    match trailing(series, false) {
        0 => Err(break_error("Current break")),
        len => Ok(Value::Date(series.dates()[series.len() - len])),
    }
}

fn current_breaks_end(series: &Series, _: &RenderContext) -> Result<Value> {
    match trailing(series, false) {
        0 => Err(break_error("Current break")),
        _ => Ok(Value::Date(series.dates()[series.len() - 1])),
    }
}

fn average(series: &Series, _: &RenderContext) -> Result<Value> {
    let values: Vec<f64> = series.values().iter().flatten().copied().collect();
    if values.is_empty() {
        return Err(Error::DivisionByZero);
    }
    Ok(Value::Number(Statistics::mean(values.iter())))
}

/// Middle value, or the mean of the two middle values.
fn median(series: &Series, _: &RenderContext) -> Result<Value> {
    let mut values = data(series, "median")?;
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    let median = if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    };
    Ok(Value::Number(median))
}

/// Sample variance, which needs at least two days of data.
fn variance(series: &Series, _: &RenderContext) -> Result<Value> {
    let values = data(series, "variance")?;
    if values.len() < 2 {
        return Err(Error::Function {
            name: "variance".to_string(),
            reason: Reason::NotEnoughData,
        });
    }
    Ok(Value::Number(Statistics::variance(values.iter())))
}

/// Rescale the values into `[0, 1]`.
fn normalize(series: &Series, _: &[Value], _: &RenderContext) -> Result<Series> {
    match (series.y_min(), series.y_max()) {
        (Some(y_min), Some(y_max)) if y_max > y_min => {
            Ok(series.map_values(|v| (v - y_min) / (y_max - y_min)))
        }
        _ => Err(Error::Function {
            name: "normalize".to_string(),
            reason: Reason::InvalidRange,
        }),
    }
}

/// Give every day without data the value passed as first argument.
fn set_missing_values(series: &Series, args: &[Value], _: &RenderContext) -> Result<Series> {
    match args.first() {
        Some(Value::Number(fill)) if !fill.is_nan() => Ok(series.fill_missing(*fill)),
        Some(_) => Err(Error::ArgumentType {
            name: "setMissingValues".to_string(),
            expected: "a number as missing value",
        }),
        None => Err(Error::Argument {
            name: "setMissingValues".to_string(),
            reason: Reason::Missing,
        }),
    }
}

#[cfg(test)]
mod test {
    use time::macros::date;

    use super::*;
    use crate::{collection::SeriesCollection, series::test::series_of};

    fn ctx() -> RenderContext {
        let collection =
            SeriesCollection::new(date!(2023 - 12 - 01), date!(2024 - 02 - 01)).unwrap();
        RenderContext::new(collection)
    }

    fn call(name: &str, values: &[Option<f64>]) -> Result<Value> {
        let function = FunctionRegistry::builtins().value_fn(name).unwrap();
        function(&series_of(values), &ctx())
    }

    fn number(name: &str, values: &[Option<f64>]) -> f64 {
        call(name, values).unwrap().as_number().unwrap()
    }

    fn date(name: &str, values: &[Option<f64>]) -> Date {
        call(name, values).unwrap().as_date().unwrap()
    }

    const STREAKS: &[Option<f64>] =
        &[Some(1.0), Some(2.0), None, Some(3.0), Some(4.0), Some(5.0), None];

    #[test]
    fn extrema() {
        let values = &[Some(3.0), None, Some(-1.0), Some(7.0)];
        assert_eq!(number("min", values), -1.0);
        assert_eq!(number("max", values), 7.0);
        assert_eq!(date("minDate", values), date!(2024 - 01 - 03));
        assert_eq!(date("maxDate", values), date!(2024 - 01 - 04));

        let error = call("min", &[None, None]).unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"Function 'min' has no data");
    }

    #[test]
    fn extremum_date_prefers_the_latest_day() {
        let values = &[Some(5.0), Some(5.0), Some(3.0)];
        assert_eq!(date("maxDate", values), date!(2024 - 01 - 02));

        let values = &[Some(1.0), Some(4.0), Some(1.0), None];
        assert_eq!(date("minDate", values), date!(2024 - 01 - 03));
    }

    #[test]
    fn range_falls_back_to_the_context() {
        assert_eq!(date("startDate", &[None, Some(1.0), Some(2.0), None]), date!(2024 - 01 - 02));
        assert_eq!(date("endDate", &[None, Some(1.0), Some(2.0), None]), date!(2024 - 01 - 03));
        assert_eq!(date("startDate", &[None, None]), date!(2023 - 12 - 01));
        assert_eq!(date("endDate", &[None, None]), date!(2024 - 02 - 01));
    }

    #[test]
    fn totals() {
        let values = &[Some(1.5), None, Some(2.5), None];
        assert_eq!(number("sum", values), 4.0);
        assert_eq!(number("sum", &[None]), 0.0);
        assert_eq!(number("numDays", values), 4.0);
        assert_eq!(number("numDaysHavingData", values), 2.0);
        assert_eq!(number("numTargets", values), 0.0);

        let mut series = series_of(values);
        series.increment_targets(3);
        let ret = num_targets(&series, &ctx()).unwrap();
        assert_eq!(ret, Value::Number(3.0));
    }

    #[test]
    fn streaks() {
        assert_eq!(number("maxStreak", STREAKS), 3.0);
        assert_eq!(date("maxStreakStart", STREAKS), date!(2024 - 01 - 04));
        assert_eq!(date("maxStreakEnd", STREAKS), date!(2024 - 01 - 06));
        assert_eq!(number("currentStreak", STREAKS), 0.0);
        assert_eq!(number("currentBreaks", STREAKS), 1.0);
        assert_eq!(date("currentBreaksStart", STREAKS), date!(2024 - 01 - 07));
        assert_eq!(date("currentBreaksEnd", STREAKS), date!(2024 - 01 - 07));

        let error = call("currentStreakStart", STREAKS).unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"Current streak not found");
        assert!(matches!(call("currentStreakEnd", STREAKS), Err(Error::Streak { .. })));
    }

    #[test]
    fn trailing_streak() {
        let values = &[None, Some(1.0), None, Some(2.0), Some(3.0)];
        assert_eq!(number("currentStreak", values), 2.0);
        assert_eq!(date("currentStreakStart", values), date!(2024 - 01 - 04));
        assert_eq!(date("currentStreakEnd", values), date!(2024 - 01 - 05));
        assert_eq!(number("currentBreaks", values), 0.0);

        let error = call("currentBreaksStart", values).unwrap_err();
        assert!(matches!(error, Error::BrokenStreak { .. }));
        insta::assert_snapshot!(error.to_string(), @"Current break not found");

        let values = &[Some(1.0), Some(1.0)];
        assert_eq!(date("currentStreakStart", values), date!(2024 - 01 - 01));
    }

    #[test]
    fn current_streak_without_any_data() {
        let error = call("currentStreak", &[None, None]).unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"Streak not found");
    }

    #[test]
    fn streak_ties_keep_the_latest() {
        let values = &[Some(1.0), Some(1.0), None, Some(1.0), Some(1.0), None];
        assert_eq!(number("maxStreak", values), 2.0);
        assert_eq!(date("maxStreakStart", values), date!(2024 - 01 - 04));
        assert_eq!(date("maxStreakEnd", values), date!(2024 - 01 - 05));
    }

    #[test]
    fn break_ties_keep_the_earliest() {
        let values = &[None, None, Some(1.0), None, None, Some(1.0)];
        assert_eq!(number("maxBreaks", values), 2.0);
        assert_eq!(date("maxBreaksStart", values), date!(2024 - 01 - 01));
        assert_eq!(date("maxBreaksEnd", values), date!(2024 - 01 - 02));
    }

    #[test]
    fn no_runs() {
        assert_eq!(number("maxStreak", &[None, None]), 0.0);
        assert_eq!(number("maxBreaks", &[Some(1.0)]), 0.0);
        let error = call("maxStreakStart", &[None, None]).unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"Longest streak not found");
        let error = call("maxBreaksEnd", &[Some(1.0)]).unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"Longest break not found");
    }

    #[test]
    fn statistics() {
        assert_eq!(number("average", &[Some(2.0), None, Some(4.0), Some(6.0)]), 4.0);
        assert!(matches!(call("average", &[None, None]), Err(Error::DivisionByZero)));

        assert_eq!(number("median", &[Some(5.0), None, Some(1.0), Some(3.0)]), 3.0);
        assert_eq!(number("median", &[Some(4.0), Some(1.0), Some(3.0), Some(2.0)]), 2.5);

        assert_eq!(number("variance", &[Some(2.0), None, Some(4.0), Some(6.0)]), 4.0);
        let error = call("variance", &[Some(2.0), None]).unwrap_err();
        insta::assert_snapshot!(
            error.to_string(),
            @"Function 'variance' does not have enough data"
        );
    }

    #[test]
    fn deprecated_functions() {
        let error = call("days", STREAKS).unwrap_err();
        insta::assert_snapshot!(
            error.to_string(),
            @"Function 'days' is deprecated, use 'numDays()' instead"
        );
        assert!(matches!(
            call("count", STREAKS),
            Err(Error::Deprecated { replacement: "numTargets", .. })
        ));
        assert!(matches!(
            call("lastStreak", STREAKS),
            Err(Error::Deprecated { replacement: "currentStreak", .. })
        ));
    }

    #[test]
    fn normalize_bounds() {
        let series = series_of(&[Some(2.0), None, Some(6.0), Some(3.0)]);
        let normalized = normalize(&series, &[], &ctx()).unwrap();
        assert_eq!(normalized.values(), &[Some(0.0), None, Some(1.0), Some(0.25)]);
        assert_eq!(normalized.y_min(), Some(0.0));
        assert_eq!(normalized.y_max(), Some(1.0));

        let flat = series_of(&[Some(2.0), Some(2.0)]);
        let error = normalize(&flat, &[], &ctx()).unwrap_err();
        insta::assert_snapshot!(
            error.to_string(),
            @"Function 'normalize' has an invalid data range"
        );
    }

    #[test]
    fn missing_values() {
        let series = series_of(&[None, Some(6.0), None]);
        let filled = set_missing_values(&series, &[Value::Number(-1.0)], &ctx()).unwrap();
        assert_eq!(filled.values(), &[Some(-1.0), Some(6.0), Some(-1.0)]);
        assert_eq!(filled.y_min(), Some(-1.0));
        assert_eq!(series.values(), &[None, Some(6.0), None]);

        let error =
            set_missing_values(&series, &[Value::Date(date!(2024 - 01 - 01))], &ctx()).unwrap_err();
        insta::assert_snapshot!(
            error.to_string(),
            @"Function 'setMissingValues' only accepts a number as missing value"
        );
        assert!(matches!(
            set_missing_values(&series, &[], &ctx()),
            Err(Error::Argument { reason: Reason::Missing, .. })
        ));
    }

    #[test]
    fn registry_lookup() {
        let registry = FunctionRegistry::builtins();
        assert!(registry.value_fn("maxStreak").is_some());
        assert!(registry.transform_fn("maxStreak").is_none());
        assert!(registry.transform_fn("normalize").is_some());
        assert!(registry.contains("setMissingValues"));
        assert!(!registry.contains("dataset"));
    }
}
