//! Date-indexed numeric series.
//!
//! A [`Series`] holds one nullable value per date of the axis shared with
//! its [`crate::SeriesCollection`]. `None` means "no data for that day" and
//! is kept as such by every elementwise operation.

use std::{iter::Zip, slice, sync::Arc};

use serde::Deserialize;
use time::Date;

pub type SeriesId = usize;

/// How the numbers of a series should be read.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    #[default]
    Number,
    /// Time of day, stored as seconds since midnight.
    Time,
}

/// Everything needed to create a series inside a collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSpec {
    pub id: SeriesId,
    pub name: String,
    /// The series supplies the horizontal axis instead of plotted values.
    #[serde(default)]
    pub x_axis: bool,
    #[serde(default)]
    pub value_type: ValueType,
}

impl SeriesSpec {
    pub fn new(id: SeriesId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            x_axis: false,
            value_type: ValueType::Number,
        }
    }

    pub fn x_axis(mut self, x_axis: bool) -> Self {
        self.x_axis = x_axis;
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }
}

/// Position of `date` on an axis of consecutive days.
pub(crate) fn axis_index(dates: &[Date], date: Date) -> Option<usize> {
    let first = *dates.first()?;
    let offset = usize::try_from((date - first).whole_days()).ok()?;
    (offset < dates.len()).then_some(offset)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub date: Date,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    id: SeriesId,
    name: String,
    x_axis: bool,
    value_type: ValueType,
    dates: Arc<[Date]>,
    values: Vec<Option<f64>>,
    y_min: Option<f64>,
    y_max: Option<f64>,
    start_date: Option<Date>,
    end_date: Option<Date>,
    num_targets: u32,
}

impl Series {
    pub(crate) fn new(spec: SeriesSpec, dates: Arc<[Date]>) -> Self {
        Self {
            id: spec.id,
            name: spec.name,
            x_axis: spec.x_axis,
            value_type: spec.value_type,
            values: vec![None; dates.len()],
            dates,
            y_min: None,
            y_max: None,
            start_date: None,
            end_date: None,
            num_targets: 0,
        }
    }

    pub fn id(&self) -> SeriesId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn is_x_axis(&self) -> bool {
        self.x_axis
    }

    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of days holding a value.
    pub fn len_not_null(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn y_min(&self) -> Option<f64> {
        self.y_min
    }

    pub fn y_max(&self) -> Option<f64> {
        self.y_max
    }

    /// First date holding a value.
    pub fn start_date(&self) -> Option<Date> {
        self.start_date
    }

    /// Last date holding a value.
    pub fn end_date(&self) -> Option<Date> {
        self.end_date
    }

    pub fn num_targets(&self) -> u32 {
        self.num_targets
    }

    pub fn increment_targets(&mut self, n: u32) {
        self.num_targets += n;
    }

    /// Value at `date` shifted by `day_shift` days.
    pub fn value(&self, date: Date, day_shift: i64) -> Option<f64> {
        let first = *self.dates.first()?;
        let offset = (date - first).whole_days().checked_add(day_shift)?;
        let index = usize::try_from(offset).ok()?;
        self.values.get(index).copied().flatten()
    }

    /// Store `value` at `date`. Returns `false` when the date is not on the
    /// axis, in which case nothing changes.
    pub fn set_value(&mut self, date: Date, value: f64) -> bool {
        let Some(index) = axis_index(&self.dates, date) else {
            log::trace!("{} is outside of the axis of dataset '{}'", date, self.name);
            return false;
        };
        self.values[index] = Some(value);

        self.y_min = Some(self.y_min.map_or(value, |min| min.min(value)));
        self.y_max = Some(self.y_max.map_or(value, |max| max.max(value)));
        if self.start_date.map_or(true, |start| date < start) {
            self.start_date = Some(date);
        }
        if self.end_date.map_or(true, |end| date > end) {
            self.end_date = Some(date);
        }
        true
    }

    /// Recompute `y_min`/`y_max` over the days holding a value.
    pub fn recalculate_min_max(&mut self) {
        let (min, max) = self
            .values
            .iter()
            .flatten()
            .fold((None, None), |(min, max): (Option<f64>, Option<f64>), &v| {
                (
                    Some(min.map_or(v, |m| m.min(v))),
                    Some(max.map_or(v, |m| m.max(v))),
                )
            });
        self.y_min = min;
        self.y_max = max;
    }

    /// Recompute `start_date`/`end_date` over the days holding a value.
    fn recalculate_date_range(&mut self) {
        let start = self.iter().find(|point| point.value.is_some());
        let end = self.iter().rev().find(|point| point.value.is_some());
        self.start_date = start.map(|point| point.date);
        self.end_date = end.map(|point| point.date);
    }

    /// Replace every value by the running total. Days without data carry
    /// the total forward.
    pub fn accumulate_values(&mut self) {
        let mut total = 0.0;
        for value in self.values.iter_mut() {
            total += value.unwrap_or(0.0);
            *value = Some(total);
        }
        self.recalculate_min_max();
        self.recalculate_date_range();
    }

    /// Add `amount` to every value, or only to those `>= larger_than`.
    pub fn shift_values(&mut self, amount: f64, larger_than: Option<f64>) {
        let mut any_shifted = false;
        for value in self.values.iter_mut().flatten() {
            if larger_than.map_or(true, |threshold| *value >= threshold) {
                *value += amount;
                any_shifted = true;
            }
        }
        if any_shifted {
            self.recalculate_min_max();
        }
    }

    /// Give every day without data the `penalty` value.
    pub fn set_penalty(&mut self, penalty: f64) {
        for value in self.values.iter_mut().filter(|v| v.is_none()) {
            *value = Some(penalty);
        }
        self.recalculate_min_max();
        self.recalculate_date_range();
    }

    /// A fresh iterator over the points of the series, in date order.
    pub fn iter(&self) -> Points<'_> {
        Points {
            inner: self.dates.iter().zip(self.values.iter()),
        }
    }

    /// Clone the series and apply `f` to every value, keeping missing days
    /// missing.
    pub(crate) fn map_values(&self, mut f: impl FnMut(f64) -> f64) -> Series {
        let mut series = self.clone();
        for value in series.values.iter_mut().flatten() {
            *value = f(*value);
        }
        series.recalculate_min_max();
        series
    }

    /// Clone the series and combine it day by day with `other`. A day is
    /// missing in the result when it is missing on either side.
    pub(crate) fn zip_values(&self, other: &Series, mut f: impl FnMut(f64, f64) -> f64) -> Series {
        let mut series = self.clone();
        for (index, value) in series.values.iter_mut().enumerate() {
            *value = match (*value, other.values.get(index).copied().flatten()) {
                (Some(left), Some(right)) => Some(f(left, right)),
                _ => None,
            };
        }
        series.recalculate_min_max();
        series.recalculate_date_range();
        series
    }

    /// Clone the series, giving `fill` to every day without data.
    pub(crate) fn fill_missing(&self, fill: f64) -> Series {
        let mut series = self.clone();
        series.set_penalty(fill);
        series
    }
}

/// Iterator over the [`DataPoint`]s of a [`Series`].
///
/// Each call to [`Series::iter`] gets its own cursor, so nested traversals
/// of the same series never interfere.
#[derive(Debug, Clone)]
pub struct Points<'a> {
    inner: Zip<slice::Iter<'a, Date>, slice::Iter<'a, Option<f64>>>,
}

impl Iterator for Points<'_> {
    type Item = DataPoint;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(date, value)| DataPoint { date: *date, value: *value })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Points<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner
            .next_back()
            .map(|(date, value)| DataPoint { date: *date, value: *value })
    }
}

impl ExactSizeIterator for Points<'_> {}

impl<'a> IntoIterator for &'a Series {
    type Item = DataPoint;
    type IntoIter = Points<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
