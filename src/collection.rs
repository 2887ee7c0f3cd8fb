use std::{collections::BTreeMap, sync::Arc};

use time::Date;

use crate::{
    error::{Error, Reason, Result},
    series::{axis_index, Series, SeriesId, SeriesSpec},
};

/// Owner of the shared date axis and of the series built on it.
///
/// Series are kept ordered by ascending id, which is the order used
/// everywhere a collection is traversed.
#[derive(Debug, Clone)]
pub struct SeriesCollection {
    dates: Arc<[Date]>,
    series: BTreeMap<SeriesId, Series>,
}

impl SeriesCollection {
    /// Build the axis with one entry per day from `start` to `end`, both
    /// included.
    pub fn new(start: Date, end: Date) -> Result<Self> {
        if end < start {
            return Err(Error::DateRange {
                reason: Reason::Invalid,
            });
        }

        let mut dates = Vec::with_capacity((end - start).whole_days() as usize + 1);
        let mut current = Some(start);
        while let Some(date) = current.filter(|date| *date <= end) {
            dates.push(date);
            current = date.next_day();
        }

        Ok(Self {
            dates: dates.into(),
            series: BTreeMap::new(),
        })
    }

    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    pub fn start_date(&self) -> Date {
        self.dates[0]
    }

    pub fn end_date(&self) -> Date {
        self.dates[self.dates.len() - 1]
    }

    /// Number of days on the axis.
    pub fn num_days(&self) -> usize {
        self.dates.len()
    }

    pub fn index_of_date(&self, date: Date) -> Option<usize> {
        axis_index(&self.dates, date)
    }

    /// Add a new, empty series bound to this collection's axis.
    pub fn create_series(&mut self, spec: SeriesSpec) -> Result<&mut Series> {
        if self.series.contains_key(&spec.id) {
            return Err(Error::Dataset {
                id: spec.id.to_string(),
                reason: Reason::Duplicated,
            });
        }
        log::debug!("creating dataset {} '{}'", spec.id, spec.name);
        let id = spec.id;
        let series = Series::new(spec, self.dates.clone());
        Ok(self.series.entry(id).or_insert(series))
    }

    pub fn get(&self, id: SeriesId) -> Option<&Series> {
        self.series.get(&id)
    }

    pub fn get_mut(&mut self, id: SeriesId) -> Option<&mut Series> {
        self.series.get_mut(&id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Series> {
        self.series.values().find(|series| series.name() == name)
    }

    /// Every series, by ascending id.
    pub fn iter(&self) -> impl Iterator<Item = &Series> + '_ {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn x_series_ids(&self) -> Vec<SeriesId> {
        self.iter()
            .filter(|series| series.is_x_axis())
            .map(Series::id)
            .collect()
    }

    /// The series used when an aggregate function is called without
    /// argument: the lowest id that is not used as the X axis.
    pub fn default_series(&self) -> Option<&Series> {
        self.iter().find(|series| !series.is_x_axis())
    }
}
