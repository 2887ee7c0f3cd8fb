use time::Date;

use crate::{
    collection::SeriesCollection,
    series::{Series, SeriesId},
};

/// Date format used when a template doesn't give one.
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";

/// Everything an expression is evaluated against: the configured date
/// range, the global date format and the collected series.
#[derive(Debug, Clone)]
pub struct RenderContext {
    start_date: Date,
    end_date: Date,
    date_format: String,
    collection: SeriesCollection,
}

impl RenderContext {
    /// The configured range defaults to the axis of `collection`.
    pub fn new(collection: SeriesCollection) -> Self {
        Self {
            start_date: collection.start_date(),
            end_date: collection.end_date(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            collection,
        }
    }

    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    pub fn with_date_range(mut self, start_date: Date, end_date: Date) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    pub fn start_date(&self) -> Date {
        self.start_date
    }

    pub fn end_date(&self) -> Date {
        self.end_date
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn collection(&self) -> &SeriesCollection {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut SeriesCollection {
        &mut self.collection
    }

    pub fn dataset(&self, id: SeriesId) -> Option<&Series> {
        self.collection.get(id)
    }

    /// Display name of the dataset with the given id.
    pub fn dataset_name(&self, id: SeriesId) -> Option<&str> {
        self.collection.get(id).map(Series::name)
    }
}
