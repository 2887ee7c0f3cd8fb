use std::fmt;

use time::{macros::format_description, Date};

use crate::series::Series;

/// A value flowing through expression evaluation.
///
/// Failures are never values: they travel as [`crate::Error`] through
/// `Result`, so a failure can't be mistaken for a legitimate result.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Date(Date),
    Series(Series),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Date,
    Series,
}

impl ValueKind {
    pub fn short_name(&self) -> &'static str {
        match self {
            ValueKind::Number => "number",
            ValueKind::Date => "date",
            ValueKind::Series => "dataset",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Number(_) => ValueKind::Number,
            Value::Date(_) => ValueKind::Date,
            Value::Series(_) => ValueKind::Series,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<Date> {
        match self {
            Value::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Value::Series(series) => Some(series),
            _ => None,
        }
    }

    pub fn into_series(self) -> Option<Series> {
        match self {
            Value::Series(series) => Some(series),
            _ => None,
        }
    }

    /// Numbers and dates can be written into text, datasets can't.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Number(_) | Value::Date(_))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<Date> for Value {
    fn from(date: Date) -> Self {
        Value::Date(date)
    }
}

impl From<Series> for Value {
    fn from(series: Series) -> Self {
        Value::Series(series)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Date(date) => {
                let date = date
                    .format(format_description!("[year]-[month]-[day]"))
                    .map_err(|_| fmt::Error)?;
                f.write_str(&date)
            }
            Value::Series(series) => write!(f, "dataset '{}'", series.name()),
        }
    }
}

#[cfg(test)]
mod test {
    use time::macros::date;

    use super::*;

    #[test]
    fn display() {
        assert_eq!(Value::Number(4.5).to_string(), "4.5");
        assert_eq!(Value::Date(date!(2024 - 03 - 07)).to_string(), "2024-03-07");
    }

    #[test]
    fn accessors() {
        let value = Value::from(3.0);
        assert_eq!(value.kind(), ValueKind::Number);
        assert_eq!(value.as_number(), Some(3.0));
        assert_eq!(value.as_date(), None);
        assert!(value.is_scalar());
        assert_eq!(value.kind().to_string(), "number");
    }
}
