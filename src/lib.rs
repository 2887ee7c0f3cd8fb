#![warn(clippy::all, rust_2018_idioms)]

//! Expression and template engine for habit trackers.
//!
//! Day-by-day values collected from notes live in [`Series`] sharing the
//! date axis of a [`SeriesCollection`]. Expressions such as
//! `max(dataset(0)) - min(dataset(0))` are evaluated against a
//! [`RenderContext`], and `{{expression::format}}` placeholders inside
//! text are replaced by [`resolve_template`].
//!
//! ```
//! use time::macros::date;
//! use tracker_expr::{evaluate_str, RenderContext, SeriesCollection, SeriesSpec, Value};
//!
//! let mut collection =
//!     SeriesCollection::new(date!(2024 - 01 - 01), date!(2024 - 01 - 03)).unwrap();
//! let steps = collection.create_series(SeriesSpec::new(0, "steps")).unwrap();
//! steps.set_value(date!(2024 - 01 - 01), 4000.0);
//! steps.set_value(date!(2024 - 01 - 02), 6000.0);
//!
//! let ctx = RenderContext::new(collection);
//! assert_eq!(evaluate_str("average()", &ctx).unwrap(), Value::Number(5000.0));
//! assert_eq!(evaluate_str("maxStreak(dataset(0))", &ctx).unwrap(), Value::Number(2.0));
//! ```

mod collection;
mod context;
mod error;
mod eval;
mod format;
mod functions;
mod ops;
mod series;
mod template;
mod value;

pub use collection::SeriesCollection;
pub use context::{RenderContext, DEFAULT_DATE_FORMAT};
pub use error::{Error, Reason, Result};
pub use eval::{evaluate, evaluate_str, Evaluator};
pub use format::{format_date, format_number};
pub use functions::{FunctionRegistry, TransformFn, ValueFn};
pub use ops::{apply_binary, apply_unary};
pub use series::{DataPoint, Points, Series, SeriesId, SeriesSpec, ValueType};
pub use template::{resolve_template, resolve_value};
pub use value::{Value, ValueKind};

pub use lang;
