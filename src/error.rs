use std::fmt;

/// Fixed vocabulary used to build error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Invalid,
    Negative,
    Unknown,
    NotFound,
    Missing,
    Deprecated,
    Duplicated,
    NoData,
    NotEnoughData,
    InvalidRange,
    MultipleValues,
}

impl Reason {
    pub fn phrase(&self) -> &'static str {
        match self {
            Reason::Invalid => "is invalid",
            Reason::Negative => "cannot be negative",
            Reason::Unknown => "is unknown",
            Reason::NotFound => "not found",
            Reason::Missing => "is missing",
            Reason::Deprecated => "is deprecated",
            Reason::Duplicated => "already exists",
            Reason::NoData => "has no data",
            Reason::NotEnoughData => "does not have enough data",
            Reason::InvalidRange => "has an invalid data range",
            Reason::MultipleValues => "expects more than one value",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

#[derive(Debug, Clone, thiserror::Error, miette::Diagnostic)]
pub enum Error {
    #[error("Operand of type {found} is invalid")]
    #[diagnostic(help("only numbers, dates and datasets can be used in expressions"))]
    Operand { found: &'static str },

    #[error("Operation '{op}' on {operands} is invalid")]
    Operation { op: &'static str, operands: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Function '{name}' {reason}")]
    Function { name: String, reason: Reason },

    #[error("Function '{name}' is deprecated, use '{replacement}()' instead")]
    Deprecated {
        name: String,
        replacement: &'static str,
    },

    #[error("Template variable '{name}' is deprecated, use '{replacement}()' instead")]
    #[diagnostic(help("aggregate functions are called with parentheses"))]
    DeprecatedVariable { name: String, replacement: String },

    #[error("Too many arguments for function '{name}'")]
    TooManyArguments { name: String },

    #[error("Argument of function '{name}' {reason}")]
    Argument { name: String, reason: Reason },

    #[error("Function '{name}' only accepts {expected}")]
    ArgumentType {
        name: String,
        expected: &'static str,
    },

    #[error("Dataset '{id}' {reason}")]
    Dataset { id: String, reason: Reason },

    #[error("No available dataset found")]
    #[diagnostic(help("every dataset is used as the X axis, pass one explicitly with dataset(id)"))]
    NoDataset,

    #[error("{run} {reason}")]
    Streak { run: &'static str, reason: Reason },

    #[error("{run} {reason}")]
    BrokenStreak { run: &'static str, reason: Reason },

    #[error("Date range {reason}")]
    DateRange { reason: Reason },

    #[error("Format '{format}' {reason}")]
    Format { format: String, reason: Reason },

    #[error("Failed to resolve values")]
    Unresolved,

    #[error("Failed to parse expression: {0}")]
    #[diagnostic(transparent)]
    Parse(#[from] lang::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
