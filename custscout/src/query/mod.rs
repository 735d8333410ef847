/// Ad-hoc querying over the loaded customer snapshot.
///
/// A query runs as three pure stages:
///
/// 1. [`QueryParser`] turns one line of free text into a [`QueryRequest`]
/// 2. the [`engine`] compiles each [`Criterion`] into a match strategy and
///    filters the records (logical AND, collection order preserved)
/// 3. the [`crate::report`] module renders the outcome as text
///
/// None of the stages can fail. A line the parser cannot interpret becomes
/// a request with no criteria, which matches every record:
/// ```rust,ignore
/// let engine = QueryEngine::new(&customers, &config);
/// let outcome = engine.run("companies with revenue over 45000");
/// println!("{}", format_outcome(&outcome, &ReportOptions::default()));
/// ```
use serde::Serialize;
use std::fmt;

pub mod engine;
pub mod interactive;
pub mod matcher;
pub mod parser;

pub use engine::{execute, QueryEngine, QueryOutcome};
pub use matcher::{CompiledCriterion, MatchStrategy};
pub use parser::QueryParser;

/// Comparison applied by a criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    /// Equality, or substring for text attributes
    Equals,
    /// Case-insensitive substring
    Contains,
    GreaterOrEqual,
    Greater,
    LessOrEqual,
    Less,
}

impl Operator {
    /// Parses a comparison symbol used in `where` clauses
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" | "==" => Some(Self::Equals),
            ">=" => Some(Self::GreaterOrEqual),
            ">" => Some(Self::Greater),
            "<=" => Some(Self::LessOrEqual),
            "<" => Some(Self::Less),
            _ => None,
        }
    }

    /// True for the explicit numeric comparisons
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::GreaterOrEqual | Self::Greater | Self::LessOrEqual | Self::Less
        )
    }

    /// Applies a numeric comparison; equality and substring fall back to
    /// exact equality
    pub fn compare(self, stored: f64, target: f64) -> bool {
        match self {
            Self::GreaterOrEqual => stored >= target,
            Self::Greater => stored > target,
            Self::LessOrEqual => stored <= target,
            Self::Less => stored < target,
            Self::Equals | Self::Contains => stored == target,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Equals => "=",
            Self::Contains => "~",
            Self::GreaterOrEqual => ">=",
            Self::Greater => ">",
            Self::LessOrEqual => "<=",
            Self::Less => "<",
        };
        f.write_str(symbol)
    }
}

/// One (attribute, operator, value) test applied to a record.
///
/// The value is kept as typed; whether it is compared as text or as a
/// number is decided when the criterion is compiled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Criterion {
    pub field: String,
    pub op: Operator,
    pub value: String,
}

impl Criterion {
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Equals, value)
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Contains, value)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.field, self.op, self.value)
    }
}

/// Structured form of one query line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum QueryRequest {
    /// List the attributes available for querying
    ListFields,
    /// Filter records; an empty criteria list matches everything
    Match {
        criteria: Vec<Criterion>,
        projection: Option<Vec<String>>,
    },
}

impl QueryRequest {
    /// A request with no criteria and no projection
    pub fn everything() -> Self {
        Self::Match {
            criteria: Vec::new(),
            projection: None,
        }
    }

    pub fn single(criterion: Criterion) -> Self {
        Self::Match {
            criteria: vec![criterion],
            projection: None,
        }
    }

    pub fn criteria(&self) -> &[Criterion] {
        match self {
            Self::ListFields => &[],
            Self::Match { criteria, .. } => criteria,
        }
    }

    pub fn projection(&self) -> Option<&[String]> {
        match self {
            Self::ListFields => None,
            Self::Match { projection, .. } => projection.as_deref(),
        }
    }
}
