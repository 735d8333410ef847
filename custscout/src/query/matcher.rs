use tracing::trace;

use super::{Criterion, Operator};
use crate::fields::{
    alternate_fields, is_numeric_field, BRANCH_FIELD, CITY_FIELD, COVERAGE_FIELD, LOCATION_FIELD,
    NAME_FIELD, PRODUCTS_FIELD,
};
use crate::records::{parse_number, Record};

/// City value that only ever matches exactly; a substring match would
/// also pick up suburbs whose names contain it
const EXACT_ONLY_CITY: &str = "atlanta";

/// How a criterion is evaluated, chosen once from the attribute class
#[derive(Debug, Clone, PartialEq)]
pub enum MatchStrategy {
    /// Numeric attributes and explicit comparisons
    Numeric {
        field: String,
        op: Operator,
        target: Option<f64>,
    },
    /// Substring against the name and its original spelling
    Name { needle: String },
    /// Substring against city spellings, exact for the Atlanta exception
    City { needle: String, exact: bool },
    /// Substring against a canonical attribute and its alternate spellings
    Spellings {
        fields: Vec<String>,
        needle: String,
    },
    /// Substring against the keys of the product mapping
    Products { needle: String },
    /// Substring against a stored location, then the synthesized "city, state"
    Location { needle: String },
    /// Dotted path walked level by level, then compared like `Generic`
    Nested { path: String, needle: String },
    /// Exact match first, substring otherwise
    Generic { field: String, needle: String },
}

impl MatchStrategy {
    /// Picks the strategy for a criterion
    pub fn for_criterion(criterion: &Criterion) -> Self {
        let field = criterion.field.as_str();
        let needle = criterion.value.trim().to_lowercase();

        if criterion.op.is_comparison() || is_numeric_field(field) {
            return Self::Numeric {
                field: field.to_string(),
                op: criterion.op,
                target: parse_number(&criterion.value),
            };
        }

        match field {
            NAME_FIELD => Self::Name { needle },
            CITY_FIELD => Self::City {
                exact: needle == EXACT_ONLY_CITY,
                needle,
            },
            BRANCH_FIELD | COVERAGE_FIELD => Self::Spellings {
                fields: std::iter::once(field)
                    .chain(alternate_fields(field).iter().copied())
                    .map(str::to_string)
                    .collect(),
                needle,
            },
            PRODUCTS_FIELD => Self::Products { needle },
            LOCATION_FIELD => Self::Location { needle },
            _ if field.contains('.') => Self::Nested {
                path: field.to_string(),
                needle,
            },
            _ => Self::Generic {
                field: field.to_string(),
                needle,
            },
        }
    }

    /// Evaluates the strategy against one record
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Numeric { field, op, target } => {
                let (Some(stored), Some(target)) = (record.number(field), *target) else {
                    return false;
                };
                op.compare(stored, target)
            }
            Self::Name { needle } => {
                any_spelling_contains(record, NAME_FIELD, alternate_fields(NAME_FIELD), needle)
            }
            Self::City { needle, exact } => {
                let mut spellings = std::iter::once(CITY_FIELD)
                    .chain(alternate_fields(CITY_FIELD).iter().copied())
                    .filter_map(|f| record.text(f))
                    .map(|s| s.trim().to_lowercase());
                if *exact {
                    spellings.any(|s| s == *needle)
                } else {
                    spellings.any(|s| s.contains(needle.as_str()))
                }
            }
            Self::Spellings { fields, needle } => fields
                .iter()
                .filter_map(|f| record.text(f))
                .any(|s| s.to_lowercase().contains(needle.as_str())),
            Self::Products { needle } => record
                .product_keys()
                .iter()
                .any(|key| key.to_lowercase().contains(needle.as_str())),
            Self::Location { needle } => [record.text(LOCATION_FIELD), record.location()]
                .into_iter()
                .flatten()
                .any(|loc| loc.to_lowercase().contains(needle.as_str())),
            Self::Nested { path, needle } => generic_match(record, path, needle),
            Self::Generic { field, needle } => generic_match(record, field, needle),
        }
    }
}

fn any_spelling_contains(
    record: &Record,
    canonical: &str,
    alternates: &[&str],
    needle: &str,
) -> bool {
    std::iter::once(canonical)
        .chain(alternates.iter().copied())
        .filter_map(|f| record.text(f))
        .any(|s| s.to_lowercase().contains(needle))
}

fn generic_match(record: &Record, field: &str, needle: &str) -> bool {
    let Some(stored) = record.text(field) else {
        return false;
    };
    let stored = stored.trim().to_lowercase();
    if stored == needle {
        return true;
    }
    // The Atlanta exception also applies when city falls through here
    let exact_only = field == CITY_FIELD && needle == EXACT_ONLY_CITY;
    !exact_only && stored.contains(needle)
}

/// A criterion paired with its strategy, compiled once per query
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCriterion {
    pub criterion: Criterion,
    pub strategy: MatchStrategy,
}

impl CompiledCriterion {
    pub fn new(criterion: Criterion) -> Self {
        let strategy = MatchStrategy::for_criterion(&criterion);
        trace!("Compiled {} into {:?}", criterion, strategy);
        Self {
            criterion,
            strategy,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.strategy.matches(record)
    }
}

/// True when the record satisfies every criterion
pub fn matches_all(criteria: &[CompiledCriterion], record: &Record) -> bool {
    criteria.iter().all(|c| c.matches(record))
}
