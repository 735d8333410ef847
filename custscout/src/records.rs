//! Customer records and the read-only snapshot they are loaded into.
//!
//! A [`Record`] is a flat JSON object with one level of nesting for the
//! product mapping. Records are never mutated once loaded; every accessor
//! here borrows or clones.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::{QueryError, QueryResult};
use crate::fields::{CITY_FIELD, LOCATION_FIELD, PRODUCTS_FIELD, STATE_FIELD};

/// Top-level keys that may wrap the record array in an exported document
const RECORD_KEYS: [&str; 3] = ["customers", "records", "data"];

/// A product listed on a record, with its usage count when the export has one
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUsage {
    pub name: String,
    pub count: Option<f64>,
}

/// One customer/account entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// All stored attributes, in document order
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Top-level attribute value
    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.0.get(attr)
    }

    /// Resolves an attribute path against this record.
    ///
    /// A literal key wins, so a projected record (whose keys may contain
    /// dots) resolves to itself. Otherwise `location` is synthesized and
    /// dotted paths are walked one mapping at a time.
    pub fn lookup(&self, path: &str) -> Option<Cow<'_, Value>> {
        if let Some(value) = self.0.get(path) {
            return Some(Cow::Borrowed(value));
        }
        if path == LOCATION_FIELD {
            return self.location().map(|loc| Cow::Owned(Value::String(loc)));
        }
        if !path.contains('.') {
            return None;
        }

        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(Cow::Borrowed(current))
    }

    /// String rendering of a scalar attribute
    pub fn text(&self, path: &str) -> Option<String> {
        self.lookup(path).and_then(|value| scalar_text(&value))
    }

    /// Numeric value of an attribute stored as a number or a numeric string
    pub fn number(&self, path: &str) -> Option<f64> {
        self.lookup(path).and_then(|value| value_number(&value))
    }

    /// The synthesized "city, state" string
    pub fn location(&self) -> Option<String> {
        let city = self.text(CITY_FIELD).filter(|s| !s.trim().is_empty());
        let state = self.text(STATE_FIELD).filter(|s| !s.trim().is_empty());
        match (city, state) {
            (Some(city), Some(state)) => Some(format!("{}, {}", city, state)),
            (Some(city), None) => Some(city),
            (None, Some(state)) => Some(state),
            (None, None) => None,
        }
    }

    /// Every key of the product mapping, regardless of its flag
    pub fn product_keys(&self) -> Vec<&str> {
        match self.0.get(PRODUCTS_FIELD) {
            Some(Value::Object(map)) => map.keys().map(String::as_str).collect(),
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Products the record actually uses.
    ///
    /// When any product carries a count the list is sorted by descending
    /// usage; otherwise it keeps document order.
    pub fn products(&self) -> Vec<ProductUsage> {
        let mut products: Vec<ProductUsage> = match self.0.get(PRODUCTS_FIELD) {
            Some(Value::Object(map)) => map
                .iter()
                .filter(|(_, flag)| is_truthy(flag))
                .map(|(name, flag)| ProductUsage {
                    name: name.clone(),
                    count: flag.as_f64(),
                })
                .collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(|name| ProductUsage {
                    name: name.to_string(),
                    count: None,
                })
                .collect(),
            _ => Vec::new(),
        };

        if products.iter().any(|p| p.count.is_some()) {
            products.sort_by(|a, b| {
                let a = a.count.unwrap_or(0.0);
                let b = b.count.unwrap_or(0.0);
                b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        products
    }

    /// Reduces the record to the requested attributes.
    ///
    /// Missing attributes are kept as `null` so every projected row has
    /// the same shape.
    pub fn project(&self, fields: &[String]) -> Record {
        let mut projected = Map::new();
        for field in fields {
            let value = self
                .lookup(field)
                .map(Cow::into_owned)
                .unwrap_or(Value::Null);
            projected.insert(field.clone(), value);
        }
        Record(projected)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Renders a scalar JSON value as text; `null`, arrays and objects have none
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Numeric value of a JSON number or numeric-looking string
pub fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Parses a number, ignoring currency symbols, thousands separators and a
/// trailing percent sign
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Whether a product flag marks the product as in use
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n > 0.0),
        Value::String(s) => {
            let s = s.trim().to_lowercase();
            !s.is_empty() && !matches!(s.as_str(), "false" | "0" | "no" | "n")
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Null => false,
    }
}

/// Short type name for a JSON value
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "unknown",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// The in-memory record collection, loaded once per session
#[derive(Debug, Clone, Default)]
pub struct CustomerSet {
    records: Vec<Record>,
}

impl CustomerSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Loads the collection from a JSON document on disk
    pub fn load(path: &Path) -> QueryResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| QueryError::from_io(path, e))?;
        let set = Self::from_json_str(&text)?;
        info!(
            "Loaded {} customer records from {}",
            set.len(),
            path.display()
        );
        Ok(set)
    }

    /// Parses a JSON document holding the record array
    pub fn from_json_str(text: &str) -> QueryResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Accepts a bare array of objects, or an object wrapping one under
    /// `customers`, `records` or `data`
    pub fn from_value(value: Value) -> QueryResult<Self> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => {
                match RECORD_KEYS.iter().find_map(|key| map.remove(*key)) {
                    Some(Value::Array(items)) => items,
                    _ => {
                        return Err(QueryError::invalid_data(
                            "expected an array of customer records or an object with a `customers` array",
                        ))
                    }
                }
            }
            other => {
                return Err(QueryError::invalid_data(format!(
                    "expected an array of customer records, found {}",
                    value_kind(&other)
                )))
            }
        };

        let records = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(fields) => Ok(Record(fields)),
                other => Err(QueryError::invalid_data(format!(
                    "record {} is not an object (found {})",
                    index,
                    value_kind(&other)
                ))),
            })
            .collect::<QueryResult<Vec<_>>>()?;

        debug!("Parsed {} records", records.len());
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Sorted attribute names observed across all records, including one
    /// level of nested names joined with `.`
    pub fn field_names(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        for record in &self.records {
            for (key, value) in record.fields() {
                names.insert(key.clone());
                if let Value::Object(nested) = value {
                    for nested_key in nested.keys() {
                        names.insert(format!("{}.{}", key, nested_key));
                    }
                }
            }
        }
        names.into_iter().collect()
    }

    /// First non-null value stored under `path`, in collection order
    pub fn sample(&self, path: &str) -> Option<Value> {
        self.records
            .iter()
            .filter_map(|record| record.lookup(path))
            .find(|value| !value.is_null())
            .map(Cow::into_owned)
    }
}

impl<'a> IntoIterator for &'a CustomerSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
