//! Static lookup tables for customer attributes.
//!
//! The alias table maps what people type ("tech client", "revenue 2024")
//! to canonical record attributes. The description table backs the field
//! guide. Both are plain immutable maps built once on first use.

use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;

use crate::records::{scalar_text, value_kind};

pub const NAME_FIELD: &str = "name";
pub const CITY_FIELD: &str = "city";
pub const STATE_FIELD: &str = "state";
pub const SECTOR_FIELD: &str = "sector";
pub const INDUSTRY_FIELD: &str = "industry";
pub const TECH_CLIENT_FIELD: &str = "tech_client";
pub const BRANCH_FIELD: &str = "branch";
pub const COVERAGE_FIELD: &str = "coverage";
pub const PRODUCTS_FIELD: &str = "products";
pub const LOCATION_FIELD: &str = "location";
pub const GROWTH_FIELD: &str = "growth";
pub const EMPLOYEES_FIELD: &str = "employees";

/// Revenue attributes, oldest year first
pub const REVENUE_FIELDS: [&str; 3] = ["revenue_2022", "revenue_2023", "revenue_2024"];

/// Attributes compared numerically
pub const NUMERIC_FIELDS: [&str; 5] = [
    "revenue_2022",
    "revenue_2023",
    "revenue_2024",
    GROWTH_FIELD,
    EMPLOYEES_FIELD,
];

const NO_DESCRIPTION: &str = "No description available";

static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("name", NAME_FIELD),
        ("company", NAME_FIELD),
        ("company name", NAME_FIELD),
        ("company_name", NAME_FIELD),
        ("customer", NAME_FIELD),
        ("customer name", NAME_FIELD),
        ("account", NAME_FIELD),
        ("city", CITY_FIELD),
        ("town", CITY_FIELD),
        ("state", STATE_FIELD),
        ("sector", SECTOR_FIELD),
        ("industry", INDUSTRY_FIELD),
        ("vertical", INDUSTRY_FIELD),
        ("tech client", TECH_CLIENT_FIELD),
        ("tech_client", TECH_CLIENT_FIELD),
        ("techclient", TECH_CLIENT_FIELD),
        ("tech", TECH_CLIENT_FIELD),
        ("tech status", TECH_CLIENT_FIELD),
        ("branch", BRANCH_FIELD),
        ("territory", BRANCH_FIELD),
        ("coverage", COVERAGE_FIELD),
        ("coverage type", COVERAGE_FIELD),
        ("products", PRODUCTS_FIELD),
        ("product", PRODUCTS_FIELD),
        ("uses", PRODUCTS_FIELD),
        ("location", LOCATION_FIELD),
        ("revenue", "revenue_2024"),
        ("revenue 2024", "revenue_2024"),
        ("revenue2024", "revenue_2024"),
        ("rev2024", "revenue_2024"),
        ("revenue 2023", "revenue_2023"),
        ("revenue2023", "revenue_2023"),
        ("rev2023", "revenue_2023"),
        ("revenue 2022", "revenue_2022"),
        ("revenue2022", "revenue_2022"),
        ("rev2022", "revenue_2022"),
        ("growth", GROWTH_FIELD),
        ("growth rate", GROWTH_FIELD),
        ("growth %", GROWTH_FIELD),
        ("employees", EMPLOYEES_FIELD),
        ("employee count", EMPLOYEES_FIELD),
        ("headcount", EMPLOYEES_FIELD),
        ("staff", EMPLOYEES_FIELD),
    ])
});

static DESCRIPTIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (NAME_FIELD, "Company or account name"),
        ("original_name", "Company name as spelled in the source export"),
        (CITY_FIELD, "City of the customer's primary location"),
        ("original_city", "City as spelled in the source export"),
        (STATE_FIELD, "State of the customer's primary location"),
        (SECTOR_FIELD, "Market sector the customer belongs to"),
        (INDUSTRY_FIELD, "Industry descriptor"),
        (TECH_CLIENT_FIELD, "Whether the customer is a technology client"),
        (BRANCH_FIELD, "Sales branch or territory that owns the account"),
        ("original_branch", "Branch as spelled in the source export"),
        (COVERAGE_FIELD, "Coverage model for the account"),
        ("original_coverage", "Coverage as spelled in the source export"),
        ("revenue_2022", "Total revenue for 2022"),
        ("revenue_2023", "Total revenue for 2023"),
        ("revenue_2024", "Total revenue for 2024"),
        (GROWTH_FIELD, "Revenue growth percentage from 2023 to 2024"),
        (EMPLOYEES_FIELD, "Number of employees"),
        (PRODUCTS_FIELD, "Products the customer uses"),
        (LOCATION_FIELD, "City and state combined"),
    ])
});

/// Alternate spellings consulted alongside a canonical attribute
pub fn alternate_fields(field: &str) -> &'static [&'static str] {
    match field {
        NAME_FIELD => &["original_name"],
        CITY_FIELD => &["original_city"],
        BRANCH_FIELD => &["original_branch", "branch_name"],
        COVERAGE_FIELD => &["original_coverage", "coverage_name"],
        _ => &[],
    }
}

pub fn is_numeric_field(field: &str) -> bool {
    NUMERIC_FIELDS.contains(&field)
}

/// Canonical attribute for an alias, if the alias table knows it
pub fn alias(token: &str) -> Option<&'static str> {
    ALIASES.get(token.trim().to_lowercase().as_str()).copied()
}

/// Resolves a query token to an attribute name.
///
/// Tries the alias table, then a case-insensitive match against the
/// attributes seen in the loaded records, then falls back to the token
/// itself.
pub fn resolve_field(token: &str, known: &[String]) -> String {
    let token = token.trim().trim_end_matches(',');
    if let Some(field) = alias(token) {
        return field.to_string();
    }
    match lookup_known(token, known) {
        Some(field) => field.to_string(),
        None => token.to_string(),
    }
}

/// Whether a token names an attribute (alias or known record attribute)
pub fn is_recognized(token: &str, known: &[String]) -> bool {
    let token = token.trim().trim_end_matches(',');
    alias(token).is_some() || lookup_known(token, known).is_some()
}

fn lookup_known<'a>(token: &str, known: &'a [String]) -> Option<&'a str> {
    known
        .iter()
        .find(|field| field.eq_ignore_ascii_case(token))
        .map(String::as_str)
}

pub fn description(field: &str) -> &'static str {
    DESCRIPTIONS.get(field).copied().unwrap_or(NO_DESCRIPTION)
}

/// Type name inferred from an observed value
pub fn infer_type(sample: Option<&Value>) -> &'static str {
    sample.map(value_kind).unwrap_or("unknown")
}

/// Example query for the field guide, from simple name heuristics
pub fn example_query(field: &str, sample: Option<&Value>) -> String {
    let lower = field.to_lowercase();
    let sample_text = sample.and_then(scalar_text).filter(|s| !s.is_empty());

    if lower.contains("name") {
        let value = sample_text.unwrap_or_else(|| "Acme Corp".to_string());
        format!("{}:\"{}\"", field, value)
    } else if lower.contains("city") || lower.contains("state") || lower.contains("sector") {
        let value = sample_text.unwrap_or_else(|| "Atlanta".to_string());
        format!("{}:{}", field, value)
    } else if lower.contains("revenue") {
        format!("select name where {} >= 100000", field)
    } else if lower.contains("growth") {
        format!("select name where {} >= 10", field)
    } else if lower.contains("product") {
        let product = field
            .split_once('.')
            .map(|(_, product)| product.to_string())
            .or_else(|| first_product(sample))
            .unwrap_or_else(|| "mq".to_string());
        format!("who uses {}", product)
    } else {
        let value = sample_text.unwrap_or_else(|| "value".to_string());
        format!("{}:{}", field, value)
    }
}

fn first_product(sample: Option<&Value>) -> Option<String> {
    match sample? {
        Value::Object(map) => map.keys().next().cloned(),
        Value::Array(items) => items.iter().find_map(Value::as_str).map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn known() -> Vec<String> {
        vec!["name".to_string(), "Region".to_string(), "products.mq".to_string()]
    }

    #[test]
    fn test_resolve_through_alias() {
        assert_eq!(resolve_field("Tech Client", &known()), "tech_client");
        assert_eq!(resolve_field("revenue", &known()), "revenue_2024");
        assert_eq!(resolve_field("territory", &known()), "branch");
        assert_eq!(resolve_field("company,", &known()), "name");
    }

    #[test]
    fn test_resolve_falls_back_to_known_then_literal() {
        assert_eq!(resolve_field("region", &known()), "Region");
        assert_eq!(resolve_field("PRODUCTS.MQ", &known()), "products.mq");
        assert_eq!(resolve_field("favorite_color", &known()), "favorite_color");
        assert!(is_recognized("region", &known()));
        assert!(!is_recognized("favorite_color", &known()));
    }

    #[test]
    fn test_descriptions_default() {
        assert_eq!(description("revenue_2024"), "Total revenue for 2024");
        assert_eq!(description("shoe_size"), "No description available");
    }

    #[test]
    fn test_field_classes() {
        assert!(is_numeric_field("growth"));
        assert!(!is_numeric_field("city"));
        assert_eq!(alternate_fields("branch").len(), 2);
        assert!(alternate_fields("sector").is_empty());
    }

    #[test]
    fn test_example_queries() {
        assert_eq!(
            example_query("name", Some(&json!("Acme Corp"))),
            "name:\"Acme Corp\""
        );
        assert_eq!(example_query("city", Some(&json!("Atlanta"))), "city:Atlanta");
        assert_eq!(
            example_query("revenue_2023", None),
            "select name where revenue_2023 >= 100000"
        );
        assert_eq!(example_query("products", Some(&json!({"cics": true}))), "who uses cics");
        assert_eq!(example_query("products.mq", None), "who uses mq");
        assert_eq!(example_query("employees", Some(&json!(120))), "employees:120");
    }

    #[test]
    fn test_infer_type() {
        assert_eq!(infer_type(Some(&json!(3))), "number");
        assert_eq!(infer_type(Some(&json!("x"))), "text");
        assert_eq!(infer_type(Some(&json!({"a": 1}))), "object");
        assert_eq!(infer_type(None), "unknown");
    }
}
