//! Result sets and the aggregate summary computed over them.

use serde::Serialize;
use serde_json::{json, Value};

use crate::fields::{INDUSTRY_FIELD, REVENUE_FIELDS, SECTOR_FIELD, TECH_CLIENT_FIELD};
use crate::records::Record;

/// Placeholder for a missing attribute value
pub const MISSING: &str = "N/A";

/// One line of the field guide
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub kind: String,
    pub description: String,
    pub example: String,
}

/// Count of records sharing one attribute value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownEntry {
    pub value: String,
    pub count: usize,
}

/// Revenue summed over the matched records for one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueTotal {
    pub year: String,
    pub total: f64,
}

/// Aggregates shown above the per-record details
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub revenue: Vec<RevenueTotal>,
    pub sectors: Vec<BreakdownEntry>,
    pub tech_clients: Vec<BreakdownEntry>,
    pub industries: Vec<BreakdownEntry>,
}

/// Records matched by a query, with their projection when one was requested
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultSet {
    /// Full matched records, in collection order
    pub matched: Vec<Record>,
    /// Matched records reduced to the projection
    pub projected: Option<Vec<Record>>,
    pub projection: Option<Vec<String>>,
}

impl ResultSet {
    pub fn new(matched: Vec<Record>, projection: Option<Vec<String>>) -> Self {
        let projection = projection.filter(|fields| !fields.is_empty());
        let projected = projection
            .as_ref()
            .map(|fields| matched.iter().map(|r| r.project(fields)).collect());
        Self {
            matched,
            projected,
            projection,
        }
    }

    pub fn total(&self) -> usize {
        self.matched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    /// Rows to display: projected records if a projection was requested
    pub fn rows(&self) -> &[Record] {
        self.projected.as_deref().unwrap_or(&self.matched)
    }

    /// Totals and breakdowns over the full matched records
    pub fn summary(&self) -> Summary {
        Summary {
            total: self.total(),
            revenue: REVENUE_FIELDS
                .iter()
                .map(|field| RevenueTotal {
                    year: field.trim_start_matches("revenue_").to_string(),
                    total: self.matched.iter().filter_map(|r| r.number(field)).sum(),
                })
                .collect(),
            sectors: breakdown(&self.matched, SECTOR_FIELD),
            tech_clients: breakdown(&self.matched, TECH_CLIENT_FIELD),
            industries: breakdown(&self.matched, INDUSTRY_FIELD),
        }
    }

    /// JSON payload with the summary and the displayed rows
    pub fn to_json(&self) -> Value {
        json!({
            "total": self.total(),
            "summary": self.summary(),
            "projection": self.projection,
            "records": self.rows(),
        })
    }
}

/// Counts per distinct value, most common first; ties keep the order in
/// which values were first seen
pub fn breakdown(records: &[Record], field: &str) -> Vec<BreakdownEntry> {
    let mut entries: Vec<BreakdownEntry> = Vec::new();
    for record in records {
        let value = display_value(record, field);
        match entries.iter_mut().find(|e| e.value == value) {
            Some(entry) => entry.count += 1,
            None => entries.push(BreakdownEntry { value, count: 1 }),
        }
    }
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

/// Text for an attribute, or the missing placeholder
pub fn display_value(record: &Record, field: &str) -> String {
    match record.lookup(field).as_deref() {
        Some(Value::Null) | None => MISSING.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => MISSING.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::CustomerSet;

    fn matched() -> Vec<Record> {
        CustomerSet::from_json_str(
            r#"[
                {"name": "A", "sector": "Retail", "tech_client": "Yes", "revenue_2024": 100, "revenue_2023": "50"},
                {"name": "B", "sector": "Energy", "tech_client": "No", "revenue_2024": 200},
                {"name": "C", "sector": "Energy", "revenue_2024": "n/a"},
                {"name": "D", "sector": "", "tech_client": "Yes"}
            ]"#,
        )
        .unwrap()
        .records()
        .to_vec()
    }

    #[test]
    fn test_summary_totals() {
        let summary = ResultSet::new(matched(), None).summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.revenue[0].year, "2022");
        assert_eq!(summary.revenue[0].total, 0.0);
        assert_eq!(summary.revenue[1].total, 50.0);
        assert_eq!(summary.revenue[2].total, 300.0);
    }

    #[test]
    fn test_breakdown_order_and_placeholder() {
        let records = matched();
        let sectors = breakdown(&records, "sector");
        let values: Vec<_> = sectors.iter().map(|e| (e.value.as_str(), e.count)).collect();
        assert_eq!(values, vec![("Energy", 2), ("Retail", 1), ("N/A", 1)]);

        let tech = breakdown(&records, "tech_client");
        let values: Vec<_> = tech.iter().map(|e| (e.value.as_str(), e.count)).collect();
        assert_eq!(values, vec![("Yes", 2), ("No", 1), ("N/A", 1)]);

        let industries = breakdown(&records, "industry");
        assert_eq!(industries, vec![BreakdownEntry { value: "N/A".to_string(), count: 4 }]);
    }

    #[test]
    fn test_rows_follow_projection() {
        let results = ResultSet::new(matched(), Some(vec!["name".to_string()]));
        assert_eq!(results.total(), 4);
        assert_eq!(results.rows()[0].fields().len(), 1);
        // Summary still covers full records
        assert_eq!(results.summary().sectors[0].value, "Energy");

        let results = ResultSet::new(matched(), Some(Vec::new()));
        assert!(results.projection.is_none());
        assert_eq!(results.rows()[0].fields().len(), matched()[0].fields().len());
    }

    #[test]
    fn test_to_json_shape() {
        let results = ResultSet::new(matched(), Some(vec!["name".to_string()]));
        let value = results.to_json();
        assert_eq!(value["total"], 4);
        assert_eq!(value["records"][1]["name"], "B");
        assert_eq!(value["summary"]["sectors"][0]["count"], 2);
    }
}
