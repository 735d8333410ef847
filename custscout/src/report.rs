//! Human-readable rendering of query outcomes.
//!
//! Reports are plain UTF-8 text; nothing downstream should parse them.
//! Use [`ResultSet::to_json`] when a machine-readable form is needed.

use std::fmt;

use crate::config::QueryConfig;
use crate::fields::{
    BRANCH_FIELD, COVERAGE_FIELD, GROWTH_FIELD, INDUSTRY_FIELD, NAME_FIELD, REVENUE_FIELDS,
    SECTOR_FIELD, TECH_CLIENT_FIELD,
};
use crate::query::QueryOutcome;
use crate::records::Record;
use crate::results::{display_value, BreakdownEntry, FieldInfo, ResultSet, MISSING};

pub const NO_RESULTS: &str = "No customers found matching the criteria.";

/// Rendering options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Maximum number of records in the detail block
    pub max_detail: Option<usize>,
}

impl From<&QueryConfig> for ReportOptions {
    fn from(config: &QueryConfig) -> Self {
        Self {
            max_detail: config.max_detail,
        }
    }
}

pub fn format_outcome(outcome: &QueryOutcome, options: &ReportOptions) -> String {
    match outcome {
        QueryOutcome::Fields(fields) => format_field_guide(fields),
        QueryOutcome::Records(results) => format_results(results, options),
    }
}

pub fn format_field_guide(fields: &[FieldInfo]) -> String {
    FieldGuide(fields).to_string()
}

pub fn format_results(results: &ResultSet, options: &ReportOptions) -> String {
    if results.is_empty() {
        return NO_RESULTS.to_string();
    }
    Report { results, options }.to_string()
}

/// Formats an amount as dollars with thousands separators and cents
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, whole, cents % 100)
}

pub fn format_growth(growth: Option<f64>) -> String {
    match growth {
        Some(g) => format!("{:.1}%", g),
        None => MISSING.to_string(),
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

struct FieldGuide<'a>(&'a [FieldInfo]);

impl fmt::Display for FieldGuide<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "No fields available.");
        }
        writeln!(f, "Available fields ({}):", self.0.len())?;
        let lines: Vec<String> = self
            .0
            .iter()
            .map(|field| {
                format!(
                    "  {} ({}) - {}  e.g. {}",
                    field.name, field.kind, field.description, field.example
                )
            })
            .collect();
        write!(f, "{}", lines.join("\n"))
    }
}

struct Report<'a> {
    results: &'a ResultSet,
    options: &'a ReportOptions,
}

impl Report<'_> {
    fn write_summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.results.summary();
        writeln!(f, "=== Summary ===")?;
        writeln!(f, "Total customers: {}", summary.total)?;
        for revenue in &summary.revenue {
            writeln!(
                f,
                "Total revenue {}: {}",
                revenue.year,
                format_currency(revenue.total)
            )?;
        }
        write_breakdown(f, "Sector breakdown", &summary.sectors)?;
        write_breakdown(f, "Tech client status", &summary.tech_clients)?;
        write_breakdown(f, "Industry breakdown", &summary.industries)
    }

    fn write_record(&self, f: &mut fmt::Formatter<'_>, index: usize, record: &Record) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}. {}", index + 1, display_value(record, NAME_FIELD))?;
        writeln!(
            f,
            "   Location: {}",
            record.location().unwrap_or_else(|| MISSING.to_string())
        )?;
        writeln!(f, "   Branch: {}", display_value(record, BRANCH_FIELD))?;
        writeln!(f, "   Coverage: {}", display_value(record, COVERAGE_FIELD))?;
        writeln!(f, "   Tech client: {}", display_value(record, TECH_CLIENT_FIELD))?;
        writeln!(f, "   Industry: {}", display_value(record, INDUSTRY_FIELD))?;
        writeln!(f, "   Sector: {}", display_value(record, SECTOR_FIELD))?;
        for field in REVENUE_FIELDS {
            let amount = record
                .number(field)
                .map(format_currency)
                .unwrap_or_else(|| MISSING.to_string());
            writeln!(
                f,
                "   Revenue {}: {}",
                field.trim_start_matches("revenue_"),
                amount
            )?;
        }
        writeln!(f, "   Growth: {}", format_growth(record.number(GROWTH_FIELD)))?;
        write!(f, "   Products: {}", format_products(record))
    }

    fn write_projected(
        &self,
        f: &mut fmt::Formatter<'_>,
        index: usize,
        row: &Record,
        fields: &[String],
    ) -> fmt::Result {
        writeln!(f)?;
        write!(f, "{}.", index + 1)?;
        for field in fields {
            write!(f, "\n   {}: {}", field, display_value(row, field))?;
        }
        Ok(())
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.results.total();
        writeln!(
            f,
            "Found {} customer{} matching the criteria.",
            total,
            if total == 1 { "" } else { "s" }
        )?;
        writeln!(f)?;
        self.write_summary(f)?;
        writeln!(f)?;
        write!(f, "=== Customers ===")?;

        let rows = self.results.rows();
        let shown = self.options.max_detail.unwrap_or(rows.len()).min(rows.len());
        for (index, row) in rows.iter().take(shown).enumerate() {
            writeln!(f)?;
            match &self.results.projection {
                Some(fields) => self.write_projected(f, index, row, fields)?,
                None => self.write_record(f, index, row)?,
            }
        }
        if shown < rows.len() {
            write!(f, "\n\n... and {} more customers", rows.len() - shown)?;
        }
        Ok(())
    }
}

fn write_breakdown(f: &mut fmt::Formatter<'_>, title: &str, entries: &[BreakdownEntry]) -> fmt::Result {
    writeln!(f, "{}:", title)?;
    for entry in entries {
        writeln!(f, "  {}: {}", entry.value, entry.count)?;
    }
    Ok(())
}

fn format_products(record: &Record) -> String {
    let products = record.products();
    if products.is_empty() {
        return MISSING.to_string();
    }
    products
        .iter()
        .map(|p| match p.count {
            Some(count) if count.fract() == 0.0 => format!("{} ({})", p.name, count as i64),
            Some(count) => format!("{} ({})", p.name, count),
            None => p.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
