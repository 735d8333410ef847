use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{Criterion, Operator, QueryRequest};
use crate::fields::{
    is_recognized, resolve_field, BRANCH_FIELD, COVERAGE_FIELD, EMPLOYEES_FIELD, GROWTH_FIELD,
    INDUSTRY_FIELD, LOCATION_FIELD, PRODUCTS_FIELD, SECTOR_FIELD, TECH_CLIENT_FIELD,
};
use crate::records::CustomerSet;

const DIRECTIVES: [&str; 3] = ["show fields", "fields", "list fields"];

static COLON_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\w.]+):\s*(.+)$").expect("colon form regex"));

static EQUALS_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\w.]+)\s*==?\s*(.+)$").expect("equals form regex"));

static SELECT_OR_WHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(select|where)\b").expect("keyword regex"));

/// How a natural-language phrase turns into a criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhraseKind {
    Substring,
    AtLeast,
}

struct NaturalPattern {
    regex: Regex,
    field: &'static str,
    kind: PhraseKind,
}

impl NaturalPattern {
    fn new(pattern: &str, field: &'static str, kind: PhraseKind) -> Self {
        Self {
            regex: Regex::new(&format!(r"(?i)^{}$", pattern)).expect("natural language regex"),
            field,
            kind,
        }
    }
}

// Order matters: the specific "companies in X <noun>" phrases must be
// tried before the catch-all "companies in X".
static NATURAL_PATTERNS: Lazy<Vec<NaturalPattern>> = Lazy::new(|| {
    use PhraseKind::*;
    vec![
        NaturalPattern::new(
            r"(?:show\s+)?companies in (.+?) (?:branch|territory)",
            BRANCH_FIELD,
            Substring,
        ),
        NaturalPattern::new(r"(?:show\s+)?companies in (.+?) coverage", COVERAGE_FIELD, Substring),
        NaturalPattern::new(
            r"(?:show\s+)?companies with (?:revenue|sales) (?:over|above|greater than|more than|of at least|>=?)\s*\$?([\d,.]+)",
            "revenue_2024",
            AtLeast,
        ),
        NaturalPattern::new(
            r"(?:show\s+)?companies with growth (?:over|above|greater than|more than|of at least|>=?)\s*(-?[\d.]+)\s*%?",
            GROWTH_FIELD,
            AtLeast,
        ),
        NaturalPattern::new(
            r"(?:show\s+)?companies with (?:more than|over|at least) ([\d,]+) employees",
            EMPLOYEES_FIELD,
            AtLeast,
        ),
        NaturalPattern::new(
            r"(?:show\s+)?companies (?:with|using) (.+?) products?",
            PRODUCTS_FIELD,
            Substring,
        ),
        NaturalPattern::new(r"who uses (.+?)\??", PRODUCTS_FIELD, Substring),
        NaturalPattern::new(r"(.+?) tech clients?", TECH_CLIENT_FIELD, Substring),
        NaturalPattern::new(r"(?:show\s+)?companies in (.+?) industry", INDUSTRY_FIELD, Substring),
        NaturalPattern::new(r"(?:show\s+)?companies in (.+?) sector", SECTOR_FIELD, Substring),
        NaturalPattern::new(r"(?:show\s+)?companies in (.+)", LOCATION_FIELD, Substring),
    ]
});

/// Where the select/where grammar is currently collecting tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClauseMode {
    Projection,
    Source,
    Criteria,
}

/// Turns one line of free-form text into a [`QueryRequest`].
///
/// Forms are tried in a fixed order and the first one that matches wins:
/// directive, `field:value`, `field = value`, bare `field value`,
/// natural-language phrases, then the `select ... where ...` grammar.
/// Nothing here fails; an uninterpretable line yields a request with no
/// criteria.
#[derive(Debug, Clone, Default)]
pub struct QueryParser {
    known_fields: Vec<String>,
}

impl QueryParser {
    /// Creates a parser that recognizes the given record attributes
    pub fn new(known_fields: Vec<String>) -> Self {
        Self { known_fields }
    }

    /// Creates a parser for the attributes present in a snapshot
    pub fn for_customers(customers: &CustomerSet) -> Self {
        Self::new(customers.field_names())
    }

    pub fn known_fields(&self) -> &[String] {
        &self.known_fields
    }

    pub fn parse(&self, line: &str) -> QueryRequest {
        let line = line.trim();

        let request = if is_directive(line) {
            QueryRequest::ListFields
        } else if let Some(criterion) = self
            .parse_pair(&COLON_FORM, line)
            .or_else(|| self.parse_pair(&EQUALS_FORM, line))
            .or_else(|| self.parse_bare_pair(line))
            .or_else(|| parse_natural_language(line))
        {
            QueryRequest::single(criterion)
        } else {
            self.parse_select_where(line)
        };

        debug!("Parsed query {:?} as {:?}", line, request);
        request
    }

    fn parse_pair(&self, form: &Regex, line: &str) -> Option<Criterion> {
        let caps = form.captures(line)?;
        let value = strip_quotes(caps[2].trim());
        if value.is_empty() {
            return None;
        }
        let field = resolve_field(&caps[1], &self.known_fields);
        Some(Criterion::equals(field, value))
    }

    fn parse_bare_pair(&self, line: &str) -> Option<Criterion> {
        if line.contains(['"', '\'']) || SELECT_OR_WHERE.is_match(line) {
            return None;
        }
        let mut tokens = line.split_whitespace();
        let (field, value) = (tokens.next()?, tokens.next()?);
        if tokens.next().is_some() {
            return None;
        }
        Some(Criterion::equals(
            resolve_field(field, &self.known_fields),
            value,
        ))
    }

    fn parse_select_where(&self, line: &str) -> QueryRequest {
        let tokens = tokenize(line);
        let mut mode = ClauseMode::Criteria;
        let mut projection: Vec<String> = Vec::new();
        let mut criteria = Vec::new();

        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i].as_str();
            let keyword = token.to_lowercase();

            if i == 0 && keyword == "select" {
                mode = ClauseMode::Projection;
                i += 1;
                continue;
            }
            if keyword == "where" {
                mode = ClauseMode::Criteria;
                i += 1;
                continue;
            }
            if keyword == "from" {
                if mode == ClauseMode::Projection {
                    mode = ClauseMode::Source;
                }
                i += 1;
                continue;
            }

            match mode {
                ClauseMode::Projection => {
                    for part in token.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                        let field = resolve_field(part, &self.known_fields);
                        if !projection.contains(&field) {
                            projection.push(field);
                        }
                    }
                }
                ClauseMode::Source => {}
                ClauseMode::Criteria => {
                    if is_recognized(token, &self.known_fields) {
                        if let Some((criterion, next)) = self.take_criterion(&tokens, i) {
                            criteria.push(criterion);
                            i = next;
                            continue;
                        }
                    }
                }
            }
            i += 1;
        }

        QueryRequest::Match {
            criteria,
            projection: if projection.is_empty() {
                None
            } else {
                Some(projection)
            },
        }
    }

    /// Reads `field [op] value` starting at `start`, returning the criterion
    /// and the index after it
    fn take_criterion(&self, tokens: &[String], start: usize) -> Option<(Criterion, usize)> {
        let field = resolve_field(&tokens[start], &self.known_fields);
        let mut next = start + 1;
        let mut op = Operator::Equals;

        if let Some(symbol) = tokens.get(next).and_then(|t| Operator::from_symbol(t)) {
            op = symbol;
            next += 1;
        }

        let value = tokens.get(next)?;
        Some((Criterion::new(field, op, strip_quotes(value)), next + 1))
    }
}

fn is_directive(line: &str) -> bool {
    DIRECTIVES
        .iter()
        .any(|directive| line.eq_ignore_ascii_case(directive))
}

fn parse_natural_language(line: &str) -> Option<Criterion> {
    NATURAL_PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.regex.captures(line)?;
        let value = strip_quotes(caps[1].trim());
        if value.is_empty() {
            return None;
        }
        let op = match pattern.kind {
            PhraseKind::AtLeast => Operator::GreaterOrEqual,
            PhraseKind::Substring => Operator::Contains,
        };
        Some(Criterion::new(pattern.field, op, value))
    })
}

/// Splits on whitespace outside of quoted substrings; quote characters
/// are dropped
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        match ch {
            '"' | '\'' if quote.is_none() => quote = Some(ch),
            c if Some(c) == quote => quote = None,
            c if c.is_whitespace() && quote.is_none() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Removes one pair of matching surrounding quotes
fn strip_quotes(value: &str) -> String {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> QueryParser {
        QueryParser::new(vec![
            "city".to_string(),
            "name".to_string(),
            "products".to_string(),
            "products.mq".to_string(),
            "revenue_2024".to_string(),
            "sector".to_string(),
            "Region".to_string(),
        ])
    }

    fn single(request: QueryRequest) -> Criterion {
        match request {
            QueryRequest::Match {
                mut criteria,
                projection: None,
            } if criteria.len() == 1 => criteria.remove(0),
            other => panic!("expected a single criterion, got {:?}", other),
        }
    }

    #[test]
    fn test_directives() {
        for line in ["show fields", "FIELDS", "  List Fields  "] {
            assert_eq!(parser().parse(line), QueryRequest::ListFields);
        }
        assert_ne!(parser().parse("show field"), QueryRequest::ListFields);
    }

    #[test]
    fn test_colon_form() {
        let c = single(parser().parse("city:Atlanta"));
        assert_eq!(c, Criterion::equals("city", "Atlanta"));

        let c = single(parser().parse(r#"company: "Acme Corp""#));
        assert_eq!(c, Criterion::equals("name", "Acme Corp"));

        let c = single(parser().parse("products.mq:true"));
        assert_eq!(c, Criterion::equals("products.mq", "true"));
    }

    #[test]
    fn test_equals_form() {
        assert_eq!(
            single(parser().parse("sector = Financial Services")),
            Criterion::equals("sector", "Financial Services")
        );
        assert_eq!(
            single(parser().parse("sector=Retail")),
            Criterion::equals("sector", "Retail")
        );
        assert_eq!(
            single(parser().parse("city == Atlanta")),
            Criterion::equals("city", "Atlanta")
        );
    }

    #[test]
    fn test_bare_two_tokens() {
        assert_eq!(
            single(parser().parse("city Marietta")),
            Criterion::equals("city", "Marietta")
        );
        assert_eq!(
            single(parser().parse("region southeast")),
            Criterion::equals("Region", "southeast")
        );
        // Unknown attributes stay literal and simply never match
        assert_eq!(
            single(parser().parse("color blue")),
            Criterion::equals("color", "blue")
        );
    }

    #[test]
    fn test_bare_form_rejects_keywords_and_quotes() {
        let request = parser().parse("where city");
        assert_eq!(request.criteria().len(), 0);
        let request = parser().parse(r#"city "Atlanta""#);
        assert_eq!(request.criteria(), &[Criterion::equals("city", "Atlanta")]);
    }

    #[test]
    fn test_natural_language() {
        assert_eq!(
            single(parser().parse("companies with revenue over 45000")),
            Criterion::new("revenue_2024", Operator::GreaterOrEqual, "45000")
        );
        assert_eq!(
            single(parser().parse("companies with growth over 10%")),
            Criterion::new("growth", Operator::GreaterOrEqual, "10")
        );
        assert_eq!(
            single(parser().parse("who uses mq")),
            Criterion::contains("products", "mq")
        );
        assert_eq!(
            single(parser().parse("Companies in Atlanta Branch")),
            Criterion::contains("branch", "Atlanta")
        );
        assert_eq!(
            single(parser().parse("companies in enterprise coverage")),
            Criterion::contains("coverage", "enterprise")
        );
        assert_eq!(
            single(parser().parse("current tech clients")),
            Criterion::contains("tech_client", "current")
        );
        assert_eq!(
            single(parser().parse("companies with cics product")),
            Criterion::contains("products", "cics")
        );
        assert_eq!(
            single(parser().parse("companies in banking industry")),
            Criterion::contains("industry", "banking")
        );
    }

    #[test]
    fn test_specific_phrases_win_over_general() {
        assert_eq!(
            single(parser().parse("companies in retail sector")),
            Criterion::contains("sector", "retail")
        );
        assert_eq!(
            single(parser().parse("companies in Atlanta, GA")),
            Criterion::contains("location", "Atlanta, GA")
        );
    }

    #[test]
    fn test_select_where() {
        let request = parser().parse(r#"select name, city from customers where sector "Financial Services""#);
        assert_eq!(
            request,
            QueryRequest::Match {
                criteria: vec![Criterion::equals("sector", "Financial Services")],
                projection: Some(vec!["name".to_string(), "city".to_string()]),
            }
        );
    }

    #[test]
    fn test_select_where_with_operator() {
        let request = parser().parse("select name where revenue >= 45000 and city Atlanta");
        assert_eq!(
            request.criteria(),
            &[
                Criterion::new("revenue_2024", Operator::GreaterOrEqual, "45000"),
                Criterion::equals("city", "Atlanta"),
            ]
        );
        assert_eq!(request.projection(), Some(&["name".to_string()][..]));
    }

    #[test]
    fn test_select_resolves_aliases_and_literals() {
        let request = parser().parse(r#"select "tech client" REGION shoe_size"#);
        assert_eq!(
            request.projection(),
            Some(
                &[
                    "tech_client".to_string(),
                    "Region".to_string(),
                    "shoe_size".to_string()
                ][..]
            )
        );
        assert!(request.criteria().is_empty());
    }

    #[test]
    fn test_unparseable_fails_open() {
        for line in ["", "hello there everyone", "what is going on"] {
            assert_eq!(parser().parse(line), QueryRequest::everything());
        }
    }

    #[test]
    fn test_tokenize_respects_quotes() {
        assert_eq!(
            tokenize(r#"where name "Acme Corp" city 'Johns Creek'"#),
            vec!["where", "name", "Acme Corp", "city", "Johns Creek"]
        );
        assert_eq!(strip_quotes("'x'"), "x");
        assert_eq!(strip_quotes("\"x"), "\"x");
    }
}
