use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use super::matcher::{matches_all, CompiledCriterion};
use super::parser::QueryParser;
use super::QueryRequest;
use crate::config::QueryConfig;
use crate::fields::{description, example_query, infer_type};
use crate::records::{CustomerSet, Record};
use crate::results::{FieldInfo, ResultSet};

/// What a query produced
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// Field guide for a directive request
    Fields(Vec<FieldInfo>),
    /// Matched records for a criteria request
    Records(ResultSet),
}

/// Evaluates a request against the snapshot on the calling thread
pub fn execute(customers: &CustomerSet, request: &QueryRequest) -> QueryOutcome {
    run_request(customers, request, None, usize::MAX)
}

/// Runs queries against one loaded snapshot.
///
/// Owns the parser (which knows the snapshot's attribute names) and, for
/// large collections, a thread pool used to filter records in parallel.
pub struct QueryEngine<'a> {
    customers: &'a CustomerSet,
    parser: QueryParser,
    pool: Option<ThreadPool>,
    parallel_threshold: usize,
}

impl<'a> QueryEngine<'a> {
    pub fn new(customers: &'a CustomerSet, config: &QueryConfig) -> Self {
        let threads = config.thread_count.get();
        let pool = if threads > 1 && customers.len() >= config.parallel_threshold {
            match ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!("Falling back to sequential matching: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            customers,
            parser: QueryParser::for_customers(customers),
            pool,
            parallel_threshold: config.parallel_threshold,
        }
    }

    pub fn customers(&self) -> &CustomerSet {
        self.customers
    }

    pub fn parser(&self) -> &QueryParser {
        &self.parser
    }

    /// Parses and evaluates one line of query text
    pub fn run(&self, line: &str) -> QueryOutcome {
        info!("Running query: {}", line.trim());
        let request = self.parser.parse(line);
        self.execute(&request)
    }

    pub fn execute(&self, request: &QueryRequest) -> QueryOutcome {
        run_request(
            self.customers,
            request,
            self.pool.as_ref(),
            self.parallel_threshold,
        )
    }
}

fn run_request(
    customers: &CustomerSet,
    request: &QueryRequest,
    pool: Option<&ThreadPool>,
    parallel_threshold: usize,
) -> QueryOutcome {
    match request {
        QueryRequest::ListFields => QueryOutcome::Fields(field_guide(customers)),
        QueryRequest::Match {
            criteria,
            projection,
        } => {
            let compiled: Vec<CompiledCriterion> =
                criteria.iter().cloned().map(CompiledCriterion::new).collect();
            for c in &compiled {
                debug!("Criterion {} uses {:?}", c.criterion, c.strategy);
            }

            let matched = match pool {
                Some(pool) if customers.len() >= parallel_threshold => {
                    debug!("Matching {} records in parallel", customers.len());
                    pool.install(|| filter_parallel(customers.records(), &compiled))
                }
                _ => customers
                    .iter()
                    .filter(|record| matches_all(&compiled, record))
                    .cloned()
                    .collect(),
            };

            info!(
                "Query matched {} of {} records",
                matched.len(),
                customers.len()
            );
            QueryOutcome::Records(ResultSet::new(matched, projection.clone()))
        }
    }
}

// Indexed parallel collect keeps collection order
fn filter_parallel(records: &[Record], criteria: &[CompiledCriterion]) -> Vec<Record> {
    records
        .par_iter()
        .filter(|record| matches_all(criteria, record))
        .cloned()
        .collect()
}

fn field_guide(customers: &CustomerSet) -> Vec<FieldInfo> {
    customers
        .field_names()
        .into_iter()
        .map(|name| {
            let sample = customers.sample(&name);
            FieldInfo {
                kind: infer_type(sample.as_ref()).to_string(),
                description: description(&name).to_string(),
                example: example_query(&name, sample.as_ref()),
                name,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    fn customers() -> CustomerSet {
        CustomerSet::from_json_str(
            r#"[
                {"name": "Acme Corp", "city": "Atlanta", "state": "GA", "revenue_2024": 50000},
                {"name": "Globex", "city": "Johns Creek", "state": "GA", "revenue_2024": 75000},
                {"name": "Initech", "city": "Marietta", "state": "GA", "revenue_2024": "n/a"}
            ]"#,
        )
        .unwrap()
    }

    fn names(outcome: &QueryOutcome) -> Vec<String> {
        match outcome {
            QueryOutcome::Records(results) => results
                .matched
                .iter()
                .filter_map(|r| r.text("name"))
                .collect(),
            QueryOutcome::Fields(_) => panic!("expected records"),
        }
    }

    #[test]
    fn test_run_preserves_order() {
        let set = customers();
        let engine = QueryEngine::new(&set, &QueryConfig::default());
        let outcome = engine.run("state:GA");
        assert_eq!(names(&outcome), vec!["Acme Corp", "Globex", "Initech"]);
    }

    #[test]
    fn test_run_numeric_threshold() {
        let set = customers();
        let engine = QueryEngine::new(&set, &QueryConfig::default());
        let outcome = engine.run("companies with revenue over 60000");
        assert_eq!(names(&outcome), vec!["Globex"]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let set = customers();
        let config = QueryConfig {
            thread_count: NonZeroUsize::new(2).unwrap(),
            parallel_threshold: 1,
            ..QueryConfig::default()
        };
        let engine = QueryEngine::new(&set, &config);
        assert!(engine.pool.is_some());
        let parallel = engine.run("city:creek");
        let sequential = execute(&set, &engine.parser().parse("city:creek"));
        assert_eq!(names(&parallel), names(&sequential));
        assert_eq!(names(&parallel), vec!["Globex"]);
    }

    #[test]
    fn test_field_guide_is_sorted() {
        let set = customers();
        match execute(&set, &QueryRequest::ListFields) {
            QueryOutcome::Fields(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["city", "name", "revenue_2024", "state"]);
                assert_eq!(fields[2].kind, "number");
            }
            QueryOutcome::Records(_) => panic!("expected fields"),
        }
    }

    #[test]
    fn test_projection_applied() {
        let set = customers();
        let engine = QueryEngine::new(&set, &QueryConfig::default());
        match engine.run("select name where city Marietta") {
            QueryOutcome::Records(results) => {
                assert_eq!(results.total(), 1);
                let rows = results.rows();
                assert_eq!(rows[0].fields().len(), 1);
                assert_eq!(rows[0].text("name").as_deref(), Some("Initech"));
            }
            QueryOutcome::Fields(_) => panic!("expected records"),
        }
    }
}
