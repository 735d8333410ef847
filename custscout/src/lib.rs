pub mod config;
pub mod errors;
pub mod fields;
pub mod query;
pub mod records;
pub mod report;
pub mod results;

pub use config::{CliOverrides, QueryConfig};
pub use errors::{QueryError, QueryResult};
pub use query::interactive::{InteractiveSession, SessionStats};
pub use query::{Criterion, Operator, QueryEngine, QueryOutcome, QueryParser, QueryRequest};
pub use records::{CustomerSet, Record};
pub use report::{format_outcome, ReportOptions};
pub use results::ResultSet;
