use std::io::{BufRead, Write};

use colored::Colorize;
use tracing::{debug, info};

use super::engine::{QueryEngine, QueryOutcome};
use crate::errors::QueryResult;
use crate::report::{format_outcome, ReportOptions};

pub const PROMPT: &str = "query> ";

pub const HELP_TEXT: &str = "\
Example queries:
  show fields                          list queryable fields
  city:Atlanta                         field:value (substring for text fields)
  sector = Financial Services          field = value
  state GA                             field value
  companies in Atlanta branch          branch / territory
  companies in enterprise coverage     coverage
  companies with revenue over 45000    2024 revenue at least N
  companies with growth over 10%       growth at least N percent
  who uses mq                          product usage
  current tech clients                 tech client status
  companies in banking industry        industry
  select name, city where revenue >= 100000 and state GA
Type 'exit' to quit.";

/// What the session does with one input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Exit,
    Help,
    Skip,
    Query,
}

impl SessionCommand {
    pub fn classify(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Self::Skip
        } else if line.eq_ignore_ascii_case("exit") {
            Self::Exit
        } else if line.eq_ignore_ascii_case("help") {
            Self::Help
        } else {
            Self::Query
        }
    }
}

/// Statistics for one interactive session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub queries_run: usize,
    pub empty_results: usize,
    pub field_listings: usize,
}

/// Line-driven query loop over a loaded snapshot.
///
/// Reads one query per line until `exit` or end of input, writing each
/// report to `output`. Works the same on a terminal and on piped input.
pub struct InteractiveSession<'e, 'a> {
    engine: &'e QueryEngine<'a>,
    options: ReportOptions,
    use_color: bool,
}

impl<'e, 'a> InteractiveSession<'e, 'a> {
    pub fn new(engine: &'e QueryEngine<'a>, options: ReportOptions, use_color: bool) -> Self {
        Self {
            engine,
            options,
            use_color,
        }
    }

    pub fn run<R: BufRead, W: Write>(&self, mut input: R, output: &mut W) -> QueryResult<SessionStats> {
        let mut stats = SessionStats::default();
        let banner = format!(
            "Loaded {} customer records. Type a query, 'help' for examples, or 'exit' to quit.",
            self.engine.customers().len()
        );
        writeln!(output, "{}", self.paint_heading(&banner))?;

        let mut line = String::new();
        loop {
            write!(output, "{}", self.paint_prompt())?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                debug!("End of input, closing session");
                writeln!(output)?;
                break;
            }

            match SessionCommand::classify(&line) {
                SessionCommand::Exit => break,
                SessionCommand::Skip => continue,
                SessionCommand::Help => writeln!(output, "{}", HELP_TEXT)?,
                SessionCommand::Query => {
                    let outcome = self.engine.run(&line);
                    stats.queries_run += 1;
                    match &outcome {
                        QueryOutcome::Fields(_) => stats.field_listings += 1,
                        QueryOutcome::Records(results) if results.is_empty() => {
                            stats.empty_results += 1
                        }
                        QueryOutcome::Records(_) => {}
                    }
                    writeln!(output, "{}\n", format_outcome(&outcome, &self.options))?;
                }
            }
        }

        info!(
            "Session finished: {} queries, {} with no results",
            stats.queries_run, stats.empty_results
        );
        Ok(stats)
    }

    fn paint_prompt(&self) -> String {
        if self.use_color {
            PROMPT.bright_blue().bold().to_string()
        } else {
            PROMPT.to_string()
        }
    }

    fn paint_heading(&self, text: &str) -> String {
        if self.use_color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryConfig;
    use crate::records::CustomerSet;
    use std::io::Cursor;

    fn run_session(input: &str) -> (String, SessionStats) {
        let set = CustomerSet::from_json_str(
            r#"[{"name": "Acme Corp", "city": "Atlanta", "sector": "Financial Services"}]"#,
        )
        .unwrap();
        let engine = QueryEngine::new(&set, &QueryConfig::default());
        let session = InteractiveSession::new(&engine, ReportOptions::default(), false);
        let mut output = Vec::new();
        let stats = session.run(Cursor::new(input), &mut output).unwrap();
        (String::from_utf8(output).unwrap(), stats)
    }

    #[test]
    fn test_classify() {
        assert_eq!(SessionCommand::classify("  EXIT \n"), SessionCommand::Exit);
        assert_eq!(SessionCommand::classify("Help"), SessionCommand::Help);
        assert_eq!(SessionCommand::classify("   "), SessionCommand::Skip);
        assert_eq!(SessionCommand::classify("exit now"), SessionCommand::Query);
    }

    #[test]
    fn test_session_stops_at_exit() {
        let (output, stats) = run_session("city:Atlanta\n\nexit\ncity:Marietta\n");
        assert!(output.contains("Loaded 1 customer records."));
        assert!(output.contains("1. Acme Corp"));
        assert!(!output.contains("No customers found"));
        assert_eq!(stats.queries_run, 1);
    }

    #[test]
    fn test_session_runs_until_eof() {
        let (output, stats) = run_session("help\nshow fields\ncity:Marietta");
        assert!(output.contains("Example queries:"));
        assert!(output.contains("Available fields (3):"));
        assert!(output.contains("No customers found matching the criteria."));
        assert_eq!(
            stats,
            SessionStats {
                queries_run: 2,
                empty_results: 1,
                field_listings: 1,
            }
        );
    }
}
