use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use custscout::{
    config::CliOverrides, format_outcome, CustomerSet, InteractiveSession, QueryConfig,
    QueryEngine, QueryOutcome, QueryRequest, ReportOptions,
};
use std::{io, num::NonZeroUsize, path::PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JSON file with the customer records
    #[arg(short = 'd', long = "data", global = true)]
    data: Option<PathBuf>,

    /// Configuration file (YAML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Number of threads used to filter large collections
    #[arg(short = 'j', long, global = true)]
    threads: Option<NonZeroUsize>,

    /// Maximum number of customers listed in a report
    #[arg(short = 'n', long, global = true)]
    limit: Option<usize>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single query and print the report
    Query {
        /// Query text, e.g. `city:Atlanta` or `who uses mq`
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Print the result set as JSON instead of a report
        #[arg(long)]
        json: bool,
    },

    /// List the fields available for querying
    Fields {
        /// Print the field list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read queries line by line until `exit` or end of input (default)
    Interactive,

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        data_path: cli.data,
        log_level: cli.log_level,
        thread_count: cli.threads,
        max_detail: cli.limit,
        no_color: cli.no_color,
    };
    let config = QueryConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?
        .merge_with_cli(overrides);

    init_logging(&config.log_level);
    if !config.color {
        colored::control::set_override(false);
    }
    debug!("Effective configuration: {:?}", config);

    let options = ReportOptions::from(&config);

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Query { text, json } => {
            let customers = load_customers(&config)?;
            let engine = QueryEngine::new(&customers, &config);
            let outcome = engine.run(&text.join(" "));
            if json {
                print_json(&outcome)?;
            } else {
                println!("{}", format_outcome(&outcome, &options));
            }
        }
        Commands::Fields { json } => {
            let customers = load_customers(&config)?;
            let engine = QueryEngine::new(&customers, &config);
            let outcome = engine.execute(&QueryRequest::ListFields);
            if json {
                print_json(&outcome)?;
            } else {
                println!("{}", format_outcome(&outcome, &options));
            }
        }
        Commands::Interactive => {
            let customers = load_customers(&config)?;
            let engine = QueryEngine::new(&customers, &config);
            let session = InteractiveSession::new(&engine, options, config.color);
            let stdin = io::stdin();
            let mut stdout = io::stdout().lock();
            session.run(stdin.lock(), &mut stdout)?;
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_customers(config: &QueryConfig) -> Result<CustomerSet> {
    CustomerSet::load(&config.data_path).with_context(|| {
        format!(
            "Failed to load customer data from {}",
            config.data_path.display()
        )
    })
}

fn print_json(outcome: &QueryOutcome) -> Result<()> {
    let value = match outcome {
        QueryOutcome::Fields(fields) => serde_json::to_value(fields)?,
        QueryOutcome::Records(results) => results.to_json(),
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
