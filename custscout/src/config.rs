use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{QueryError, QueryResult};

/// Settings for a query session.
///
/// # Configuration Locations
///
/// Sources are layered in order of increasing precedence:
/// 1. Global `$HOME/.config/custscout/config.yaml`
/// 2. Local `.custscout.yaml` in the current directory
/// 3. Custom config file specified via `--config`
/// 4. `CUSTSCOUT_*` environment variables (e.g. `CUSTSCOUT_DATA_PATH`)
///
/// Command-line flags are applied last through [`QueryConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// # JSON export produced by the CSV converter
/// data_path: "data/customers.json"
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
///
/// # Threads used to filter large collections
/// thread_count: 4
///
/// # Collections at least this large are filtered in parallel
/// parallel_threshold: 10000
///
/// # Cap on customers listed in the detail block
/// max_detail: 25
///
/// color: true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Path to the JSON document holding the customer records
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Number of threads used to filter large collections
    /// Defaults to number of CPU cores if not specified
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Minimum collection size before matching runs in parallel
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    /// Maximum number of customers listed in the detail block
    #[serde(default)]
    pub max_detail: Option<usize>,

    /// Whether prompts and headings are colored
    #[serde(default = "default_color")]
    pub color: bool,
}

/// Values given on the command line; `None` leaves the loaded value alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub data_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub thread_count: Option<NonZeroUsize>,
    pub max_detail: Option<usize>,
    pub no_color: bool,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("customers.json")
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_parallel_threshold() -> usize {
    10_000
}

fn default_color() -> bool {
    true
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            log_level: default_log_level(),
            thread_count: default_thread_count(),
            parallel_threshold: default_parallel_threshold(),
            max_detail: None,
            color: default_color(),
        }
    }
}

impl QueryConfig {
    /// Loads configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&Path>) -> QueryResult<Self> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(QueryError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        }

        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("custscout/config.yaml")),
            Some(PathBuf::from(".custscout.yaml")),
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        builder = builder.add_source(Environment::with_prefix("CUSTSCOUT").try_parsing(true));

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Applies command-line values over configuration file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(data_path) = cli.data_path {
            self.data_path = data_path;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        if let Some(threads) = cli.thread_count {
            self.thread_count = threads;
        }
        if cli.max_detail.is_some() {
            self.max_detail = cli.max_detail;
        }
        if cli.no_color {
            self.color = false;
        }
        self
    }

    /// Renders the effective configuration as YAML
    pub fn to_yaml(&self) -> QueryResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
