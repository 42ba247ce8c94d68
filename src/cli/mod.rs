//! Command-line interface for clusterm
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and command-line overrides
//! - One-shot subcommands (version, completion scripts, config, history)

pub mod completion;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, LogLevel};
use crate::error::Result;
use crate::history::ContextStore;
use crate::repl::{format_records, format_summary};

/// clusterm - completion, history and validation for kubectl and helm
#[derive(Parser, Debug)]
#[command(
    name = "clusterm",
    version,
    about = "Interactive command assistance for kubectl and helm",
    long_about = "An interactive prompt that completes kubectl and helm commands from their
grammar, live cluster resources and a per-context command history. Accepted
commands are printed to stdout; clusterm never runs them itself."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Cluster to start in
    #[arg(long, value_name = "NAME")]
    pub cluster: Option<String>,

    /// Namespace to start in
    #[arg(short = 'n', long, value_name = "NAME")]
    pub namespace: Option<String>,

    /// History file path
    #[arg(long, value_name = "FILE")]
    pub history_file: Option<PathBuf>,

    /// Keep history in memory only
    #[arg(long)]
    pub no_history: bool,

    /// Do not query the cluster for resource names
    #[arg(long)]
    pub offline: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Quiet mode (minimal output)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands for clusterm
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version,

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Inspect the command history without starting the shell
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

/// History inspection actions; all but `summary` apply to the selected
/// cluster and namespace
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    /// Command counts per cluster and namespace
    Summary,

    /// Every command of the context
    List,

    /// Most used commands
    Frequent {
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },

    /// Most recently used commands
    Recent {
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },

    /// Search text, descriptions and tags
    Search {
        #[arg(value_name = "QUERY")]
        query: String,
    },
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        let args = CliArgs::parse();
        let config = Self::load_config(&args)?;

        Ok(Self { args, config })
    }

    /// Load configuration from file and merge with arguments
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;

        if let Err(e) = config.validate() {
            eprintln!("Warning: Configuration validation failed: {}", e);
            eprintln!("Using default configuration instead.");
            config = Config::default();
        }

        Self::apply_args_to_config(&mut config, args);

        Ok(config)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Whether ANSI colors should be used
    pub fn color_enabled(&self) -> bool {
        !self.args.no_color
    }

    /// Apply CLI arguments to configuration
    ///
    /// Overrides configuration values with CLI arguments where provided
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        Self::apply_history_args(config, args);
        Self::apply_logging_args(config, args);

        if args.offline {
            config.cache.live_fetch = false;
        }
    }

    /// Apply history and context CLI arguments to configuration
    fn apply_history_args(config: &mut Config, args: &CliArgs) {
        if let Some(cluster) = &args.cluster {
            config.history.cluster = cluster.clone();
        }
        if let Some(namespace) = &args.namespace {
            config.history.namespace = namespace.clone();
        }
        if let Some(path) = &args.history_file {
            config.history.file_path = path.clone();
        }
        if args.no_history {
            config.history.persist = false;
        }
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// Handle subcommands
    ///
    /// # Returns
    /// * `Result<bool>` - True if subcommand was handled, false to continue
    pub fn handle_subcommand(&self) -> Result<bool> {
        match &self.args.command {
            Some(Commands::Version) => {
                self.show_version();
                Ok(true)
            }
            Some(Commands::Completion { shell }) => {
                completion::generate_completion(shell)?;
                Ok(true)
            }
            Some(Commands::Config { show, validate }) => {
                self.handle_config_command(*show, *validate)?;
                Ok(true)
            }
            Some(Commands::History { action }) => {
                println!("{}", self.render_history(action));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Show version information
    fn show_version(&self) {
        println!("clusterm version {}", env!("CARGO_PKG_VERSION"));
        println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    }

    /// Handle config subcommand
    ///
    /// # Arguments
    /// * `show` - Whether to show configuration
    /// * `validate` - Whether to validate configuration
    fn handle_config_command(&self, show: bool, validate: bool) -> Result<()> {
        if validate {
            self.validate_config_file();
        }

        if show || !validate {
            self.show_config()?;
        }

        Ok(())
    }

    /// Validate configuration file
    fn validate_config_file(&self) {
        let path = self.get_config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("Configuration file does not exist, defaults apply");
            return;
        }

        match Config::load_from_file(Some(&path)) {
            Ok(config) => match config.validate() {
                Ok(_) => println!("Configuration is valid"),
                Err(e) => println!("Configuration validation failed: {}", e),
            },
            Err(e) => println!("Failed to load configuration: {}", e),
        }
    }

    /// Show effective configuration
    fn show_config(&self) -> Result<()> {
        let path = self.get_config_path();
        println!("# Configuration file: {}", path.display());
        println!();
        println!("{}", self.config.to_toml()?);
        Ok(())
    }

    /// Get configuration file path (from args or default)
    fn get_config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_config_path)
    }

    /// Open the configured history and render one action
    fn render_history(&self, action: &HistoryAction) -> String {
        let history = &self.config.history;
        let tools = self.config.tool_names();
        let mut store = if history.persist {
            ContextStore::open(history.file_path.clone(), tools)
        } else {
            ContextStore::ephemeral(tools)
        };
        store.set_context(&history.cluster, &history.namespace);

        match action {
            HistoryAction::Summary => format_summary(&store.context_summary()),
            HistoryAction::List => {
                let records: Vec<_> = store.get_all().iter().collect();
                format_records(&records)
            }
            HistoryAction::Frequent { limit } => format_records(&store.get_frequent(*limit)),
            HistoryAction::Recent { limit } => format_records(&store.get_recent(*limit)),
            HistoryAction::Search { query } => format_records(&store.search(query)),
        }
    }

    /// Print banner with version and context
    pub fn print_banner(&self) {
        if !self.args.quiet {
            eprintln!(
                "clusterm {} ({}:{}), :help for meta commands",
                env!("CARGO_PKG_VERSION"),
                self.config.history.cluster,
                self.config.history.namespace
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn interface(argv: &[&str]) -> CliInterface {
        let args = CliArgs::try_parse_from(argv).unwrap();
        let mut config = Config::default();
        CliInterface::apply_args_to_config(&mut config, &args);
        CliInterface { args, config }
    }

    #[test]
    fn test_cli_args_parsing() {
        let args = CliArgs::try_parse_from(vec!["clusterm"]).unwrap();
        assert!(args.cluster.is_none());
        assert!(args.namespace.is_none());
        assert!(args.command.is_none());
    }

    #[test]
    fn test_cli_args_with_flags() {
        let args = CliArgs::try_parse_from(vec!["clusterm", "--no-color", "--quiet"]).unwrap();
        assert!(args.no_color);
        assert!(args.quiet);
    }

    #[test]
    fn test_context_overrides() {
        let cli = interface(&["clusterm", "--cluster", "prod", "-n", "web"]);
        assert_eq!(cli.config().history.cluster, "prod");
        assert_eq!(cli.config().history.namespace, "web");
    }

    #[test]
    fn test_history_overrides() {
        let cli = interface(&[
            "clusterm",
            "--history-file",
            "/tmp/h.json",
            "--no-history",
            "--offline",
        ]);
        assert_eq!(cli.config().history.file_path, PathBuf::from("/tmp/h.json"));
        assert!(!cli.config().history.persist);
        assert!(!cli.config().cache.live_fetch);
    }

    #[test]
    fn test_verbosity_overrides() {
        assert_eq!(interface(&["clusterm", "--vv"]).config().logging.level, LogLevel::Trace);
        assert_eq!(interface(&["clusterm", "-v"]).config().logging.level, LogLevel::Debug);
        assert_eq!(interface(&["clusterm", "-q"]).config().logging.level, LogLevel::Error);
    }

    #[test]
    fn test_history_subcommand_parsing() {
        let args =
            CliArgs::try_parse_from(vec!["clusterm", "history", "frequent", "-n", "3"]).unwrap();
        match args.command {
            Some(Commands::History { action }) => {
                assert_eq!(action, HistoryAction::Frequent { limit: 3 })
            }
            other => panic!("unexpected command {:?}", other),
        }

        let args = CliArgs::try_parse_from(vec!["clusterm", "history", "search", "pods"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Commands::History {
                action: HistoryAction::Search { .. }
            })
        ));
    }

    #[test]
    fn test_render_history_reads_selected_context() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        {
            let mut store = ContextStore::open(&path, Default::default());
            store.set_context("prod", "web");
            store.add("kubectl get pods", "", &[]);
            store.set_context("dev", "default");
            store.add("helm list", "", &[]);
        }

        let path_arg = path.to_string_lossy().to_string();
        let cli = interface(&[
            "clusterm",
            "--history-file",
            &path_arg,
            "--cluster",
            "prod",
            "-n",
            "web",
        ]);

        let listed = cli.render_history(&HistoryAction::List);
        assert!(listed.contains("kubectl get pods"));
        assert!(!listed.contains("helm list"));

        let summary = cli.render_history(&HistoryAction::Summary);
        assert!(summary.contains("prod"));
        assert!(summary.contains("dev"));
    }
}
