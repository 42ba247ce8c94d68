//! clusterm - command assistance for kubectl and helm
//!
//! An interactive prompt that completes commands from the tools' grammar,
//! live cluster resources and a history kept per cluster and namespace.
//!
//! # Features
//!
//! - Tab completion for verbs, resources, flags and live object names
//! - Inline hints from history and validation
//! - History partitioned by cluster and namespace, persisted as JSON
//! - Background refresh of resource names
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode; accepted commands are printed to stdout
//! clusterm --cluster prod --namespace web | sh
//! ```

use std::fs::OpenOptions;
use std::sync::Mutex;

use tokio::runtime::Handle;

use clusterm::cache::{FetchSources, LiveResourceCache};
use clusterm::cli::CliInterface;
use clusterm::error::Result;
use clusterm::history::{ContextStore, SharedStore};
use clusterm::repl::ReplEngine;

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Handle subcommands or start the interactive shell
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli)?;

    if cli.handle_subcommand()? {
        return Ok(());
    }

    cli.print_banner();

    run_interactive_mode(&cli).await
}

/// Run the interactive shell until exit or EOF
async fn run_interactive_mode(cli: &CliInterface) -> Result<()> {
    let store = open_store(cli);
    let cache = create_cache(cli);

    let mut repl =
        ReplEngine::new(cli.config(), store, cache)?.with_color(cli.color_enabled());

    // The editor blocks on the terminal; keep it off the runtime's workers
    tokio::task::block_in_place(|| run_repl_loop(&mut repl))?;

    if !cli.args().quiet {
        eprintln!("Goodbye!");
    }
    Ok(())
}

/// Open the history store and select the starting context
fn open_store(cli: &CliInterface) -> SharedStore {
    let history = &cli.config().history;
    let tools = cli.config().tool_names();

    let mut store = if history.persist {
        ContextStore::open(history.file_path.clone(), tools)
    } else {
        ContextStore::ephemeral(tools)
    };
    store.set_context(&history.cluster, &history.namespace);
    tracing::debug!(
        "History holds {} commands in {} contexts",
        store.total_commands(),
        store.contexts().count()
    );

    store.into_shared()
}

/// Create the live resource cache for the starting namespace
fn create_cache(cli: &CliInterface) -> LiveResourceCache {
    let config = cli.config();

    let cache = if config.cache.live_fetch {
        let sources = FetchSources::cli(config.tool_names(), config.cache.fetch_timeout());
        LiveResourceCache::new(&config.cache, sources, Some(Handle::current()))
    } else {
        LiveResourceCache::offline(&config.cache)
    };
    cache.set_namespace(&config.history.namespace);
    cache.refresh_if_needed();

    cache
}

/// Main REPL loop
fn run_repl_loop(repl: &mut ReplEngine) -> Result<()> {
    while repl.is_running() {
        let line = match repl.read_line()? {
            Some(line) => line,
            None => break,
        };
        repl.handle(&line);
    }
    Ok(())
}

/// Initialize logging system based on configuration
///
/// Logs go to stderr, or to the configured file, so stdout carries only
/// accepted commands.
fn initialize_logging(cli: &CliInterface) -> Result<()> {
    let logging = &cli.config().logging;
    let level = logging.level.to_tracing_level();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(cli.color_enabled() && logging.file_path.is_none());

    match &logging.file_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let subscriber = subscriber.with_writer(Mutex::new(file));
            if logging.timestamps {
                subscriber.init();
            } else {
                subscriber.without_time().init();
            }
        }
        None => {
            let subscriber = subscriber.with_writer(std::io::stderr);
            if logging.timestamps {
                subscriber.init();
            } else {
                subscriber.without_time().init();
            }
        }
    }

    Ok(())
}
