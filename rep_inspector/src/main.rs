use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use rep_core::{load_store_config_from_env, JsonWorkbookTable, ReputationStore, StoreConfig};
use tracing::{info, warn};

mod app;

use app::{describe_expected, execute, render_text, Command, ErrorReply};

#[derive(Parser, Debug)]
#[command(author, version, about = "Reputation workbook inspector", long_about = None)]
struct Cli {
    /// Path to the JSON workbook holding the reputation and band sheets.
    #[arg(long)]
    workbook: PathBuf,
    /// Store configuration file (defaults to REPUTATION_CONFIG_PATH or the builtin copy).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print replies as JSON instead of text.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Arc::new(
            StoreConfig::from_file(path)
                .wrap_err_with(|| format!("Failed to load store config {}", path.display()))?,
        ),
        None => load_store_config_from_env().0,
    };

    let table = JsonWorkbookTable::open(&cli.workbook)
        .wrap_err_with(|| format!("Failed to open workbook {}", cli.workbook.display()))?;
    info!(workbook = %cli.workbook.display(), "inspector.workbook_opened");
    let store = ReputationStore::new(table, config);

    match execute(&store, &cli.command) {
        Ok(reply) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else {
                println!("{}", render_text(&reply));
            }
            Ok(())
        }
        Err(err) if err.is_expected() => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ErrorReply::from_error(&err))?
                );
            } else {
                println!("{}", describe_expected(&err));
            }
            Ok(())
        }
        Err(err) => {
            warn!(kind = ?err.kind(), error = %err, "inspector.command_failed");
            Err(err).wrap_err("Command failed")
        }
    }
}
