//! httpsql - run SQL against an HTTP query endpoint from the command line.

mod cli;

use anyhow::Context;
use cli::Cli;
use httpsql::config::{Config, ConnectionConfig};
use httpsql::db::Database;
use httpsql::error::{HttpSqlError, Result};
use httpsql::logging;
use std::io::Write;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.verbose);

    if let Err(e) = run(&cli).await {
        match e.downcast_ref::<HttpSqlError>() {
            Some(err) => error!("{}: {}", err.category(), err),
            None => error!("{:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let connection = resolve_connection(cli, &config)?;
    info!("Connection: {}", connection.display_string());

    let db = Database::connect(connection.to_client_options()?).await?;

    if cli.exec {
        db.exec(&cli.sql).await?;
        return Ok(());
    }

    let table = db.all(&cli.sql).await?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for row in table.iter() {
        let line = serde_json::to_string(row).context("Failed to serialize row")?;
        writeln!(out, "{line}").context("Failed to write to stdout")?;
    }

    Ok(())
}

/// Resolves the connection with precedence CLI > named connection >
/// default connection > environment.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<ConnectionConfig> {
    let mut connection = match cli.connection_name() {
        Some(name) => config.get_connection(Some(name)).cloned().ok_or_else(|| {
            HttpSqlError::config(format!("Connection '{name}' not found in config file"))
        })?,
        None => config.get_connection(None).cloned().unwrap_or_default(),
    };

    connection.merge(&cli.to_connection_config());
    connection.apply_env_defaults();

    Ok(connection)
}
