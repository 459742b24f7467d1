//! `campus` server binary.
//!
//! Reads `campus.toml` (or the path given with `--config`) layered under
//! `CAMPUS_*` environment variables, opens the SQLite store and either
//! serves the JSON API or runs a one-off maintenance task.

use std::path::PathBuf;

use anyhow::Context as _;
use campus_server::{ServerConfig, app, bootstrap, expand_tilde, provisioner};
use campus_store_sqlite::SqliteStore;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Campus identity and profile provisioning server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "campus.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Default)]
enum Command {
  /// Serve the HTTP API (the default).
  #[default]
  Serve,
  /// Delete identities that no profile references, then exit.
  Sweep,
  /// Print profiles whose course labels no longer match the catalog.
  Drift,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let provisioner = provisioner(store, cfg.hash.hasher().context("invalid hash parameters")?);

  match cli.command.unwrap_or_default() {
    Command::Serve => {
      bootstrap(&provisioner, cfg.bootstrap_admin.as_ref())
        .await
        .context("failed to create bootstrap admin")?;

      let address = cfg.address();
      tracing::info!("Listening on http://{address}");
      let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
      axum::serve(listener, app(provisioner)).await.context("server error")?;
    }
    Command::Sweep => {
      let removed = provisioner.sweep_orphans().await?;
      for identity in &removed {
        println!("{}\t{}\t{}", identity.identity_id, identity.role, identity.login_key);
      }
      tracing::info!(removed = removed.len(), "orphan sweep finished");
    }
    Command::Drift => {
      let drift = provisioner.catalog_drift().await?;
      println!("{}", serde_json::to_string_pretty(&drift)?);
    }
  }

  Ok(())
}
