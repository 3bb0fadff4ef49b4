//! infograph server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `INFOGRAPH__*` environment variables, opens the SQLite store, and serves
//! the JSON API under `/api/v1`.
//!
//! # Secret generation
//!
//! To generate a value for `auth.jwt_secret`:
//!
//! ```
//! cargo run -p infograph-api --bin server -- --generate-secret
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use infograph_api::{AppState, ServerConfig};
use infograph_auth::GoogleVerifier;
use infograph_store_sqlite::SqliteStore;
use rand_core::{OsRng, RngCore};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Infograph research API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print a random 256-bit hex secret for `auth.jwt_secret` and exit.
  #[arg(long)]
  generate_secret: bool,
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

  if cli.generate_secret {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    println!("{}", hex::encode(secret));
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("INFOGRAPH")
        .prefix_separator("__")
        .separator("__"),
    )
    .build()
    .context("failed to read configuration")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.store_path = expand_tilde(&server_cfg.store_path);
  server_cfg.infographic_dir = expand_tilde(&server_cfg.infographic_dir);

  if server_cfg.auth.jwt_secret.is_empty() {
    anyhow::bail!("auth.jwt_secret must be set (see --generate-secret)");
  }

  let verifier =
    GoogleVerifier::new(&server_cfg.auth).context("failed to build identity verifier client")?;

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  let address = server_cfg.address();
  let state = AppState::new(store, verifier, server_cfg);
  let app = infograph_api::app(state);

  tracing::info!("Listening on http://{address}/api/v1");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  if let Ok(rest) = path.strip_prefix("~")
    && let Some(home) = std::env::var_os("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
