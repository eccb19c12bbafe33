//! gatepass server binary.
//!
//! Reads `gatepass.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the JSON API over HTTP.
//!
//! # First run
//!
//! Profiles are created from the command line; the password is read from
//! stdin:
//!
//! ```text
//! gatepass --add-user admin@example.com --role admin --name "Front Office"
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use gatepass_api::{ApiState, auth::hash_password};
use gatepass_core::{
  profile::{NewProfile, Role},
  store::ProfileStore,
};
use gatepass_server::{ServerConfig, build_app};
use gatepass_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
  Admin,
  Staff,
}

impl From<RoleArg> for Role {
  fn from(r: RoleArg) -> Self {
    match r {
      RoleArg::Admin => Role::Admin,
      RoleArg::Staff => Role::Staff,
    }
  }
}

#[derive(Parser)]
#[command(author, version, about = "Visitor log server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "gatepass.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Create a profile with this login email and exit.
  #[arg(long, value_name = "EMAIL")]
  add_user: Option<String>,

  /// Role for `--add-user`. Without one the profile cannot act until a role
  /// is assigned.
  #[arg(long, value_enum, requires = "add_user")]
  role: Option<RoleArg>,

  /// Display name for `--add-user`.
  #[arg(long, requires = "add_user")]
  name: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("GATEPASS").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let api_cfg = server_cfg
    .api_config()
    .with_context(|| format!("invalid utc_offset {:?}", server_cfg.utc_offset))?;

  // Open SQLite store.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: create a profile and exit.
  if let Some(email) = cli.add_user {
    let password = read_password()?;
    let password_hash =
      hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    let profile = store
      .add_profile(NewProfile {
        email,
        full_name: cli.name,
        role: cli.role.map(Role::from),
        password_hash,
      })
      .await
      .context("failed to create profile")?;
    tracing::info!(id = %profile.id, email = %profile.email, "profile created");
    return Ok(());
  }

  let app = build_app(ApiState::new(Arc::new(store), api_cfg));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\n', '\r']).to_string();
  anyhow::ensure!(!password.is_empty(), "password must not be empty");
  Ok(password)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
