//! Wiring for the `campus` binary: configuration, first-run bootstrap and
//! the top-level router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use campus_core::{
  Error,
  profile::AdminInput,
  provision::Provisioner,
  secret::{Argon2Hasher, SecretHasher},
  store::CampusStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `campus.toml` and
/// `CAMPUS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  #[serde(default)]
  pub hash:             HashConfig,
  /// Seeded as the first Admin when the store holds no identities.
  pub bootstrap_admin:  Option<BootstrapAdmin>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("campus.db") }

/// argon2id cost parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct HashConfig {
  pub memory_kib:  u32,
  pub iterations:  u32,
  pub parallelism: u32,
}

impl Default for HashConfig {
  fn default() -> Self { Self { memory_kib: 19 * 1024, iterations: 2, parallelism: 1 } }
}

impl HashConfig {
  pub fn hasher(&self) -> anyhow::Result<Argon2Hasher> {
    Ok(Argon2Hasher::with_cost(self.memory_kib, self.iterations, self.parallelism)?)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdmin {
  pub admin_id:       String,
  pub name:           String,
  pub email:          String,
  pub personal_email: String,
  pub password:       String,
}

impl ServerConfig {
  /// Layer `path` (optional) under `CAMPUS_*` environment variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("CAMPUS")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Assembly ────────────────────────────────────────────────────────────────

pub fn provisioner<S>(store: S, hasher: Argon2Hasher) -> Provisioner<S>
where
  S: CampusStore,
  Error: From<S::Error>,
{
  let hasher: Arc<dyn SecretHasher> = Arc::new(hasher);
  Provisioner::new(Arc::new(store), hasher)
}

/// Create the configured bootstrap admin if no identity exists yet.
/// Returns whether an admin was created.
pub async fn bootstrap<S>(
  provisioner: &Provisioner<S>,
  admin: Option<&BootstrapAdmin>,
) -> anyhow::Result<bool>
where
  S: CampusStore,
  Error: From<S::Error>,
{
  let Some(admin) = admin else {
    return Ok(false);
  };
  let existing = provisioner.store().count_identities().await.map_err(Error::from)?;
  if existing > 0 {
    tracing::debug!(existing, "store already populated; skipping bootstrap admin");
    return Ok(false);
  }

  let created = provisioner
    .create_admin(AdminInput {
      admin_id:       Some(admin.admin_id.clone()),
      name:           Some(admin.name.clone()),
      email:          Some(admin.email.clone()),
      password:       Some(admin.password.clone()),
      personal_email: Some(admin.personal_email.clone()),
      phone:          None,
    })
    .await?;
  tracing::info!(admin_id = %created.admin_id, login = %admin.email, "bootstrap admin created");
  Ok(true)
}

/// The full HTTP application: the API under `/api/v1` with request tracing.
pub fn app<S>(provisioner: Provisioner<S>) -> Router
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  Router::new()
    .nest("/api/v1", campus_api::api_router(provisioner))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use campus_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn cheap() -> Argon2Hasher { Argon2Hasher::with_cost(1024, 1, 1).unwrap() }

  fn admin() -> BootstrapAdmin {
    BootstrapAdmin {
      admin_id:       "A1".into(),
      name:           "Head".into(),
      email:          "head@school.com".into(),
      personal_email: "head@example.com".into(),
      password:       "hunter22".into(),
    }
  }

  #[test]
  fn tilde_expands_to_home() {
    let home = std::env::var("HOME").unwrap_or_default();
    if home.is_empty() {
      return;
    }
    assert_eq!(expand_tilde(Path::new("~/campus.db")), PathBuf::from(home).join("campus.db"));
    assert_eq!(expand_tilde(Path::new("/var/campus.db")), PathBuf::from("/var/campus.db"));
  }

  #[test]
  fn config_file_with_defaults() {
    let path = std::env::temp_dir().join(format!("campus-{}.toml", std::process::id()));
    std::fs::write(
      &path,
      r#"
port = 9000

[bootstrap_admin]
admin_id = "A1"
name = "Head"
email = "head@school.com"
personal_email = "head@example.com"
password = "hunter22"
"#,
    )
    .unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.store_path, PathBuf::from("campus.db"));
    assert_eq!(cfg.hash.iterations, 2);
    assert_eq!(cfg.bootstrap_admin.unwrap().email, "head@school.com");
    std::fs::remove_file(&path).ok();
  }

  #[test]
  fn missing_config_file_is_all_defaults() {
    let cfg = ServerConfig::load(Path::new("does-not-exist.toml")).unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert!(cfg.bootstrap_admin.is_none());
  }

  #[tokio::test]
  async fn bootstrap_runs_once() {
    let p = provisioner(SqliteStore::open_in_memory().await.unwrap(), cheap());
    let admin = admin();

    assert!(!bootstrap(&p, None).await.unwrap());
    assert!(bootstrap(&p, Some(&admin)).await.unwrap());
    assert!(!bootstrap(&p, Some(&admin)).await.unwrap());
    assert_eq!(p.store().count_identities().await.unwrap(), 1);
    p.authenticate("head@school.com", "hunter22").await.unwrap();
  }

  #[tokio::test]
  async fn api_is_nested_under_v1() {
    let p = provisioner(SqliteStore::open_in_memory().await.unwrap(), cheap());
    bootstrap(&p, Some(&admin())).await.unwrap();
    let app = app(p);

    let login = Request::builder()
      .method("POST")
      .uri("/api/v1/auth/login")
      .header("content-type", "application/json")
      .body(Body::from(r#"{"email":"head@school.com","password":"hunter22"}"#))
      .unwrap();
    assert_eq!(app.clone().oneshot(login).await.unwrap().status(), StatusCode::OK);

    let unnested = Request::builder().uri("/students").body(Body::empty()).unwrap();
    assert_eq!(app.oneshot(unnested).await.unwrap().status(), StatusCode::NOT_FOUND);
  }
}
