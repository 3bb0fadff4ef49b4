//! Runtime server configuration, deserialised from `config.toml` and
//! `INFOGRAPH__*` environment variables.

use std::path::PathBuf;

use infograph_auth::AuthConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  #[serde(default = "default_store_path")]
  pub store_path:            PathBuf,
  /// Directory rendered infographics are written to.
  #[serde(default = "default_infographic_dir")]
  pub infographic_dir:       PathBuf,
  pub auth:                  AuthConfig,
  #[serde(default = "default_cors_allow_any_origin")]
  pub cors_allow_any_origin: bool,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8000 }

fn default_store_path() -> PathBuf { PathBuf::from("infograph.db") }

fn default_infographic_dir() -> PathBuf { PathBuf::from("infographics") }

fn default_cors_allow_any_origin() -> bool { true }

impl ServerConfig {
  /// A config with every optional field at its default.
  pub fn new(auth: AuthConfig) -> Self {
    Self {
      host: default_host(),
      port: default_port(),
      store_path: default_store_path(),
      infographic_dir: default_infographic_dir(),
      auth,
      cors_allow_any_origin: default_cors_allow_any_origin(),
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}
