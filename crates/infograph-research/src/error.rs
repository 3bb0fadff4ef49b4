//! Error types for `infograph-research`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Store(#[from] infograph_core::Error),

  #[error("failed to render infographic: {0}")]
  Render(String),

  #[error("failed to write {path}: {source}")]
  Write {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
