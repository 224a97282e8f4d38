//! Error type for reading dataset directories.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot read {path:?}: {source}")]
  Read {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("cannot parse {path:?}: {source}")]
  Parse {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("cannot parse {path:?}: {source}")]
  Csv {
    path:   PathBuf,
    #[source]
    source: csv::Error,
  },

  #[error("dataset directory {0:?} does not exist")]
  MissingDirectory(PathBuf),

  #[error("dataset directory {0:?} holds no table files")]
  NoTables(PathBuf),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
