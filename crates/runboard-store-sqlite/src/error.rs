//! Error type for `runboard-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored or supplied integer does not fit the target type.
  #[error("integer out of range for {column}: {value}")]
  OutOfRange { column: &'static str, value: String },

  #[error("corrupt row: {0}")]
  Corrupt(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for runboard_core::Error {
  fn from(e: Error) -> Self { runboard_core::Error::persistence(e) }
}
