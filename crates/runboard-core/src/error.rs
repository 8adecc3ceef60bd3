//! Error types for `runboard-core`.

use thiserror::Error;

use crate::player::PlayerId;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field is missing or cannot be interpreted. Never retried.
  #[error("invalid input: {0}")]
  Validation(String),

  /// The `(referred, referrer)` pair already has a referral visit row.
  ///
  /// Raised by stores from their uniqueness constraint; the reconciler
  /// absorbs it as "already credited".
  #[error("referral of {referred} by {referrer} is already recorded")]
  DuplicateReferral {
    referred: PlayerId,
    referrer: PlayerId,
  },

  /// The underlying store failed. The whole operation was rolled back and
  /// may be retried.
  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  pub fn persistence(
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
  ) -> Self {
    Self::Persistence(source.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
