//! Error types for `cupmate-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("participant identity must not be empty")]
  EmptyParticipant,

  /// An opt-in carried neither a handle nor any name part.
  #[error("opt-in from voter {voter_id} has neither a handle nor a name")]
  MalformedResponse { voter_id: i64 },

  #[error("round not found: {0}")]
  RoundNotFound(Uuid),

  #[error("no round has been opened yet")]
  NoRounds,

  #[error("round {0} is already closed")]
  RoundAlreadyClosed(Uuid),

  #[error("round {0} is still open; close it first")]
  RoundStillOpen(Uuid),

  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error. Any store failure is fatal for the operation.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StoreUnavailable(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
