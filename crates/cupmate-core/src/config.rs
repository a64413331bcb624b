//! Pairing policy, passed explicitly into every engine and round call.

use serde::{Deserialize, Serialize};

use crate::{participant::Participant, record::MatchRecord};

/// Which match records count as "has met" edges in the history matrix.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
  /// Pending and confirmed records both count.
  #[default]
  AnyRecord,
  /// Only meetings somebody reported as having happened count.
  ConfirmedOnly,
}

impl EdgePolicy {
  pub fn counts(self, record: &MatchRecord) -> bool {
    match self {
      Self::AnyRecord => true,
      Self::ConfirmedOnly => record.confirmed,
    }
  }
}

/// How first-time participants are placed.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NewcomerPolicy {
  /// Give each newcomer a random returning partner first; newcomers only meet
  /// each other once the returning pool is used up.
  #[default]
  SpreadAmongKnown,
  /// No special treatment: newcomers join the repeat-avoiding pool, where
  /// they are fresh partners for everybody.
  Pooled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
  /// Injected into odd-sized rounds to make the count even.
  pub fallback_participant: Option<Participant>,
  pub edge_policy:          EdgePolicy,
  pub newcomer_policy:      NewcomerPolicy,
}
