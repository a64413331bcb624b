//! Rounds, votes, pairs and the match log records they turn into.
//!
//! The match log is append-only. A record's only mutable state is its
//! confirmation: `confirmed` flips to `true` once, and `confirmed_on` records
//! the day it did.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::participant::Participant;

// ─── Round ───────────────────────────────────────────────────────────────────

/// One opt-in cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
  pub round_id:  Uuid,
  pub opened_at: DateTime<Utc>,
  pub closed_at: Option<DateTime<Utc>>,
  pub is_closed: bool,
  /// Set in the same transaction that writes the round's pairs.
  pub paired_at: Option<DateTime<Utc>>,
}

impl Round {
  pub fn is_open(&self) -> bool { !self.is_closed }

  pub fn is_paired(&self) -> bool { self.paired_at.is_some() }
}

/// An opt-in held against an open round. A voter holds at most one vote per
/// round; voting again replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
  pub round_id:    Uuid,
  pub voter_id:    i64,
  pub participant: Participant,
  pub voted_at:    DateTime<Utc>,
}

// ─── Pairs ───────────────────────────────────────────────────────────────────

/// Two participants matched for the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
  pub first:  Participant,
  pub second: Participant,
}

impl Pair {
  pub fn new(first: Participant, second: Participant) -> Self {
    Self { first, second }
  }

  pub fn contains(&self, p: &Participant) -> bool {
    &self.first == p || &self.second == p
  }

  /// The other side of the pair, if `p` is in it.
  pub fn partner_of(&self, p: &Participant) -> Option<&Participant> {
    if &self.first == p {
      Some(&self.second)
    } else if &self.second == p {
      Some(&self.first)
    } else {
      None
    }
  }
}

/// The engine's output for one round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
  pub pairs:    Vec<Pair>,
  /// The one candidate left without a partner, if the pool was odd.
  pub leftover: Option<Participant>,
}

impl Pairing {
  pub fn is_empty(&self) -> bool {
    self.pairs.is_empty() && self.leftover.is_none()
  }

  /// Every participant covered by this pairing, pairs first.
  pub fn participants(&self) -> impl Iterator<Item = &Participant> {
    self
      .pairs
      .iter()
      .flat_map(|p| [&p.first, &p.second])
      .chain(self.leftover.as_ref())
  }
}

// ─── Match log ───────────────────────────────────────────────────────────────

/// One historical or pending meeting. `(a, b)` and `(b, a)` denote the same
/// relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
  pub record_id:     Uuid,
  /// `None` for ad-hoc meetings reported outside any recorded pair.
  pub round_id:      Option<Uuid>,
  pub round_date:    NaiveDate,
  pub participant_a: Participant,
  pub participant_b: Participant,
  pub confirmed:     bool,
  pub confirmed_on:  Option<NaiveDate>,
}

impl MatchRecord {
  pub fn involves(&self, p: &Participant) -> bool {
    &self.participant_a == p || &self.participant_b == p
  }

  /// True if this record is about `{x, y}`, in either order.
  pub fn connects(&self, x: &Participant, y: &Participant) -> bool {
    (&self.participant_a == x && &self.participant_b == y)
      || (&self.participant_a == y && &self.participant_b == x)
  }
}

/// Result of confirming a reported meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
  pub record: MatchRecord,
  /// `true` when no pending record matched and a fresh confirmed record was
  /// appended instead.
  pub ad_hoc: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn p(s: &str) -> Participant { Participant::new(s).unwrap() }

  #[test]
  fn record_lookup_is_symmetric() {
    let record = MatchRecord {
      record_id:     Uuid::new_v4(),
      round_id:      None,
      round_date:    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
      participant_a: p("@alice"),
      participant_b: p("@bob"),
      confirmed:     false,
      confirmed_on:  None,
    };
    assert!(record.connects(&p("@alice"), &p("@bob")));
    assert!(record.connects(&p("@bob"), &p("@alice")));
    assert!(!record.connects(&p("@alice"), &p("@carol")));
    assert!(record.involves(&p("@bob")));
  }

  #[test]
  fn pair_partner_lookup() {
    let pair = Pair::new(p("@a"), p("@b"));
    assert_eq!(pair.partner_of(&p("@a")), Some(&p("@b")));
    assert_eq!(pair.partner_of(&p("@b")), Some(&p("@a")));
    assert_eq!(pair.partner_of(&p("@c")), None);
  }

  #[test]
  fn pairing_lists_leftover_last() {
    let pairing = Pairing {
      pairs:    vec![Pair::new(p("@a"), p("@b"))],
      leftover: Some(p("@c")),
    };
    let all: Vec<_> = pairing.participants().map(Participant::as_str).collect();
    assert_eq!(all, ["@a", "@b", "@c"]);
    assert!(!pairing.is_empty());
    assert!(Pairing::default().is_empty());
  }
}
