//! The "has met" relation, derived from the match log.
//!
//! The matrix is a cache. It is rebuilt from the full log on every round and
//! never written back, so a stale copy can't leak into the next pairing.

use std::collections::{HashMap, HashSet};

use crate::{config::EdgePolicy, participant::Participant, record::MatchRecord};

/// Symmetric adjacency over every participant that appears in the log.
///
/// Stored sparsely: cell `(x, y)` is 1 iff `y` is in `x`'s partner set.
#[derive(Debug, Clone, Default)]
pub struct HistoryMatrix {
  met:   HashMap<Participant, HashSet<Participant>>,
  known: HashSet<Participant>,
}

impl HistoryMatrix {
  /// Build the matrix in one pass over `records`.
  ///
  /// Both sides of every record become known participants. Whether the
  /// record also adds an edge is decided by `policy`.
  pub fn build<'a, I>(records: I, policy: EdgePolicy) -> Self
  where
    I: IntoIterator<Item = &'a MatchRecord>,
  {
    let mut matrix = Self::default();
    for record in records {
      matrix.known.insert(record.participant_a.clone());
      matrix.known.insert(record.participant_b.clone());
      if policy.counts(record) {
        matrix.insert_edge(&record.participant_a, &record.participant_b);
      }
    }
    matrix
  }

  fn insert_edge(&mut self, a: &Participant, b: &Participant) {
    if a == b {
      return;
    }
    self.met.entry(a.clone()).or_default().insert(b.clone());
    self.met.entry(b.clone()).or_default().insert(a.clone());
  }

  /// A participant with at least one record in the log.
  pub fn is_known(&self, p: &Participant) -> bool { self.known.contains(p) }

  pub fn has_met(&self, x: &Participant, y: &Participant) -> bool {
    self.met.get(x).is_some_and(|partners| partners.contains(y))
  }

  /// Matrix cell value: 1 if `x` and `y` have met, else 0. The diagonal is 0.
  pub fn weight(&self, x: &Participant, y: &Participant) -> u8 {
    u8::from(self.has_met(x, y))
  }

  /// Number of distinct past partners.
  pub fn degree(&self, p: &Participant) -> usize {
    self.met.get(p).map_or(0, HashSet::len)
  }

  pub fn known(&self) -> impl Iterator<Item = &Participant> {
    self.known.iter()
  }

  /// Number of known participants (the matrix dimension).
  pub fn len(&self) -> usize { self.known.len() }

  pub fn is_empty(&self) -> bool { self.known.is_empty() }

  /// Number of undirected edges.
  pub fn edge_count(&self) -> usize {
    self.met.values().map(HashSet::len).sum::<usize>() / 2
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use uuid::Uuid;

  use super::*;

  fn p(s: &str) -> Participant { Participant::new(s).unwrap() }

  fn record(a: &str, b: &str, confirmed: bool) -> MatchRecord {
    MatchRecord {
      record_id: Uuid::new_v4(),
      round_id: None,
      round_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
      participant_a: p(a),
      participant_b: p(b),
      confirmed,
      confirmed_on: None,
    }
  }

  #[test]
  fn empty_log_gives_empty_matrix() {
    let m = HistoryMatrix::build(std::iter::empty(), EdgePolicy::AnyRecord);
    assert!(m.is_empty());
    assert_eq!(m.edge_count(), 0);
    assert!(!m.is_known(&p("@a")));
  }

  #[test]
  fn edges_are_symmetric_regardless_of_storage_order() {
    let log = vec![record("@a", "@b", true), record("@c", "@a", false)];
    let m = HistoryMatrix::build(&log, EdgePolicy::AnyRecord);

    assert!(m.has_met(&p("@a"), &p("@b")));
    assert!(m.has_met(&p("@b"), &p("@a")));
    assert!(m.has_met(&p("@a"), &p("@c")));
    assert_eq!(m.weight(&p("@c"), &p("@a")), 1);
    assert_eq!(m.weight(&p("@b"), &p("@c")), 0);
    assert_eq!(m.degree(&p("@a")), 2);
    assert_eq!(m.len(), 3);
  }

  #[test]
  fn duplicate_records_form_one_edge() {
    let log = vec![record("@a", "@b", false), record("@b", "@a", true)];
    let m = HistoryMatrix::build(&log, EdgePolicy::AnyRecord);
    assert_eq!(m.edge_count(), 1);
    assert_eq!(m.degree(&p("@b")), 1);
  }

  #[test]
  fn confirmed_only_ignores_pending_but_keeps_participants_known() {
    let log = vec![record("@a", "@b", false), record("@a", "@c", true)];
    let m = HistoryMatrix::build(&log, EdgePolicy::ConfirmedOnly);

    assert!(!m.has_met(&p("@a"), &p("@b")));
    assert!(m.has_met(&p("@a"), &p("@c")));
    assert!(m.is_known(&p("@b")));
  }

  #[test]
  fn self_record_adds_no_edge() {
    let log = vec![record("@a", "@a", true)];
    let m = HistoryMatrix::build(&log, EdgePolicy::AnyRecord);
    assert!(m.is_known(&p("@a")));
    assert_eq!(m.weight(&p("@a"), &p("@a")), 0);
    assert_eq!(m.edge_count(), 0);
  }

  #[test]
  fn rebuild_is_stable() {
    let log = vec![record("@a", "@b", true), record("@b", "@c", false)];
    let first = HistoryMatrix::build(&log, EdgePolicy::AnyRecord);
    let second = HistoryMatrix::build(&log, EdgePolicy::AnyRecord);
    assert_eq!(first.edge_count(), second.edge_count());
    let mut a: Vec<_> = first.known().collect();
    let mut b: Vec<_> = second.known().collect();
    a.sort();
    b.sort();
    assert_eq!(a, b);
  }
}
