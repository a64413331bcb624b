//! The `MatchStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `cupmate-store-sqlite`).
//! The round workflow in [`crate::rounds`] depends on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  participant::Participant,
  record::{Confirmation, MatchRecord, Pair, Round, Vote},
};

/// Abstraction over the round and match-log store.
///
/// Backends must serialize writes: every method that touches more than one
/// row runs atomically, so a reader never observes half of a round. Domain
/// conditions (round closed, already paired) are reported through return
/// values; `Self::Error` is reserved for the store itself failing.
pub trait MatchStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Rounds ────────────────────────────────────────────────────────────

  /// Open a new round unless one is already open. Returns `None` if another
  /// round is still open.
  fn open_round(
    &self,
    opened_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Round>, Self::Error>> + Send + '_;

  fn get_round(
    &self,
    round_id: Uuid,
  ) -> impl Future<Output = Result<Option<Round>, Self::Error>> + Send + '_;

  /// The most recently opened round, open or not.
  fn latest_round(
    &self,
  ) -> impl Future<Output = Result<Option<Round>, Self::Error>> + Send + '_;

  /// The most recently opened round that has its pairs recorded.
  fn latest_paired_round(
    &self,
  ) -> impl Future<Output = Result<Option<Round>, Self::Error>> + Send + '_;

  /// Stop intake for a round. Returns `true` only for the call that actually
  /// flipped it from open to closed.
  fn close_round(
    &self,
    round_id: Uuid,
    closed_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// Store or replace the voter's opt-in. Returns `false` if the round is
  /// missing or no longer open.
  fn record_vote(
    &self,
    vote: Vote,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove the voter's opt-in from an open round. Returns `true` if a vote
  /// was removed.
  fn retract_vote(
    &self,
    round_id: Uuid,
    voter_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All votes of a round in the order they were first cast.
  fn list_votes(
    &self,
    round_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Vote>, Self::Error>> + Send + '_;

  // ── Match log ─────────────────────────────────────────────────────────

  /// Append one pending record per pair, dated `date`, and mark the round
  /// paired at `paired_at`, in one transaction. Returns `None`, writing
  /// nothing, if the round is missing, still open, or already paired.
  fn record_round(
    &self,
    round_id: Uuid,
    pairs: Vec<Pair>,
    date: NaiveDate,
    paired_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Vec<MatchRecord>>, Self::Error>> + Send + '_;

  /// The full match log in insertion order.
  fn match_log(
    &self,
  ) -> impl Future<Output = Result<Vec<MatchRecord>, Self::Error>> + Send + '_;

  /// Confirm the meeting of `a` and `b`.
  ///
  /// Looks for the record of `{a, b}` in `round_id` (either order) and marks
  /// it confirmed on `on`. An already-confirmed record is returned as is.
  /// When no record matches, a confirmed ad-hoc record dated `on` is
  /// appended instead.
  fn confirm_meeting(
    &self,
    round_id: Option<Uuid>,
    a: Participant,
    b: Participant,
    on: NaiveDate,
  ) -> impl Future<Output = Result<Confirmation, Self::Error>> + Send + '_;
}
