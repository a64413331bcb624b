//! The round workflow: opt-in intake, closing, pairing and meeting reports.
//!
//! Every function here is generic over [`MatchStore`] and takes the pairing
//! policy and random source explicitly; nothing is read from global state.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  config::{EdgePolicy, PairingConfig},
  engine::build_round_pairing,
  history::HistoryMatrix,
  participant::{OptInResponse, Participant},
  record::{MatchRecord, Pairing, Round, Vote},
  report::{ReportOutcome, first_mention},
  store::MatchStore,
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// What happened to a single opt-in response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
  Accepted(Vote),
  Retracted { removed: bool },
  /// The response carried no usable identity and was ignored.
  Skipped { voter_id: i64 },
}

/// Tally of a batch of responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntakeSummary {
  pub accepted:  usize,
  pub retracted: usize,
  pub skipped:   usize,
}

/// A round after close: its pairing and the pending records written for it.
#[derive(Debug, Clone)]
pub struct ClosedRound {
  pub round:   Round,
  pub pairing: Pairing,
  pub records: Vec<MatchRecord>,
}

// ─── Rounds ──────────────────────────────────────────────────────────────────

/// Open a new round. Fails with [`Error::RoundStillOpen`] while the previous
/// round has not been closed.
pub async fn open_round<S: MatchStore>(store: &S, now: DateTime<Utc>) -> Result<Round> {
  if let Some(round) = store.open_round(now).await.map_err(Error::store)? {
    info!(round_id = %round.round_id, "round opened");
    return Ok(round);
  }

  match store.latest_round().await.map_err(Error::store)? {
    Some(open) => Err(Error::RoundStillOpen(open.round_id)),
    None => Err(Error::NoRounds),
  }
}

/// The most recently opened round.
pub async fn current_round<S: MatchStore>(store: &S) -> Result<Round> {
  store
    .latest_round()
    .await
    .map_err(Error::store)?
    .ok_or(Error::NoRounds)
}

async fn ensure_open<S: MatchStore>(store: &S, round_id: Uuid) -> Result<Round> {
  match store.get_round(round_id).await.map_err(Error::store)? {
    None => Err(Error::RoundNotFound(round_id)),
    Some(round) if round.is_closed => Err(Error::RoundAlreadyClosed(round_id)),
    Some(round) => Ok(round),
  }
}

// ─── Intake ──────────────────────────────────────────────────────────────────

/// Apply one opt-in response to an open round.
///
/// Retractions remove the voter's earlier vote. Responses without a usable
/// identity are skipped, not treated as failures.
pub async fn submit_response<S: MatchStore>(
  store: &S,
  round_id: Uuid,
  response: &OptInResponse,
  now: DateTime<Utc>,
) -> Result<Submission> {
  if !response.opted_in {
    ensure_open(store, round_id).await?;
    let removed = store
      .retract_vote(round_id, response.voter_id)
      .await
      .map_err(Error::store)?;
    info!(%round_id, voter_id = response.voter_id, removed, "vote retracted");
    return Ok(Submission::Retracted { removed });
  }

  let participant = match response.participant() {
    Ok(participant) => participant,
    Err(e) => {
      warn!(%round_id, voter_id = response.voter_id, error = %e, "skipping opt-in");
      return Ok(Submission::Skipped { voter_id: response.voter_id });
    }
  };

  let vote = Vote {
    round_id,
    voter_id: response.voter_id,
    participant,
    voted_at: now,
  };

  if store.record_vote(vote.clone()).await.map_err(Error::store)? {
    info!(%round_id, participant = %vote.participant, "opt-in recorded");
    return Ok(Submission::Accepted(vote));
  }

  ensure_open(store, round_id).await?;
  // Open when we looked, but it closed before the vote landed.
  Err(Error::RoundAlreadyClosed(round_id))
}

/// Apply a batch of responses, skipping malformed ones.
pub async fn submit_responses<S, I>(
  store: &S,
  round_id: Uuid,
  responses: I,
  now: DateTime<Utc>,
) -> Result<IntakeSummary>
where
  S: MatchStore,
  I: IntoIterator<Item = OptInResponse>,
{
  let mut summary = IntakeSummary::default();
  for response in responses {
    match submit_response(store, round_id, &response, now).await? {
      Submission::Accepted(_) => summary.accepted += 1,
      Submission::Retracted { .. } => summary.retracted += 1,
      Submission::Skipped { .. } => summary.skipped += 1,
    }
  }
  Ok(summary)
}

/// Opt in the configured fixture identities, for dry runs.
///
/// Fixtures get negative voter ids so they never collide with real ones.
pub async fn seed_fixtures<S: MatchStore>(
  store: &S,
  round_id: Uuid,
  fixtures: &[Participant],
  now: DateTime<Utc>,
) -> Result<usize> {
  ensure_open(store, round_id).await?;
  let mut seeded = 0;
  for (idx, participant) in fixtures.iter().enumerate() {
    let vote = Vote {
      round_id,
      voter_id: -1 - idx as i64,
      participant: participant.clone(),
      voted_at: now,
    };
    if store.record_vote(vote).await.map_err(Error::store)? {
      seeded += 1;
    }
  }
  info!(%round_id, seeded, "fixture candidates added");
  Ok(seeded)
}

/// The round's candidates, deduplicated by identity, in voting order.
pub async fn candidates<S: MatchStore>(store: &S, round_id: Uuid) -> Result<Vec<Participant>> {
  let votes = store.list_votes(round_id).await.map_err(Error::store)?;
  let mut out: Vec<Participant> = Vec::with_capacity(votes.len());
  for vote in votes {
    if !out.contains(&vote.participant) {
      out.push(vote.participant);
    }
  }
  Ok(out)
}

/// Rebuild the history matrix from the full match log.
pub async fn rebuild_history<S: MatchStore>(
  store: &S,
  policy: EdgePolicy,
) -> Result<HistoryMatrix> {
  let log = store.match_log().await.map_err(Error::store)?;
  Ok(HistoryMatrix::build(&log, policy))
}

async fn pair_candidates<S, R>(
  store: &S,
  config: &PairingConfig,
  rng: &mut R,
  round_id: Uuid,
) -> Result<Pairing>
where
  S: MatchStore,
  R: Rng + ?Sized,
{
  let candidates = candidates(store, round_id).await?;
  let matrix = rebuild_history(store, config.edge_policy).await?;
  Ok(build_round_pairing(&candidates, &matrix, config, rng))
}

// ─── Close ───────────────────────────────────────────────────────────────────

/// Close a round, pair its candidates and record the pairs as pending.
///
/// Intake stops first, so the candidate list is final by the time it is
/// read. A round whose pairs are already recorded fails with
/// [`Error::RoundAlreadyClosed`]; a round that was closed but never paired
/// (e.g. the store failed mid-way) is paired now.
pub async fn close_round<S, R>(
  store: &S,
  config: &PairingConfig,
  rng: &mut R,
  round_id: Uuid,
  now: DateTime<Utc>,
) -> Result<ClosedRound>
where
  S: MatchStore,
  R: Rng + ?Sized,
{
  let closed_now = store.close_round(round_id, now).await.map_err(Error::store)?;
  let round = store
    .get_round(round_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::RoundNotFound(round_id))?;

  if !closed_now {
    if round.is_paired() {
      return Err(Error::RoundAlreadyClosed(round_id));
    }
    warn!(%round_id, "round was closed without pairs; pairing it now");
  }

  let pairing = pair_candidates(store, config, rng, round_id).await?;
  let records = store
    .record_round(round_id, pairing.pairs.clone(), now.date_naive(), now)
    .await
    .map_err(Error::store)?
    .ok_or(Error::RoundAlreadyClosed(round_id))?;

  let round = store
    .get_round(round_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::RoundNotFound(round_id))?;

  info!(
    %round_id,
    pairs = pairing.pairs.len(),
    leftover = ?pairing.leftover.as_ref().map(Participant::as_str),
    "round closed and paired"
  );

  Ok(ClosedRound { round, pairing, records })
}

/// Compute the pairing a close would produce right now, without writing.
///
/// A round whose pairs are already recorded fails with
/// [`Error::RoundAlreadyClosed`]; its pairing is in the match log.
pub async fn preview_round<S, R>(
  store: &S,
  config: &PairingConfig,
  rng: &mut R,
  round_id: Uuid,
) -> Result<Pairing>
where
  S: MatchStore,
  R: Rng + ?Sized,
{
  let round = store
    .get_round(round_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::RoundNotFound(round_id))?;
  if round.is_paired() {
    return Err(Error::RoundAlreadyClosed(round_id));
  }
  pair_candidates(store, config, rng, round_id).await
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Reconcile a free-text meeting report against the latest paired round.
pub async fn reconcile_report<S: MatchStore>(
  store: &S,
  reporter: &Participant,
  message: &str,
  today: NaiveDate,
) -> Result<ReportOutcome> {
  let Some(counterpart) = first_mention(reporter, message) else {
    info!(%reporter, "report names no counterpart");
    return Ok(ReportOutcome::NeedsClarification);
  };

  let round_id = store
    .latest_paired_round()
    .await
    .map_err(Error::store)?
    .map(|round| round.round_id);

  let confirmation = store
    .confirm_meeting(round_id, reporter.clone(), counterpart, today)
    .await
    .map_err(Error::store)?;

  info!(
    record_id = %confirmation.record.record_id,
    ad_hoc = confirmation.ad_hoc,
    "meeting confirmed"
  );
  Ok(ReportOutcome::Confirmed(confirmation))
}
