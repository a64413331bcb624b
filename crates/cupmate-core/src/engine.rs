//! The pairing engine.
//!
//! Turns a round's candidates and the history matrix into pairs plus at most
//! one leftover. The algorithm is greedy and randomized: it avoids repeats
//! where it can and accepts a repeat rather than leave a second person
//! unpaired. The random source is injected so callers can seed it.

use std::{cmp::Reverse, collections::HashSet};

use rand::{Rng, seq::SliceRandom};
use tracing::debug;

use crate::{
  config::{NewcomerPolicy, PairingConfig},
  history::HistoryMatrix,
  participant::Participant,
  record::{Pair, Pairing},
};

/// Pair up `candidates` for one round. Pure: no I/O, never fails.
///
/// Duplicate candidates are collapsed to their first occurrence. Every
/// remaining candidate ends up in exactly one pair or as the leftover.
pub fn build_round_pairing<R>(
  candidates: &[Participant],
  matrix: &HistoryMatrix,
  config: &PairingConfig,
  rng: &mut R,
) -> Pairing
where
  R: Rng + ?Sized,
{
  let mut seen = HashSet::new();
  let pool: Vec<Participant> = candidates
    .iter()
    .filter(|c| seen.insert(*c))
    .cloned()
    .collect();

  let mut pairing = Pairing::default();
  match pool.len() {
    0 => return pairing,
    1 => {
      pairing.leftover = pool.into_iter().next();
      return pairing;
    }
    _ => {}
  }

  let odd = pool.len() % 2 == 1;
  let (mut known, mut newcomers): (Vec<_>, Vec<_>) =
    pool.iter().cloned().partition(|c| matrix.is_known(c));

  if odd
    && let Some(fallback) = &config.fallback_participant
    && !pool.contains(fallback)
  {
    debug!(%fallback, "odd pool; injecting fallback participant");
    known.push(fallback.clone());
  }

  debug!(
    known = known.len(),
    newcomers = newcomers.len(),
    policy = ?config.newcomer_policy,
    "pairing round"
  );

  match config.newcomer_policy {
    NewcomerPolicy::SpreadAmongKnown => {
      let unmatched = spread_newcomers(newcomers, &mut known, &mut pairing, rng);
      pair_among_themselves(unmatched, &mut pairing, rng);
    }
    NewcomerPolicy::Pooled => known.append(&mut newcomers),
  }

  pair_avoiding_repeats(known, matrix, &mut pairing, rng);
  pairing
}

/// Give each newcomer a uniformly random returning partner while any remain.
/// Returns the newcomers that found none.
fn spread_newcomers<R>(
  newcomers: Vec<Participant>,
  known: &mut Vec<Participant>,
  pairing: &mut Pairing,
  rng: &mut R,
) -> Vec<Participant>
where
  R: Rng + ?Sized,
{
  let mut unmatched = Vec::new();
  for newcomer in newcomers {
    if known.is_empty() {
      unmatched.push(newcomer);
      continue;
    }
    // `remove` rather than `swap_remove`: the greedy pass relies on the
    // insertion order of what is left.
    let partner = known.remove(rng.gen_range(0..known.len()));
    pairing.pairs.push(Pair::new(newcomer, partner));
  }
  unmatched
}

/// Pair newcomers with each other; an odd one out becomes the leftover.
fn pair_among_themselves<R>(
  mut pool: Vec<Participant>,
  pairing: &mut Pairing,
  rng: &mut R,
) where
  R: Rng + ?Sized,
{
  while pool.len() >= 2 {
    let head = pool.remove(0);
    let partner = pool.remove(rng.gen_range(0..pool.len()));
    pairing.pairs.push(Pair::new(head, partner));
  }
  if let Some(last) = pool.pop() {
    pairing.leftover = Some(last);
  }
}

/// Greedy pass over participants with history.
///
/// The most-connected participants go first since they have the fewest fresh
/// partners left; ties keep insertion order. Each head takes a random partner
/// it has not met, or a random partner at all when everyone left is a repeat.
fn pair_avoiding_repeats<R>(
  mut pool: Vec<Participant>,
  matrix: &HistoryMatrix,
  pairing: &mut Pairing,
  rng: &mut R,
) where
  R: Rng + ?Sized,
{
  pool.sort_by_key(|p| Reverse(matrix.degree(p)));

  while pool.len() >= 2 {
    let head = pool.remove(0);
    let fresh: Vec<usize> = pool
      .iter()
      .enumerate()
      .filter(|(_, other)| matrix.weight(&head, other) == 0)
      .map(|(idx, _)| idx)
      .collect();

    let idx = match fresh.choose(rng) {
      Some(&idx) => idx,
      None => {
        debug!(participant = %head, "no fresh partner left; accepting a repeat");
        rng.gen_range(0..pool.len())
      }
    };
    let partner = pool.remove(idx);
    pairing.pairs.push(Pair::new(head, partner));
  }

  if let Some(last) = pool.pop() {
    debug_assert!(pairing.leftover.is_none(), "at most one leftover per round");
    pairing.leftover = Some(last);
  }
}
