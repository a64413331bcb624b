//! [`SqliteStore`], the SQLite implementation of [`MatchStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use cupmate_core::{
  participant::Participant,
  record::{Confirmation, MatchRecord, Pair, Round, Vote},
  store::MatchStore,
};

use crate::{
  Result,
  encode::{
    RECORD_COLUMNS, ROUND_COLUMNS, RawMatchRecord, RawRound, RawVote, encode_date,
    encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A cupmate store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted. All clones
/// share the one connection thread, so writes are serialized.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch at most one round matching `filter` (a `WHERE`/`ORDER BY` tail).
  async fn query_round(
    &self,
    filter: &'static str,
    id: Option<String>,
  ) -> Result<Option<Round>> {
    let raw: Option<RawRound> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {ROUND_COLUMNS} FROM rounds {filter} LIMIT 1");
        let row = match id {
          Some(id) => conn
            .query_row(&sql, rusqlite::params![id], RawRound::from_row)
            .optional()?,
          None => conn.query_row(&sql, [], RawRound::from_row).optional()?,
        };
        Ok(row)
      })
      .await?;

    raw.map(RawRound::into_round).transpose()
  }
}

// ─── MatchStore impl ─────────────────────────────────────────────────────────

impl MatchStore for SqliteStore {
  type Error = crate::Error;

  // ── Rounds ────────────────────────────────────────────────────────────────

  async fn open_round(&self, opened_at: DateTime<Utc>) -> Result<Option<Round>> {
    let round = Round {
      round_id: Uuid::new_v4(),
      opened_at,
      closed_at: None,
      is_closed: false,
      paired_at: None,
    };

    let id_str = encode_uuid(round.round_id);
    let at_str = encode_dt(opened_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO rounds (round_id, opened_at, is_closed)
           SELECT ?1, ?2, 0
           WHERE NOT EXISTS (SELECT 1 FROM rounds WHERE is_closed = 0)",
          rusqlite::params![id_str, at_str],
        )?)
      })
      .await?;

    Ok((inserted == 1).then_some(round))
  }

  async fn get_round(&self, round_id: Uuid) -> Result<Option<Round>> {
    self
      .query_round("WHERE round_id = ?1", Some(encode_uuid(round_id)))
      .await
  }

  async fn latest_round(&self) -> Result<Option<Round>> {
    self.query_round("ORDER BY rowid DESC", None).await
  }

  async fn latest_paired_round(&self) -> Result<Option<Round>> {
    self
      .query_round("WHERE paired_at IS NOT NULL ORDER BY rowid DESC", None)
      .await
  }

  async fn close_round(&self, round_id: Uuid, closed_at: DateTime<Utc>) -> Result<bool> {
    let id_str = encode_uuid(round_id);
    let at_str = encode_dt(closed_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE rounds SET is_closed = 1, closed_at = ?2
           WHERE round_id = ?1 AND is_closed = 0",
          rusqlite::params![id_str, at_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn record_vote(&self, vote: Vote) -> Result<bool> {
    let round_str       = encode_uuid(vote.round_id);
    let participant_str = String::from(vote.participant);
    let at_str          = encode_dt(vote.voted_at);
    let voter_id        = vote.voter_id;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO votes (round_id, voter_id, participant, voted_at)
           SELECT ?1, ?2, ?3, ?4
           WHERE EXISTS (SELECT 1 FROM rounds WHERE round_id = ?1 AND is_closed = 0)
           ON CONFLICT (round_id, voter_id) DO UPDATE SET
             participant = excluded.participant,
             voted_at    = excluded.voted_at",
          rusqlite::params![round_str, voter_id, participant_str, at_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn retract_vote(&self, round_id: Uuid, voter_id: i64) -> Result<bool> {
    let round_str = encode_uuid(round_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM votes
           WHERE round_id = ?1 AND voter_id = ?2
             AND EXISTS (SELECT 1 FROM rounds WHERE round_id = ?1 AND is_closed = 0)",
          rusqlite::params![round_str, voter_id],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn list_votes(&self, round_id: Uuid) -> Result<Vec<Vote>> {
    let round_str = encode_uuid(round_id);

    let raws: Vec<RawVote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT round_id, voter_id, participant, voted_at
           FROM votes WHERE round_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![round_str], RawVote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVote::into_vote).collect()
  }

  // ── Match log ─────────────────────────────────────────────────────────────

  async fn record_round(
    &self,
    round_id: Uuid,
    pairs: Vec<Pair>,
    date: NaiveDate,
    paired_at: DateTime<Utc>,
  ) -> Result<Option<Vec<MatchRecord>>> {
    let records: Vec<MatchRecord> = pairs
      .into_iter()
      .map(|pair| MatchRecord {
        record_id:     Uuid::new_v4(),
        round_id:      Some(round_id),
        round_date:    date,
        participant_a: pair.first,
        participant_b: pair.second,
        confirmed:     false,
        confirmed_on:  None,
      })
      .collect();

    let round_str     = encode_uuid(round_id);
    let date_str      = encode_date(date);
    let paired_at_str = encode_dt(paired_at);
    let rows: Vec<(String, String, String)> = records
      .iter()
      .map(|r| {
        (
          encode_uuid(r.record_id),
          r.participant_a.to_string(),
          r.participant_b.to_string(),
        )
      })
      .collect();

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let claimed = tx.execute(
          "UPDATE rounds SET paired_at = ?2
           WHERE round_id = ?1 AND is_closed = 1 AND paired_at IS NULL",
          rusqlite::params![round_str, paired_at_str],
        )?;
        if claimed == 0 {
          // Dropping `tx` rolls back.
          return Ok(false);
        }
        {
          let mut stmt = tx.prepare(
            "INSERT INTO match_records
               (record_id, round_id, round_date, participant_a, participant_b, confirmed)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
          )?;
          for (record_id, a, b) in &rows {
            stmt.execute(rusqlite::params![record_id, round_str, date_str, a, b])?;
          }
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    debug!(%round_id, written, records = records.len(), "record_round");
    Ok(written.then_some(records))
  }

  async fn match_log(&self) -> Result<Vec<MatchRecord>> {
    let raws: Vec<RawMatchRecord> = self
      .conn
      .call(|conn| {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM match_records ORDER BY seq");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawMatchRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMatchRecord::into_record).collect()
  }

  async fn confirm_meeting(
    &self,
    round_id: Option<Uuid>,
    a: Participant,
    b: Participant,
    on: NaiveDate,
  ) -> Result<Confirmation> {
    let round_str = round_id.map(encode_uuid);
    let a_str     = String::from(a);
    let b_str     = String::from(b);
    let on_str    = encode_date(on);
    let fresh_id  = encode_uuid(Uuid::new_v4());

    let (raw, ad_hoc): (RawMatchRecord, bool) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let found = match &round_str {
          Some(round) => {
            let sql = format!(
              "SELECT {RECORD_COLUMNS} FROM match_records
               WHERE round_id = ?1
                 AND ((participant_a = ?2 AND participant_b = ?3)
                   OR (participant_a = ?3 AND participant_b = ?2))
               ORDER BY confirmed ASC, seq DESC
               LIMIT 1"
            );
            tx.query_row(
              &sql,
              rusqlite::params![round, a_str, b_str],
              RawMatchRecord::from_row,
            )
            .optional()?
          }
          None => None,
        };

        let outcome = match found {
          Some(raw) if raw.confirmed => (raw, false),
          Some(mut raw) => {
            tx.execute(
              "UPDATE match_records SET confirmed = 1, confirmed_on = ?2
               WHERE record_id = ?1",
              rusqlite::params![raw.record_id, on_str],
            )?;
            raw.confirmed = true;
            raw.confirmed_on = Some(on_str);
            (raw, false)
          }
          None => {
            tx.execute(
              "INSERT INTO match_records
                 (record_id, round_id, round_date, participant_a, participant_b,
                  confirmed, confirmed_on)
               VALUES (?1, NULL, ?2, ?3, ?4, 1, ?2)",
              rusqlite::params![fresh_id, on_str, a_str, b_str],
            )?;
            let raw = RawMatchRecord {
              record_id:     fresh_id,
              round_id:      None,
              round_date:    on_str.clone(),
              participant_a: a_str,
              participant_b: b_str,
              confirmed:     true,
              confirmed_on:  Some(on_str),
            };
            (raw, true)
          }
        };

        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    Ok(Confirmation { record: raw.into_record()?, ad_hoc })
  }
}
