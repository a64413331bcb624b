//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are ISO 8601 (`%Y-%m-%d`),
//! UUIDs are hyphenated lowercase strings and booleans are `0`/`1` integers.

use chrono::{DateTime, NaiveDate, Utc};
use cupmate_core::{
  participant::Participant,
  record::{MatchRecord, Round, Vote},
};
use uuid::Uuid;

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Participant ─────────────────────────────────────────────────────────────

pub fn decode_participant(s: String) -> Result<Participant> {
  Ok(Participant::new(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `rounds` row.
pub struct RawRound {
  pub round_id:  String,
  pub opened_at: String,
  pub closed_at: Option<String>,
  pub is_closed: bool,
  pub paired_at: Option<String>,
}

pub const ROUND_COLUMNS: &str = "round_id, opened_at, closed_at, is_closed, paired_at";

impl RawRound {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      round_id:  row.get(0)?,
      opened_at: row.get(1)?,
      closed_at: row.get(2)?,
      is_closed: row.get(3)?,
      paired_at: row.get(4)?,
    })
  }

  pub fn into_round(self) -> Result<Round> {
    Ok(Round {
      round_id:  decode_uuid(&self.round_id)?,
      opened_at: decode_dt(&self.opened_at)?,
      closed_at: self.closed_at.as_deref().map(decode_dt).transpose()?,
      is_closed: self.is_closed,
      paired_at: self.paired_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `votes` row.
pub struct RawVote {
  pub round_id:    String,
  pub voter_id:    i64,
  pub participant: String,
  pub voted_at:    String,
}

impl RawVote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      round_id:    row.get(0)?,
      voter_id:    row.get(1)?,
      participant: row.get(2)?,
      voted_at:    row.get(3)?,
    })
  }

  pub fn into_vote(self) -> Result<Vote> {
    Ok(Vote {
      round_id:    decode_uuid(&self.round_id)?,
      voter_id:    self.voter_id,
      participant: decode_participant(self.participant)?,
      voted_at:    decode_dt(&self.voted_at)?,
    })
  }
}

/// Raw strings read directly from a `match_records` row.
#[derive(Clone)]
pub struct RawMatchRecord {
  pub record_id:     String,
  pub round_id:      Option<String>,
  pub round_date:    String,
  pub participant_a: String,
  pub participant_b: String,
  pub confirmed:     bool,
  pub confirmed_on:  Option<String>,
}

pub const RECORD_COLUMNS: &str = "record_id, round_id, round_date, participant_a, \
                                  participant_b, confirmed, confirmed_on";

impl RawMatchRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:     row.get(0)?,
      round_id:      row.get(1)?,
      round_date:    row.get(2)?,
      participant_a: row.get(3)?,
      participant_b: row.get(4)?,
      confirmed:     row.get(5)?,
      confirmed_on:  row.get(6)?,
    })
  }

  pub fn into_record(self) -> Result<MatchRecord> {
    Ok(MatchRecord {
      record_id:     decode_uuid(&self.record_id)?,
      round_id:      self.round_id.as_deref().map(decode_uuid).transpose()?,
      round_date:    decode_date(&self.round_date)?,
      participant_a: decode_participant(self.participant_a)?,
      participant_b: decode_participant(self.participant_b)?,
      confirmed:     self.confirmed,
      confirmed_on:  self.confirmed_on.as_deref().map(decode_date).transpose()?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn date_roundtrip_is_iso() {
    let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    assert_eq!(encode_date(d), "2024-02-29");
    assert_eq!(decode_date("2024-02-29").unwrap(), d);
  }

  #[test]
  fn bad_date_is_reported() {
    assert!(matches!(decode_date("29.02.2024"), Err(Error::DateParse(_))));
  }

  #[test]
  fn empty_participant_in_row_is_rejected() {
    assert!(matches!(
      decode_participant(String::new()),
      Err(Error::Core(cupmate_core::Error::EmptyParticipant))
    ));
  }
}
