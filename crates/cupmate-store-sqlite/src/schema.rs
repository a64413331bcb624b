//! SQL schema for the cupmate SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS rounds (
    round_id   TEXT PRIMARY KEY,
    opened_at  TEXT NOT NULL,       -- RFC 3339 UTC
    closed_at  TEXT,
    is_closed  INTEGER NOT NULL DEFAULT 0,
    paired_at  TEXT                 -- set together with the round's records
);

-- At most one round accepts votes at any time.
CREATE UNIQUE INDEX IF NOT EXISTS rounds_single_open_idx
    ON rounds(is_closed) WHERE is_closed = 0;

-- One row per voter and round; a re-vote updates the row in place so the
-- rowid keeps the order of first opt-in.
CREATE TABLE IF NOT EXISTS votes (
    round_id    TEXT    NOT NULL REFERENCES rounds(round_id),
    voter_id    INTEGER NOT NULL,
    participant TEXT    NOT NULL,
    voted_at    TEXT    NOT NULL,
    PRIMARY KEY (round_id, voter_id)
);

-- Append-only. The confirmation columns are the only ones ever updated;
-- no DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS match_records (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    record_id     TEXT NOT NULL UNIQUE,
    round_id      TEXT REFERENCES rounds(round_id),   -- NULL for ad-hoc meetings
    round_date    TEXT NOT NULL,                      -- ISO 8601 date
    participant_a TEXT NOT NULL,
    participant_b TEXT NOT NULL,
    confirmed     INTEGER NOT NULL DEFAULT 0,
    confirmed_on  TEXT
);

CREATE INDEX IF NOT EXISTS match_records_round_idx ON match_records(round_id);

PRAGMA user_version = 1;
";
