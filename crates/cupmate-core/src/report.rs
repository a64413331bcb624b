//! Parsing of free-text meeting reports.
//!
//! Reports arrive from a chat channel, tagged with a marker such as
//! `#random`. The counterpart is whoever the reporter mentions first.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{participant::Participant, record::Confirmation};

/// `@handle` at the start of the text or after a non-word character, so that
/// the domain part of an e-mail address is not taken for a mention.
static MENTION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?:^|[^\w@])@(\w+)").expect("mention pattern is valid")
});

/// The result of reconciling one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReportOutcome {
  Confirmed(Confirmation),
  /// The message names no counterpart; the caller should ask the reporter
  /// who they met.
  NeedsClarification,
}

/// The first participant mentioned in `message` other than the reporter.
pub fn first_mention(reporter: &Participant, message: &str) -> Option<Participant> {
  MENTION
    .captures_iter(message)
    .filter_map(|caps| caps.get(1))
    .filter_map(|m| Participant::from_handle(m.as_str()).ok())
    .find(|mentioned| mentioned != reporter)
}

/// Whether `message` carries one of the report markers (case-insensitive).
pub fn has_marker(message: &str, markers: &[String]) -> bool {
  let lowered = message.to_lowercase();
  markers
    .iter()
    .any(|marker| lowered.contains(&marker.to_lowercase()))
}
