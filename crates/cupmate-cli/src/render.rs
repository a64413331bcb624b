//! Plain-text rendering of round results for the announcement channel.

use std::fmt::Write as _;

use cupmate_core::{
  record::{MatchRecord, Pairing},
  report::ReportOutcome,
};

/// The announcement posted when a round closes.
pub fn pairing_message(pairing: &Pairing) -> String {
  if pairing.is_empty() {
    return "Nobody signed up for random coffee this round.\n".to_owned();
  }

  let mut out = String::from("Random coffee pairs for the next two weeks are ready!\n\n");
  for pair in &pairing.pairs {
    let _ = writeln!(out, "{} x {}", pair.first, pair.second);
  }
  if !pairing.pairs.is_empty() {
    out.push_str("\nMessage your partner to agree on a time and format.\n");
  }
  if let Some(leftover) = &pairing.leftover {
    let _ = writeln!(out, "\nNo pair this time: {leftover}");
    out.push_str("Reach out if you missed the poll and still want to meet.\n");
  }
  out.push_str("\nShare photos from your meetings with #randomcoffee!\n");
  out
}

/// Reply to a meeting report.
pub fn report_reply(reporter: &str, outcome: &ReportOutcome) -> String {
  match outcome {
    ReportOutcome::Confirmed(c) if c.ad_hoc => format!(
      "Thanks {reporter}! Logged your meeting with {}.",
      counterpart(reporter, &c.record)
    ),
    ReportOutcome::Confirmed(c) => format!(
      "Thanks {reporter}! Your meeting with {} is confirmed.",
      counterpart(reporter, &c.record)
    ),
    ReportOutcome::NeedsClarification => {
      format!("It would be great, {reporter}, if you told us who you met!")
    }
  }
}

fn counterpart<'a>(reporter: &str, record: &'a MatchRecord) -> &'a str {
  if record.participant_a.as_str() == reporter {
    record.participant_b.as_str()
  } else {
    record.participant_a.as_str()
  }
}

/// One line per record for `history`.
pub fn record_line(record: &MatchRecord) -> String {
  let status = match record.confirmed_on {
    Some(on) => format!("confirmed {on}"),
    None if record.confirmed => "confirmed".to_owned(),
    None => "pending".to_owned(),
  };
  format!(
    "{}  {} x {}  ({status})",
    record.round_date, record.participant_a, record.participant_b
  )
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use cupmate_core::{
    participant::Participant,
    record::{Confirmation, Pair},
  };
  use uuid::Uuid;

  use super::*;

  fn p(s: &str) -> Participant { Participant::new(s).unwrap() }

  #[test]
  fn lists_pairs_and_leftover() {
    let pairing = Pairing {
      pairs:    vec![Pair::new(p("@a"), p("@b"))],
      leftover: Some(p("@c")),
    };
    let text = pairing_message(&pairing);
    assert!(text.contains("@a x @b\n"));
    assert!(text.contains("No pair this time: @c"));
  }

  #[test]
  fn empty_round_has_own_message() {
    assert!(pairing_message(&Pairing::default()).starts_with("Nobody"));
  }

  #[test]
  fn reply_names_counterpart() {
    let record = MatchRecord {
      record_id:     Uuid::new_v4(),
      round_id:      None,
      round_date:    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
      participant_a: p("@bob"),
      participant_b: p("@alice"),
      confirmed:     true,
      confirmed_on:  NaiveDate::from_ymd_opt(2024, 6, 5),
    };
    let outcome = ReportOutcome::Confirmed(Confirmation { record: record.clone(), ad_hoc: false });
    assert_eq!(
      report_reply("@alice", &outcome),
      "Thanks @alice! Your meeting with @bob is confirmed."
    );
    assert_eq!(record_line(&record), "2024-06-03  @bob x @alice  (confirmed 2024-06-05)");
  }
}
