//! Participant identities and the opt-in resolver.
//!
//! A participant is identified by `@handle` when the transport knows a handle,
//! otherwise by the person's display name. The identifier is the only thing
//! the match log stores, so resolution must be deterministic.

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Prefix that marks a participant identifier as a handle.
pub const HANDLE_SIGIL: char = '@';

// ─── Participant ─────────────────────────────────────────────────────────────

/// A stable, case-sensitive, non-empty participant identifier.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Participant(String);

impl Participant {
  /// Wrap an already-canonical identifier.
  pub fn new(id: impl Into<String>) -> Result<Self> {
    let id = id.into();
    if id.trim().is_empty() {
      return Err(Error::EmptyParticipant);
    }
    Ok(Self(id))
  }

  /// Build `@handle`. A leading sigil on the input is not doubled.
  pub fn from_handle(handle: &str) -> Result<Self> {
    let bare = handle.trim().trim_start_matches(HANDLE_SIGIL);
    if bare.is_empty() {
      return Err(Error::EmptyParticipant);
    }
    Ok(Self(format!("{HANDLE_SIGIL}{bare}")))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn is_handle(&self) -> bool { self.0.starts_with(HANDLE_SIGIL) }
}

impl fmt::Display for Participant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for Participant {
  fn as_ref(&self) -> &str { &self.0 }
}

impl Borrow<str> for Participant {
  fn borrow(&self) -> &str { &self.0 }
}

impl TryFrom<String> for Participant {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::new(value) }
}

impl From<Participant> for String {
  fn from(value: Participant) -> Self { value.0 }
}

// ─── Opt-in responses ────────────────────────────────────────────────────────

/// One raw answer delivered by the poll transport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptInResponse {
  /// The transport's stable user id; retractions are keyed on it.
  pub voter_id:   i64,
  pub handle:     Option<String>,
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  /// `false` means the voter withdrew an earlier opt-in.
  pub opted_in:   bool,
}

impl OptInResponse {
  /// Resolve the canonical participant identifier for this response.
  ///
  /// `@handle` wins when a non-blank handle is present. Otherwise the
  /// non-blank name parts are joined by a single space.
  pub fn participant(&self) -> Result<Participant> {
    let handle = self
      .handle
      .as_deref()
      .map(|h| h.trim().trim_start_matches(HANDLE_SIGIL));
    if let Some(handle) = non_blank(handle) {
      return Participant::from_handle(handle);
    }

    let name = [self.first_name.as_deref(), self.last_name.as_deref()]
      .into_iter()
      .filter_map(non_blank)
      .collect::<Vec<_>>()
      .join(" ");

    if name.is_empty() {
      return Err(Error::MalformedResponse { voter_id: self.voter_id });
    }
    Participant::new(name)
  }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
  s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn response(
    handle: Option<&str>,
    first: Option<&str>,
    last: Option<&str>,
  ) -> OptInResponse {
    OptInResponse {
      voter_id:   7,
      handle:     handle.map(Into::into),
      first_name: first.map(Into::into),
      last_name:  last.map(Into::into),
      opted_in:   true,
    }
  }

  #[test]
  fn handle_takes_precedence_over_name() {
    let p = response(Some("alice"), Some("Alice"), Some("Liddell"))
      .participant()
      .unwrap();
    assert_eq!(p.as_str(), "@alice");
    assert!(p.is_handle());
  }

  #[test]
  fn handle_with_sigil_is_not_doubled() {
    let p = response(Some("@bob"), None, None).participant().unwrap();
    assert_eq!(p.as_str(), "@bob");
  }

  #[test]
  fn name_used_when_handle_missing_or_blank() {
    let p = response(Some("  "), Some("Alice"), Some("Liddell"))
      .participant()
      .unwrap();
    assert_eq!(p.as_str(), "Alice Liddell");
    assert!(!p.is_handle());

    let p = response(None, Some("Alice"), None).participant().unwrap();
    assert_eq!(p.as_str(), "Alice");
  }

  #[test]
  fn sigil_only_handle_falls_back_to_name() {
    let p = response(Some(" @ "), Some("Ann"), Some("Lee"))
      .participant()
      .unwrap();
    assert_eq!(p.as_str(), "Ann Lee");

    let r = response(Some("@"), None, None).participant();
    assert!(matches!(r, Err(Error::MalformedResponse { voter_id: 7 })));
  }

  #[test]
  fn resolution_is_idempotent() {
    let r = response(None, Some("Ada"), Some("Lovelace"));
    assert_eq!(r.participant().unwrap(), r.participant().unwrap());
  }

  #[test]
  fn no_identity_is_malformed() {
    let r = response(None, Some(""), None).participant();
    assert!(matches!(r, Err(Error::MalformedResponse { voter_id: 7 })));
  }

  #[test]
  fn empty_participant_rejected() {
    assert!(matches!(Participant::new("   "), Err(Error::EmptyParticipant)));
    assert!(matches!(Participant::from_handle("@"), Err(Error::EmptyParticipant)));
  }

  #[test]
  fn identity_is_case_sensitive() {
    let a = Participant::new("@Alice").unwrap();
    let b = Participant::new("@alice").unwrap();
    assert_ne!(a, b);
  }

  #[test]
  fn serde_rejects_empty_identity() {
    let ok: Participant = serde_json::from_str("\"@carol\"").unwrap();
    assert_eq!(ok.as_str(), "@carol");
    assert!(serde_json::from_str::<Participant>("\"\"").is_err());
  }
}
