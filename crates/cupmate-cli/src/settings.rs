//! Runtime settings, read from `cupmate.toml` and `CUPMATE_*` variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use cupmate_core::{config::PairingConfig, participant::Participant};
use serde::Deserialize;

/// Shape of the configuration file. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite file holding rounds, votes and the match log.
  pub store_path:     PathBuf,
  /// Seed for partner selection; unset means a fresh seed per run.
  pub seed:           Option<u64>,
  /// Identities opted in by `open --fixtures`.
  pub fixtures:       Vec<Participant>,
  /// Tags a report must carry to be reconciled.
  pub report_markers: Vec<String>,
  pub pairing:        PairingConfig,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path:     PathBuf::from("cupmate.db"),
      seed:           None,
      fixtures:       Vec::new(),
      report_markers: vec!["#random".to_owned(), "#rc".to_owned()],
      pairing:        PairingConfig::default(),
    }
  }
}

impl Settings {
  /// Layer the optional file at `path` under `CUPMATE_*` environment
  /// variables (`__` separates nested keys, e.g. `CUPMATE_PAIRING__EDGE_POLICY`).
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("CUPMATE")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read config file")?;

    let mut settings: Self = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use cupmate_core::config::EdgePolicy;

  use super::*;

  #[test]
  fn missing_file_gives_defaults() {
    let settings = Settings::load(Path::new("/nonexistent/cupmate.toml")).unwrap();
    assert_eq!(settings.report_markers, ["#random", "#rc"]);
    assert_eq!(settings.pairing, PairingConfig::default());
  }

  #[test]
  fn reads_nested_pairing_section() {
    let dir = std::env::temp_dir().join(format!("cupmate-settings-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("cupmate.toml");
    std::fs::write(
      &path,
      r#"
store_path = "rounds.db"
seed = 9
fixtures = ["@fx1", "@fx2"]

[pairing]
fallback_participant = "@host"
edge_policy = "confirmed_only"
"#,
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.store_path, PathBuf::from("rounds.db"));
    assert_eq!(settings.seed, Some(9));
    assert_eq!(settings.fixtures.len(), 2);
    assert_eq!(
      settings.pairing.fallback_participant.as_ref().map(Participant::as_str),
      Some("@host")
    );
    assert_eq!(settings.pairing.edge_policy, EdgePolicy::ConfirmedOnly);

    std::fs::remove_dir_all(&dir).ok();
  }

  #[test]
  fn tilde_expands_to_home() {
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expand_tilde(Path::new("~/x.db")), PathBuf::from(home).join("x.db"));
    }
    assert_eq!(expand_tilde(Path::new("/abs.db")), PathBuf::from("/abs.db"));
  }
}
