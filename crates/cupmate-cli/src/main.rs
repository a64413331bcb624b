//! `cupmate`: drive random coffee rounds from the command line.
//!
//! Reads `cupmate.toml` (or the path given with `--config`), opens the SQLite
//! store and runs one round operation.
//!
//! # Usage
//!
//! ```text
//! cupmate open --fixtures
//! cupmate vote --voter-id 42 --handle alice
//! cupmate import answers.json
//! cupmate close
//! cupmate report --from @alice "@bob it was great meeting you #rc"
//! ```

mod render;
mod settings;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use cupmate_core::{
  config::EdgePolicy,
  participant::{OptInResponse, Participant},
  report::has_marker,
  rounds::{self, Submission},
  store::MatchStore,
};
use cupmate_store_sqlite::SqliteStore;
use rand::{SeedableRng, rngs::StdRng};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Random coffee pairing")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "cupmate.toml", env = "CUPMATE_CONFIG")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Open a new round.
  Open {
    /// Opt in the configured fixture identities.
    #[arg(long)]
    fixtures: bool,
  },

  /// Record (or retract) one opt-in for the current round.
  Vote {
    #[arg(long)]
    voter_id:   i64,
    #[arg(long)]
    handle:     Option<String>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name:  Option<String>,
    /// Withdraw the voter's earlier opt-in.
    #[arg(long)]
    retract:    bool,
  },

  /// Apply a JSON array of opt-in responses to the current round.
  Import { file: PathBuf },

  /// Show the current round and its candidates.
  Round,

  /// Close the current round and announce the pairs.
  Close {
    /// Print the pairing without closing the round or recording anything.
    #[arg(long)]
    dry_run: bool,
  },

  /// Reconcile a meeting report.
  Report {
    /// Reporter identity, e.g. `@alice`. A single word without the `@` is
    /// taken as a handle; use quotes for a `first last` name identity.
    #[arg(long)]
    from:    String,
    /// Report text; must carry one of the configured markers.
    #[arg(required = true, num_args = 1..)]
    message: Vec<String>,
  },

  /// Print the match log and history statistics.
  History {
    /// Count only confirmed meetings as edges.
    #[arg(long)]
    confirmed_only: bool,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;

  match cli.command {
    Command::Open { fixtures } => open(&store, &settings, fixtures).await,
    Command::Vote { voter_id, handle, first_name, last_name, retract } => {
      let response = OptInResponse {
        voter_id,
        handle,
        first_name,
        last_name,
        opted_in: !retract,
      };
      vote(&store, response).await
    }
    Command::Import { file } => import(&store, &file).await,
    Command::Round => show_round(&store).await,
    Command::Close { dry_run } => close(&store, &settings, dry_run).await,
    Command::Report { from, message } => {
      report(&store, &settings, &from, &message.join(" ")).await
    }
    Command::History { confirmed_only } => history(&store, confirmed_only).await,
  }
}

fn rng(settings: &Settings) -> StdRng {
  match settings.seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_entropy(),
  }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

async fn open(store: &SqliteStore, settings: &Settings, fixtures: bool) -> Result<()> {
  let round = rounds::open_round(store, Utc::now()).await?;
  println!("Opened round {}", round.round_id);

  if fixtures {
    let seeded =
      rounds::seed_fixtures(store, round.round_id, &settings.fixtures, Utc::now()).await?;
    println!("Added {seeded} fixture candidates");
  }
  Ok(())
}

async fn vote(store: &SqliteStore, response: OptInResponse) -> Result<()> {
  let round = rounds::current_round(store).await?;
  match rounds::submit_response(store, round.round_id, &response, Utc::now()).await? {
    Submission::Accepted(vote) => println!("{} is in", vote.participant),
    Submission::Retracted { removed: true } => println!("Vote withdrawn"),
    Submission::Retracted { removed: false } => println!("No vote to withdraw"),
    Submission::Skipped { voter_id } => {
      println!("Skipped voter {voter_id}: no handle or name")
    }
  }
  Ok(())
}

async fn import(store: &SqliteStore, file: &Path) -> Result<()> {
  let raw = std::fs::read_to_string(file)
    .with_context(|| format!("reading {}", file.display()))?;
  let responses: Vec<OptInResponse> =
    serde_json::from_str(&raw).context("parsing opt-in responses")?;

  let round = rounds::current_round(store).await?;
  let summary = rounds::submit_responses(store, round.round_id, responses, Utc::now()).await?;
  println!(
    "Accepted {}, retracted {}, skipped {}",
    summary.accepted, summary.retracted, summary.skipped
  );
  Ok(())
}

async fn show_round(store: &SqliteStore) -> Result<()> {
  let round = rounds::current_round(store).await?;
  let state = match (round.is_closed, round.is_paired()) {
    (false, _) => "open",
    (true, true) => "closed, paired",
    (true, false) => "closed, not paired",
  };
  println!("Round {} ({state}), opened {}", round.round_id, round.opened_at);

  let candidates = rounds::candidates(store, round.round_id).await?;
  println!("{} candidates", candidates.len());
  for candidate in candidates {
    println!("  {candidate}");
  }
  Ok(())
}

async fn close(store: &SqliteStore, settings: &Settings, dry_run: bool) -> Result<()> {
  let round = rounds::current_round(store).await?;
  let mut rng = rng(settings);

  let pairing = if dry_run {
    rounds::preview_round(store, &settings.pairing, &mut rng, round.round_id).await?
  } else {
    rounds::close_round(store, &settings.pairing, &mut rng, round.round_id, Utc::now())
      .await?
      .pairing
  };

  print!("{}", render::pairing_message(&pairing));
  Ok(())
}

async fn report(
  store: &SqliteStore,
  settings: &Settings,
  from: &str,
  message: &str,
) -> Result<()> {
  if !has_marker(message, &settings.report_markers) {
    tracing::warn!(reporter = from, "report carries no marker; ignoring");
    return Ok(());
  }

  let reporter = reporter_identity(from).context("invalid reporter identity")?;
  let outcome =
    rounds::reconcile_report(store, &reporter, message, Utc::now().date_naive()).await?;
  println!("{}", render::report_reply(reporter.as_str(), &outcome));
  Ok(())
}

/// A bare word is a handle given without its sigil; anything with a space is
/// a name identity and is kept as is.
fn reporter_identity(from: &str) -> cupmate_core::Result<Participant> {
  let from = from.trim();
  if from.contains(char::is_whitespace) {
    Participant::new(from)
  } else {
    Participant::from_handle(from)
  }
}

async fn history(store: &SqliteStore, confirmed_only: bool) -> Result<()> {
  let policy = if confirmed_only {
    EdgePolicy::ConfirmedOnly
  } else {
    EdgePolicy::AnyRecord
  };

  let log = store.match_log().await?;
  for record in &log {
    println!("{}", render::record_line(record));
  }

  let matrix = rounds::rebuild_history(store, policy).await?;
  let confirmed = log.iter().filter(|r| r.confirmed).count();
  println!(
    "{} records ({confirmed} confirmed), {} participants, {} distinct pairs",
    log.len(),
    matrix.len(),
    matrix.edge_count()
  );
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bare_reporter_is_a_handle() {
    assert_eq!(reporter_identity("alice").unwrap().as_str(), "@alice");
    assert_eq!(reporter_identity("@alice").unwrap().as_str(), "@alice");
    assert_eq!(reporter_identity(" Ann Lee ").unwrap().as_str(), "Ann Lee");
    assert!(reporter_identity("@").is_err());
  }

  #[test]
  fn bare_reporter_does_not_mention_themselves() {
    let reporter = reporter_identity("alice").unwrap();
    let mention = cupmate_core::report::first_mention(&reporter, "@alice and @bob #rc");
    assert_eq!(mention.map(String::from).as_deref(), Some("@bob"));
  }
}
