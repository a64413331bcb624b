//! Core types and the pairing engine for cupmate, a random coffee matcher.
//!
//! This crate is deliberately free of database and transport dependencies.
//! Storage backends implement [`store::MatchStore`]; the round workflow in
//! [`rounds`] is generic over it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod participant;
pub mod record;
pub mod report;
pub mod rounds;
pub mod store;

pub use error::{Error, Result};
