//! Core types and trait definitions for the call-scorecard ingestion engine.
//!
//! This crate is deliberately free of spreadsheet, HTTP and database
//! dependencies. All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod call;
pub mod error;
pub mod report;
pub mod store;
pub mod taxonomy;

pub use error::{Error, Result};
