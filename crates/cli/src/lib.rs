//! `rankgraph-cli` library crate.
//!
//! Input loading and report rendering for the `rankgraph` binary,
//! exposed for integration testing. The entrypoint lives in `main.rs`.

pub mod input;
pub mod report;
