//! Pure domain types and transforms for the rankgraph job client.
//!
//! Nothing in this crate performs I/O. The client crate drives jobs
//! against the backend and uses these types to describe jobs, their
//! results, and the graph documents handed to a renderer.

pub mod entity;
pub mod error;
pub mod graph;
pub mod job;
pub mod palette;
pub mod result;
pub mod types;
