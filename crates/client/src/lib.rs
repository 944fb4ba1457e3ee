//! Client-side orchestration for the ranking backend.
//!
//! Submits analysis jobs over a [`Transport`](transport::Transport),
//! long-polls their task ids, reconciles fan-out topologies, and turns
//! the returned entities into graph documents. Presentation layers
//! observe progress through [`JobEvent`](events::JobEvent)s.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod messages;
pub mod monitor;
pub mod orchestrator;
pub mod poller;
pub mod registry;
pub mod transport;

pub use error::ClientError;
pub use orchestrator::{JobRequest, Orchestrator};
