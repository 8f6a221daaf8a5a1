//! simview Core - Shared types for the simulation mirror client
//!
//! This crate provides the domain types shared between the wire
//! protocol (simview-protocol) and the client (simview-client).
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod agent;
pub mod connection;
pub mod error;
pub mod grid;
pub mod place;
pub mod snapshot;
pub mod stats;

// Re-exports for convenience
pub use agent::{Agent, AgentCondition, AgentState};
pub use connection::ConnectionState;
pub use error::{DomainError, DomainResult};
pub use grid::GridConfig;
pub use place::{Place, PlaceKind};
pub use snapshot::{ConditionCounts, Snapshot};
pub use stats::StatsSummary;
