//! simview client - Library modules
//!
//! This library keeps a local mirror of a remote simulation in sync with
//! the server's line stream and forwards control commands back to it.
//!
//! # Architecture
//!
//! The client runs as one background task plus any number of consumers:
//!
//! 1. **Connection Manager**: connects, reads lines, drives the frame
//!    assembler and reconnects with a fixed delay when the link drops
//! 2. **State Store**: holds the latest complete snapshot, the grid size
//!    and the connection state; consumers read it without blocking
//! 3. **Command Channel**: cheap-to-clone sender for `SCENARIO`, `SPEED`
//!    and `STOP` commands, dropped silently while disconnected
//!
//! All tasks respect a shared `CancellationToken` for shutdown.

pub mod client;
pub mod command;
pub mod config;
pub mod connector;
pub mod error;
pub mod frame;
pub mod handle;
pub mod store;

// Re-export commonly used types
pub use client::ConnectionManager;
pub use command::CommandSender;
pub use config::ClientConfig;
pub use connector::{Connection, Connector, TcpConnector};
pub use error::{ClientError, Result};
pub use frame::{FrameAssembler, FrameEvent};
pub use handle::SimClient;
pub use store::StateStore;
