//! Connection manager for the simulation server.
//!
//! This module provides the `ConnectionManager` which handles:
//! - Connecting to the server, retrying every `connect_retry_delay`
//! - Reading the line stream and driving the frame assembler
//! - Writing queued commands to the live socket
//! - Reconnecting `reconnect_delay` after the link drops
//!
//! The manager is the only writer of the [`StateStore`]. Connection
//! failures are logged and retried; they never reach consumers except as
//! connection-state changes.
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use simview_core::ConnectionState;
use simview_protocol::Command;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::connector::{BoxedReader, BoxedWriter, Connection, Connector};
use crate::error::{ClientError, Result};
use crate::frame::{FrameAssembler, FrameEvent};
use crate::store::StateStore;

/// How long a closing connection waits for queued commands to be written.
pub const COMMAND_FLUSH_GRACE: Duration = Duration::from_millis(500);

// ============================================================================
// Connection Manager
// ============================================================================

/// Keeps the local mirror in sync with the simulation server.
///
/// # Connection Lifecycle
///
/// 1. `Connecting`: ask the connector for a connection, waiting
///    `connect_retry_delay` between failed attempts
/// 2. `Connected`: read lines into the frame assembler, publish every
///    completed frame, write commands as they arrive
/// 3. `Disconnected` on EOF or any read error: the partial frame and any
///    queued commands are dropped, then after `reconnect_delay` back to 1
///
/// The loop only ends when the cancellation token fires.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use simview_client::{ClientConfig, CommandSender, ConnectionManager, StateStore, TcpConnector};
/// use tokio_util::sync::CancellationToken;
///
/// let config = ClientConfig::default();
/// let store = Arc::new(StateStore::new());
/// let (commands, command_rx) = CommandSender::channel(&store);
/// let manager = ConnectionManager::new(
///     TcpConnector::from_config(&config),
///     config,
///     Arc::clone(&store),
///     command_rx,
///     CancellationToken::new(),
/// );
///
/// tokio::spawn(manager.run());
/// ```
pub struct ConnectionManager<C> {
    connector: C,
    config: ClientConfig,
    store: Arc<StateStore>,

    /// Commands from `CommandSender` handles.
    commands: mpsc::UnboundedReceiver<Command>,

    cancel_token: CancellationToken,
    assembler: FrameAssembler,
}

impl<C: Connector> ConnectionManager<C> {
    #[must_use]
    pub fn new(
        connector: C,
        config: ClientConfig,
        store: Arc<StateStore>,
        commands: mpsc::UnboundedReceiver<Command>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            connector,
            config,
            store,
            commands,
            cancel_token,
            assembler: FrameAssembler::new(),
        }
    }

    /// Runs the connection lifecycle until cancelled.
    pub async fn run(mut self) {
        info!(server = %self.connector.target(), "Connection manager starting");

        while let Some(connection) = self.connect_with_retry().await {
            let peer = connection.peer.clone();

            // Anything that slipped in before the state flip belongs to no connection
            self.drain_commands();
            self.store.set_connection_state(ConnectionState::Connected);
            info!(peer = %peer, "Connected to simulation server");

            let result = self.handle_connection(connection).await;

            self.store.set_connection_state(ConnectionState::Disconnected);
            let discarded = self.assembler.discard_partial();
            let dropped = self.drain_commands();

            match result {
                Ok(()) => {
                    debug!(peer = %peer, "Connection closed for shutdown");
                    break;
                }
                Err(e) => {
                    warn!(
                        peer = %peer,
                        error = %e,
                        discarded_records = discarded,
                        dropped_commands = dropped,
                        "Lost connection to simulation server"
                    );
                }
            }

            if !self.pause(self.config.reconnect_delay).await {
                break;
            }
        }

        self.store.set_connection_state(ConnectionState::Disconnected);
        info!("Connection manager stopped");
    }

    /// Attempts to connect until successful.
    ///
    /// Returns `None` if cancelled first.
    async fn connect_with_retry(&mut self) -> Option<Connection> {
        let mut attempt = 0u32;

        loop {
            if self.cancel_token.is_cancelled() {
                return None;
            }

            self.store.set_connection_state(ConnectionState::Connecting);
            attempt = attempt.saturating_add(1);
            debug!(attempt, server = %self.connector.target(), "Attempting to connect");

            let result = tokio::select! {
                result = self.connector.connect() => result,
                _ = self.cancel_token.cancelled() => return None,
            };

            match result {
                Ok(connection) => {
                    debug!(attempt, "Connection successful");
                    return Some(connection);
                }
                Err(e) if attempt == 1 => {
                    warn!(
                        server = %self.connector.target(),
                        error = %e,
                        "Simulation server unavailable, will retry"
                    );
                }
                Err(e) => {
                    debug!(attempt, error = %e, "Connection attempt failed");
                }
            }

            self.drain_commands();
            if !self.pause(self.config.connect_retry_delay).await {
                return None;
            }
        }
    }

    /// Reads lines and writes commands until the connection ends.
    ///
    /// Commands are written by a per-connection writer task so that a peer
    /// which stops reading never holds up the line stream or cancellation.
    /// On shutdown the writer gets [`COMMAND_FLUSH_GRACE`] to finish what it
    /// holds; otherwise it is aborted as soon as the read side ends.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Cancelled
    /// * `Err(ClientError)` - Server closed the connection or a read failed
    async fn handle_connection(&mut self, connection: Connection) -> Result<()> {
        let Connection { reader, writer, .. } = connection;
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let mut writer_task = tokio::spawn(write_commands(writer, outgoing_rx));

        let result = self.read_lines(reader, &outgoing).await;

        // Closing the channel lets the writer finish once it is drained
        drop(outgoing);
        if result.is_ok() && timeout(COMMAND_FLUSH_GRACE, &mut writer_task).await.is_err() {
            warn!("Server is not reading commands, closing with commands unsent");
        }
        writer_task.abort();

        result
    }

    async fn read_lines(
        &mut self,
        reader: BoxedReader,
        outgoing: &mpsc::UnboundedSender<Command>,
    ) -> Result<()> {
        let codec = LinesCodec::new_with_max_length(self.config.max_line_length);
        let mut lines = FramedRead::new(reader, codec);
        let mut commands_open = true;

        loop {
            // Queued commands reach the writer before a pending cancellation
            // is honored, and cancellation beats a busy line stream
            tokio::select! {
                biased;

                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => {
                        if let Err(mpsc::error::SendError(command)) = outgoing.send(command) {
                            warn!(command = %command, "Command writer stopped, dropping command");
                        }
                    }
                    None => {
                        debug!("Command channel closed");
                        commands_open = false;
                    }
                },

                _ = self.cancel_token.cancelled() => {
                    debug!("Connection loop cancelled");
                    return Ok(());
                }

                line = lines.next() => match line {
                    Some(Ok(line)) => self.handle_line(&line),
                    Some(Err(e)) => return Err(e.into()),
                    None => return Err(ClientError::ConnectionClosed),
                },
            }
        }
    }

    fn handle_line(&mut self, line: &str) {
        match self.assembler.push_line(line) {
            FrameEvent::Buffered => {}
            FrameEvent::Grid(grid) => {
                if self.store.set_grid(grid) {
                    info!(grid = %grid, "Grid size changed");
                }
            }
            FrameEvent::Complete(snapshot) => {
                debug!(
                    sequence = snapshot.sequence(),
                    agents = snapshot.agents().len(),
                    places = snapshot.places().len(),
                    "Publishing snapshot"
                );
                self.store.publish(snapshot);
            }
            FrameEvent::Rejected(error) => {
                debug!(error = %error, line = %line, "Dropping malformed line");
            }
        }
    }

    /// Drops every queued command. Returns how many were dropped.
    fn drain_commands(&mut self) -> usize {
        let mut dropped = 0usize;
        while let Ok(command) = self.commands.try_recv() {
            debug!(command = %command, "Dropping command, not connected");
            dropped = dropped.saturating_add(1);
        }
        dropped
    }

    /// Sleeps for `delay`. Returns `false` if cancelled first.
    async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = sleep(delay) => true,
            _ = self.cancel_token.cancelled() => false,
        }
    }
}

/// Writes commands in order until the channel closes.
async fn write_commands(mut writer: BoxedWriter, mut commands: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = commands.recv().await {
        write_command(&mut writer, &command).await;
    }
}

/// Writes one command line.
///
/// A failed write is logged and otherwise ignored; the read side notices a
/// dead socket and triggers the reconnect.
async fn write_command(writer: &mut BoxedWriter, command: &Command) {
    let line = command.to_line();
    let result = async {
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await
    }
    .await;

    match result {
        Ok(()) => debug!(command = %command, "Sent command"),
        Err(e) => warn!(command = %command, error = %e, "Failed to send command"),
    }
}

// ============================================================================
// Tests
// ============================================================================
