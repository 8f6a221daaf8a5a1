//! Latest-value store shared between the connection task and consumers.
//!
//! Each published value lives in a `tokio::sync::watch` channel. Publishing
//! swaps the whole value; readers clone it out (`Arc<Snapshot>` for
//! snapshots, so that is a pointer copy). A reader therefore sees either
//! the previous frame or the new one, never a mix, and never waits on the
//! network.
//!
//! The connection manager is the only writer.

use std::sync::Arc;

use simview_core::{ConnectionState, GridConfig, Snapshot};
use tokio::sync::watch;

/// Holds the most recent snapshot, grid size and connection state.
#[derive(Debug)]
pub struct StateStore {
    snapshot: watch::Sender<Arc<Snapshot>>,
    grid: watch::Sender<GridConfig>,
    connection: watch::Sender<ConnectionState>,
}

impl StateStore {
    /// Creates a store holding the initial empty snapshot, the default
    /// grid and `Disconnected`.
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Snapshot::empty()));
        let (grid, _) = watch::channel(GridConfig::default());
        let (connection, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            snapshot,
            grid,
            connection,
        }
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    /// Replaces the current snapshot.
    ///
    /// Returns the snapshot that was replaced.
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        self.snapshot.send_replace(Arc::new(snapshot))
    }

    /// Returns the most recently published snapshot.
    pub fn latest(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot.subscribe()
    }

    // ------------------------------------------------------------------------
    // Grid
    // ------------------------------------------------------------------------

    /// Sets the grid size. Receivers are notified only if it changed.
    pub fn set_grid(&self, grid: GridConfig) -> bool {
        self.grid.send_if_modified(|current| replace_if_changed(current, grid))
    }

    pub fn grid(&self) -> GridConfig {
        *self.grid.borrow()
    }

    pub fn subscribe_grid(&self) -> watch::Receiver<GridConfig> {
        self.grid.subscribe()
    }

    // ------------------------------------------------------------------------
    // Connection State
    // ------------------------------------------------------------------------

    /// Sets the connection state. Receivers are notified only if it changed.
    pub fn set_connection_state(&self, state: ConnectionState) -> bool {
        self.connection
            .send_if_modified(|current| replace_if_changed(current, state))
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    pub fn subscribe_connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

fn replace_if_changed<T: PartialEq>(current: &mut T, next: T) -> bool {
    if *current == next {
        false
    } else {
        *current = next;
        true
    }
}
