//! Public handle for a running client.
//!
//! [`SimClient`] spawns the connection manager on the current tokio runtime
//! and exposes the state store and command channel. Reads never block and
//! never touch the network.

use std::sync::Arc;
use std::time::Duration;

use simview_core::{ConnectionState, GridConfig, Snapshot};
use simview_protocol::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::ConnectionManager;
use crate::command::CommandSender;
use crate::config::ClientConfig;
use crate::connector::{Connector, TcpConnector};
use crate::store::StateStore;

/// A running simulation client.
///
/// Dropping the handle does not stop the background task; call
/// [`SimClient::shutdown`] or cancel [`SimClient::cancel_token`].
#[derive(Debug)]
pub struct SimClient {
    store: Arc<StateStore>,
    commands: CommandSender,
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

impl SimClient {
    /// Starts a client that connects over TCP to `config.host:config.port`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: ClientConfig) -> Self {
        let connector = TcpConnector::from_config(&config);
        Self::spawn_with(connector, config)
    }

    /// Starts a client using a custom connector.
    pub fn spawn_with<C>(connector: C, config: ClientConfig) -> Self
    where
        C: Connector + 'static,
    {
        let store = Arc::new(StateStore::new());
        let (commands, command_rx) = CommandSender::channel(&store);
        let cancel_token = CancellationToken::new();

        let manager = ConnectionManager::new(
            connector,
            config,
            Arc::clone(&store),
            command_rx,
            cancel_token.clone(),
        );
        let task = tokio::spawn(manager.run());

        Self {
            store,
            commands,
            cancel_token,
            task,
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Latest complete snapshot.
    pub fn latest(&self) -> Arc<Snapshot> {
        self.store.latest()
    }

    pub fn grid(&self) -> GridConfig {
        self.store.grid()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.store.connection_state()
    }

    /// A sender that can be cloned into other tasks.
    pub fn commands(&self) -> CommandSender {
        self.commands.clone()
    }

    /// Sends one command; see [`CommandSender::send`].
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Waits until the client is connected.
    ///
    /// Returns `false` if `timeout` elapses first or the client stops.
    pub async fn wait_connected(&self, timeout: Duration) -> bool {
        let mut rx = self.store.subscribe_connection();
        let wait = async { rx.wait_for(ConnectionState::is_connected).await.is_ok() };
        tokio::time::timeout(timeout, wait).await.unwrap_or(false)
    }

    /// Stops the background task and waits for it to finish.
    ///
    /// Commands already accepted by [`SimClient::send`] are written to the
    /// socket before the connection closes, provided the server takes them
    /// within [`COMMAND_FLUSH_GRACE`](crate::client::COMMAND_FLUSH_GRACE).
    pub async fn shutdown(self) {
        self.cancel_token.cancel();
        if let Err(e) = self.task.await {
            debug!(error = %e, "Connection task ended abnormally");
        }
    }
}
