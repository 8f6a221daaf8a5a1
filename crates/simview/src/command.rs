//! Outbound command channel.
//!
//! [`CommandSender`] is a cheap-to-clone handle that consumers use to send
//! commands to the server. The connection task owns the socket writer and
//! drains the channel while connected.
//!
//! Delivery is best effort: a command issued while not connected is dropped
//! on the spot, never queued for a later connection.

use simview_core::ConnectionState;
use simview_protocol::Command;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::store::StateStore;

/// Handle for sending commands to the server.
#[derive(Debug, Clone)]
pub struct CommandSender {
    sender: mpsc::UnboundedSender<Command>,
    connection: watch::Receiver<ConnectionState>,
}

impl CommandSender {
    /// Creates a sender gated on `store`'s connection state, and the
    /// receiving end for the connection task.
    pub fn channel(store: &StateStore) -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = Self {
            sender,
            connection: store.subscribe_connection(),
        };
        (handle, receiver)
    }

    /// Sends a command.
    ///
    /// Returns `true` if the command was handed to the live connection and
    /// `false` if it was dropped because the client is not connected (or
    /// the connection task has stopped). Never blocks.
    pub fn send(&self, command: Command) -> bool {
        let state = *self.connection.borrow();
        if !state.is_connected() {
            debug!(command = %command, state = %state, "Dropping command, not connected");
            return false;
        }
        self.sender.send(command).is_ok()
    }

    /// Sends arbitrary single-line text.
    ///
    /// Blank or multi-line text is dropped and returns `false`.
    pub fn send_text(&self, text: &str) -> bool {
        match Command::raw(text) {
            Ok(command) => self.send(command),
            Err(e) => {
                debug!(error = %e, "Dropping invalid raw command");
                false
            }
        }
    }

    /// Starts scenario `id` at the default speed.
    ///
    /// Sends `SCENARIO:<id>` then `SPEED:2`. Returns `true` if both were
    /// handed to the connection.
    ///
    /// The two sends are not atomic. If the connection drops between them,
    /// `SCENARIO:<id>` may already be on its way while `SPEED:2` is dropped;
    /// the call then returns `false` even though the scenario may start at
    /// the server's current speed. When the first send is dropped the second
    /// is not attempted.
    pub fn launch_scenario(&self, id: u32) -> bool {
        self.send(Command::Scenario(id)) && self.send(Command::Speed(Command::DEFAULT_SPEED))
    }

    pub fn set_speed(&self, speed: u32) -> bool {
        self.send(Command::Speed(speed))
    }

    pub fn stop(&self) -> bool {
        self.send(Command::Stop)
    }

    /// Returns true if commands would currently be delivered.
    pub fn is_connected(&self) -> bool {
        self.connection.borrow().is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_while_disconnected_is_dropped() {
        let store = StateStore::new();
        let (sender, mut receiver) = CommandSender::channel(&store);

        assert!(!sender.send(Command::Stop));
        assert!(!sender.stop());
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_send_while_connecting_is_dropped() {
        let store = StateStore::new();
        store.set_connection_state(ConnectionState::Connecting);
        let (sender, mut receiver) = CommandSender::channel(&store);

        assert!(!sender.set_speed(3));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_send_while_connected() {
        let store = StateStore::new();
        let (sender, mut receiver) = CommandSender::channel(&store);
        store.set_connection_state(ConnectionState::Connected);

        assert!(sender.is_connected());
        assert!(sender.send(Command::Speed(5)));
        assert_eq!(receiver.try_recv().unwrap(), Command::Speed(5));
    }

    #[test]
    fn test_launch_scenario_sends_scenario_then_speed() {
        let store = StateStore::new();
        store.set_connection_state(ConnectionState::Connected);
        let (sender, mut receiver) = CommandSender::channel(&store);

        assert!(sender.launch_scenario(2));
        assert_eq!(receiver.try_recv().unwrap(), Command::Scenario(2));
        assert_eq!(receiver.try_recv().unwrap(), Command::Speed(2));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_launch_scenario_while_disconnected_queues_nothing() {
        let store = StateStore::new();
        let (sender, mut receiver) = CommandSender::channel(&store);

        assert!(!sender.launch_scenario(2));
        assert!(receiver.try_recv().is_err());

        // Connecting later does not resurrect either half
        store.set_connection_state(ConnectionState::Connected);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_send_text() {
        let store = StateStore::new();
        store.set_connection_state(ConnectionState::Connected);
        let (sender, mut receiver) = CommandSender::channel(&store);

        assert!(sender.send_text("PING"));
        assert!(!sender.send_text("A\nB"));
        assert_eq!(receiver.try_recv().unwrap(), Command::Raw("PING".to_string()));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_send_after_task_stopped() {
        let store = StateStore::new();
        store.set_connection_state(ConnectionState::Connected);
        let (sender, receiver) = CommandSender::channel(&store);
        drop(receiver);

        assert!(!sender.stop());
    }
}
