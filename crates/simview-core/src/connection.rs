//! Connection state as seen by consumers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Link state between the client and the simulation server.
///
/// Written only by the connection manager; everyone else observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns a short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
        assert!(!ConnectionState::default().is_connected());
    }

    #[test]
    fn test_labels() {
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert!(ConnectionState::Connected.is_connected());
    }
}
