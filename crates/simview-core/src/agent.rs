//! Simulated agents as reported by the server.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Agent State
// ============================================================================

/// Free-form activity label of an agent ("Repos", "Vers Parc", "Mort", ...).
///
/// The server owns this vocabulary and may extend it at any time, so the
/// label is kept verbatim. Only the two states the client reacts to are
/// named here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentState(String);

impl AgentState {
    /// Label the server uses for a dead agent.
    pub const DEAD: &'static str = "Mort";

    /// Label the server uses for an agent busy inside a place.
    pub const BUSY: &'static str = "Occupé";

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Returns the raw label.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.0 == Self::DEAD
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.0 == Self::BUSY
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentState {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AgentState {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ============================================================================
// Agent Condition
// ============================================================================

/// Derived health bucket used when presenting an agent.
///
/// Precedence: a dead agent is `Dead` regardless of its gauges, a busy
/// agent is `Busy`, and only then are the gauges inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentCondition {
    Healthy,
    /// Stress above [`Agent::CRITICAL_STRESS`] or energy below [`Agent::CRITICAL_ENERGY`]
    Critical,
    Busy,
    Dead,
}

impl AgentCondition {
    /// Returns a short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Critical => "critical",
            Self::Busy => "busy",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for AgentCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Agent
// ============================================================================

/// One agent of a snapshot.
///
/// Agents are never updated in place: every frame carries a fresh list
/// that replaces the previous one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique within a snapshot
    pub name: String,
    /// Grid-space position (fractional while moving between cells)
    pub x: f64,
    pub y: f64,
    pub energy: f64,
    pub stress: f64,
    pub money: f64,
    pub state: AgentState,
    /// View direction in radians
    pub heading: f64,
}

impl Agent {
    /// Stress level above which an agent is considered critical.
    pub const CRITICAL_STRESS: f64 = 70.0;

    /// Energy level below which an agent is considered critical.
    pub const CRITICAL_ENERGY: f64 = 20.0;

    /// Classifies the agent for display.
    pub fn condition(&self) -> AgentCondition {
        if self.state.is_dead() {
            AgentCondition::Dead
        } else if self.state.is_busy() {
            AgentCondition::Busy
        } else if self.stress > Self::CRITICAL_STRESS || self.energy < Self::CRITICAL_ENERGY {
            AgentCondition::Critical
        } else {
            AgentCondition::Healthy
        }
    }

    /// Grid cell the agent currently stands on.
    pub fn cell(&self) -> (i64, i64) {
        (self.x.floor() as i64, self.y.floor() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(state: &str, energy: f64, stress: f64) -> Agent {
        Agent {
            name: "Alice".to_string(),
            x: 1.5,
            y: 2.25,
            energy,
            stress,
            money: 100.0,
            state: AgentState::new(state),
            heading: 0.0,
        }
    }

    #[test]
    fn test_condition_healthy() {
        assert_eq!(agent("Repos", 50.0, 10.0).condition(), AgentCondition::Healthy);
    }

    #[test]
    fn test_condition_critical_thresholds() {
        assert_eq!(agent("Repos", 19.9, 10.0).condition(), AgentCondition::Critical);
        assert_eq!(agent("Repos", 50.0, 70.1).condition(), AgentCondition::Critical);
        // Boundaries themselves are not critical
        assert_eq!(agent("Repos", 20.0, 70.0).condition(), AgentCondition::Healthy);
    }

    #[test]
    fn test_condition_precedence() {
        // Dead and busy win over gauges
        assert_eq!(agent("Mort", 0.0, 100.0).condition(), AgentCondition::Dead);
        assert_eq!(agent("Occupé", 0.0, 100.0).condition(), AgentCondition::Busy);
    }

    #[test]
    fn test_state_is_open() {
        let state = AgentState::from("Vers Parc");
        assert_eq!(state.as_str(), "Vers Parc");
        assert!(!state.is_dead());
        assert!(!state.is_busy());
    }

    #[test]
    fn test_cell_floors_position() {
        assert_eq!(agent("Repos", 50.0, 10.0).cell(), (1, 2));
    }

    #[test]
    fn test_state_serializes_transparently() {
        let json = serde_json::to_string(&AgentState::new("Sain")).unwrap();
        assert_eq!(json, "\"Sain\"");
    }
}
