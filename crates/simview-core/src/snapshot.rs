//! The unit of publication: one complete simulation frame.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Agent, AgentCondition, GridConfig, Place, StatsSummary};

/// Immutable state of the simulation as of one complete frame.
///
/// A snapshot is built once from the records of a single frame and never
/// modified afterwards. Consumers share it behind an `Arc`; a newer frame
/// produces a new snapshot rather than editing this one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    sequence: u64,
    received_at: Option<DateTime<Utc>>,
    agents: Vec<Agent>,
    places: Vec<Place>,
    stats: Option<StatsSummary>,
}

impl Snapshot {
    /// Creates a snapshot for a completed frame.
    ///
    /// `sequence` is 1 for the first frame ever completed and grows by one
    /// per frame, across reconnects.
    pub fn new(
        sequence: u64,
        agents: Vec<Agent>,
        places: Vec<Place>,
        stats: Option<StatsSummary>,
    ) -> Self {
        Self {
            sequence,
            received_at: Some(Utc::now()),
            agents,
            places,
            stats,
        }
    }

    /// The snapshot visible before any frame has completed.
    ///
    /// Sequence 0, no timestamp, no agents, no places, no stats.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// When the frame was completed, `None` for the initial snapshot.
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    /// Agents in the order they were decoded.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Places in the order they were decoded.
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn stats(&self) -> Option<&StatsSummary> {
        self.stats.as_ref()
    }

    /// Returns true if this is the initial snapshot (no frame seen yet).
    #[must_use]
    pub fn is_initial(&self) -> bool {
        self.sequence == 0
    }

    /// Looks up an agent by name.
    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Agents whose position lies inside `grid`.
    pub fn agents_within<'a>(&'a self, grid: &'a GridConfig) -> impl Iterator<Item = &'a Agent> + 'a {
        self.agents.iter().filter(move |a| grid.contains(a.x, a.y))
    }

    /// Places whose cell lies inside `grid`.
    pub fn places_within<'a>(&'a self, grid: &'a GridConfig) -> impl Iterator<Item = &'a Place> + 'a {
        self.places
            .iter()
            .filter(move |p| grid.contains(f64::from(p.x), f64::from(p.y)))
    }

    /// Tallies agents by derived condition.
    pub fn condition_counts(&self) -> ConditionCounts {
        let mut counts = ConditionCounts::default();
        for agent in &self.agents {
            match agent.condition() {
                AgentCondition::Healthy => counts.healthy += 1,
                AgentCondition::Critical => counts.critical += 1,
                AgentCondition::Busy => counts.busy += 1,
                AgentCondition::Dead => counts.dead += 1,
            }
        }
        counts
    }
}

/// Agent tally per [`AgentCondition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConditionCounts {
    pub healthy: usize,
    pub critical: usize,
    pub busy: usize,
    pub dead: usize,
}
